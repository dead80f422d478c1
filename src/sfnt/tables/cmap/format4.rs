//! # Format 4: Segment mapping to delta values
//!
//! Implementation of the `cmap` format 4 subtable.
//!
//! *Specification:*
//! [OpenType](https://docs.microsoft.com/en-us/typography/opentype/spec/cmap#format-4-segment-mapping-to-delta-values),
//! [TrueType](https://developer.apple.com/fonts/TrueType-Reference-Manual/RM06/Chap6cmap.html).
//!
//! A format 4 subtable stores *segments* that map a continuous range of character codes to glyph ids.
//! A segment consists of its start and end code, an `idDelta`, and an `idRangeOffset`.
//!
//! Glyph ids of an icon font follow the allocation order of the code points, so every continuous range of codes maps to a continuous range of glyph ids.
//! Such a range is encoded by shifting each code by `idDelta`, with `idRangeOffset` set to zero.
//! [`encoding_segments`] forms one shift segment per continuous range; the glyph id array is never used.
//!
//! ```
//! # use glyphset::data::CharacterMap;
//! # use glyphset::sfnt::tables::cmap::format4::{compile_segments, encoding_segments, Segment};
//! let mut map = CharacterMap::new();
//! map.insert('\u{E600}', 1);
//! map.insert('\u{E601}', 2);
//! let mut segments = encoding_segments(&map);
//! assert_eq!(segments.len(), 1);
//! segments.push(Segment::sentinel());
//! let subtable = compile_segments(&segments);
//! ```

use crate::data::CharacterMap;
use crate::sfnt::read::{ReadError, Reader};
use crate::sfnt::tables::cmap::MAX_BMP_SCALAR;
use bytes::{BufMut, Bytes, BytesMut};
use spans::Spans;
/// `format` through `rangeShift`, plus `reservedPad`.
const HEADER_SIZE: usize = 16;
/// One entry in each of `endCode`, `startCode`, `idDelta`, and `idRangeOffset`.
const SEGMENT_SIZE: usize = 8;
/// The character code of the sentinel segment.
const SENTINEL_CODE: u16 = 0xFFFF;

/// Returns a `cmap` format 4 subtable representing the BMP part of the given character map.
///
/// Code points beyond the BMP are not representable in format 4 and are left to format 12.
pub fn compile(map: &CharacterMap) -> Bytes {
    let mut segments = encoding_segments(map);
    segments.push(Segment::sentinel());

    compile_segments(&segments)
}

/// Returns a `cmap` format 4 subtable representing the given segments.
///
/// Note that this function does not automatically append a sentinel segment at the end of the segments vector.
/// If such a sentinel segment is desired it must be provided as the last element of `segments`.
pub fn compile_segments(segments: &[Segment]) -> Bytes {
    let length = HEADER_SIZE + segments.len() * SEGMENT_SIZE;
    let seg_count = segments.len() as u16;
    // 2 × the largest power of two not exceeding `seg_count`
    let entry_selector = (u16::BITS - 1).saturating_sub(seg_count.leading_zeros()) as u16;
    let search_range = 2u16 << entry_selector;

    let mut buf = BytesMut::with_capacity(length);
    buf.put_u16(4);
    buf.put_u16(length as u16);
    // language
    buf.put_u16(0);
    buf.put_u16(seg_count * 2);
    buf.put_u16(search_range);
    buf.put_u16(entry_selector);
    buf.put_u16(seg_count * 2 - search_range);

    segments.iter().for_each(|s| buf.put_u16(s.end));
    // reservedPad
    buf.put_u16(0);
    segments.iter().for_each(|s| buf.put_u16(s.start));
    segments.iter().for_each(|s| buf.put_i16(s.id_delta));
    // every segment shifts, so `idRangeOffset` is always zero
    buf.put_bytes(0, segments.len() * 2);

    assert_eq!(length, buf.len());

    buf.freeze()
}

/// Returns the shift segments of the BMP part of the character map, excluding the sentinel.
///
/// `U+FFFF` is left out since that code is reserved for the sentinel segment; a format 12 subtable maps it instead.
pub fn encoding_segments(map: &CharacterMap) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut spans = map
        .range(..MAX_BMP_SCALAR)
        .spans_by_key(
            |(&code, &gid)| (code as u32, gid),
            |(code_a, gid_a), (code_b, gid_b)| code_a + 1 == code_b && gid_a + 1 == gid_b,
        );

    while let Some(mut span) = spans.next() {
        let (&start, &gid) = match span.next() {
            Some(first) => first,
            None => continue,
        };
        let end = span.last().map_or(start, |(&x, _)| x);
        // the delta is applied modulo 65536
        let id_delta = (gid as u16).wrapping_sub(start as u16) as i16;

        segments.push(Segment {
            start: start as u16,
            end: end as u16,
            id_delta,
        });
    }

    if map.contains_key(&MAX_BMP_SCALAR) {
        log::debug!("U+FFFF is the format 4 sentinel; only format 12 maps it");
    }

    log::debug!("cmap format 4 segments: {:?}", segments);

    segments
}

/// Reads the mappings of a format 4 subtable.
pub fn parse(subtable: &[u8]) -> Result<CharacterMap, ReadError> {
    let mut reader = Reader::new(subtable);
    reader.skip(6)?;
    let seg_count = (reader.u16()? / 2) as usize;
    // searchRange, entrySelector, rangeShift
    reader.skip(6)?;

    let ends = reader.u16_array(seg_count)?;
    reader.skip(2)?;
    let starts = reader.u16_array(seg_count)?;
    let deltas = reader.u16_array(seg_count)?;
    let range_offsets_position = reader.position();
    let range_offsets = reader.u16_array(seg_count)?;
    let mut map = CharacterMap::new();

    for index in 0..seg_count {
        let (start, end) = (starts[index], ends[index]);

        if start == SENTINEL_CODE || end < start {
            continue;
        }

        for code in start..=end {
            let gid = if range_offsets[index] == 0 {
                code.wrapping_add(deltas[index])
            } else {
                // `idRangeOffset` is relative to its own position in the subtable
                let position = range_offsets_position
                    + index * 2
                    + range_offsets[index] as usize
                    + (code - start) as usize * 2;
                let mut glyph_reader = Reader::new(subtable);
                glyph_reader.seek(position)?;
                match glyph_reader.u16()? {
                    0 => 0,
                    gid => gid.wrapping_add(deltas[index]),
                }
            };

            if gid != 0 {
                if let Some(c) = char::from_u32(code as u32) {
                    map.insert(c, gid as u32);
                }
            }
        }
    }

    Ok(map)
}

/// A continuous range of character codes mapped to continuous glyph ids by a shared offset.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct Segment {
    /// The start of the continuous character code range.
    pub start: u16,
    /// The end of the continuous character code range.
    pub end: u16,
    /// The offset added to each code, modulo 65536.
    pub id_delta: i16,
}

impl Segment {
    /// Returns a sentinel segment which is used to end a list of segments.
    ///
    /// The segment maps `0xFFFF` to glyph 0.
    /// Quoting the [OpenType specification][spec]:
    ///
    /// > For the search to terminate, the final start code and endCode values must be 0xFFFF.
    ///
    /// [spec]: https://docs.microsoft.com/en-us/typography/opentype/spec/cmap#format-4-segment-mapping-to-delta-values
    pub fn sentinel() -> Segment {
        Segment {
            start: SENTINEL_CODE,
            end: SENTINEL_CODE,
            id_delta: 1,
        }
    }

    /// The number of mappings managed by the segment.
    pub fn len(&self) -> usize {
        (self.end - self.start) as usize + 1
    }
}
