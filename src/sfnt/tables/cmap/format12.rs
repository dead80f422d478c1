//! # Format 12: Segmented coverage
//!
//! Implementation of the `cmap` format 12 subtable.
//!
//! *Specification:*
//! [OpenType](https://docs.microsoft.com/en-us/typography/opentype/spec/cmap#format-12-segmented-coverage),
//! [TrueType](https://developer.apple.com/fonts/TrueType-Reference-Manual/RM06/Chap6cmap.html).
//!
//! Format 12 covers the full Unicode codespace, which includes the supplementary Private Use Areas of planes 15 and 16.
//! Since code points are allocated consecutively and glyph ids follow the allocation order, an icon font is usually covered by a single group.
//!
//! ```
//! # use glyphset::data::CharacterMap;
//! # use glyphset::sfnt::tables::cmap::format12::{compile, form_groups};
//! let mut map = CharacterMap::new();
//! map.insert('\u{F0000}', 1);
//! map.insert('\u{F0001}', 2);
//! assert_eq!(form_groups(&map).len(), 1);
//! let subtable = compile(&map);
//! ```

use crate::data::CharacterMap;
use crate::sfnt::read::{ReadError, Reader};
use bytes::{BufMut, Bytes, BytesMut};

/// `format`, `reserved`, `length`, `language`, and `numGroups`.
const HEADER_SIZE: usize = 16;
/// `startCharCode`, `endCharCode`, and `startGlyphID`.
const GROUP_SIZE: usize = 12;

/// A run of consecutive code points mapped to consecutive glyph ids.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct SequentialMapGroup {
    /// The first code point of the run.
    pub start_char_code: u32,
    /// The last code point of the run, inclusive.
    pub end_char_code: u32,
    /// The glyph id of `start_char_code`.
    pub start_glyph_id: u32,
}

impl SequentialMapGroup {
    /// Whether the mapping continues this group.
    fn continues(&self, code: u32, gid: u32) -> bool {
        code == self.end_char_code + 1 && gid == self.start_glyph_id + (code - self.start_char_code)
    }
}

/// Returns a `cmap` format 12 subtable representing the given character map.
pub fn compile(map: &CharacterMap) -> Bytes {
    compile_groups(&form_groups(map))
}

/// Returns a `cmap` format 12 subtable representing the given groups.
///
/// The groups need to be in order of increasing `start_char_code`.
pub fn compile_groups(groups: &[SequentialMapGroup]) -> Bytes {
    let length = HEADER_SIZE + groups.len() * GROUP_SIZE;
    let mut buf = BytesMut::with_capacity(length);

    buf.put_u16(12);
    buf.put_u16(0);
    buf.put_u32(length as u32);
    // language
    buf.put_u32(0);
    buf.put_u32(groups.len() as u32);

    for group in groups {
        buf.put_u32(group.start_char_code);
        buf.put_u32(group.end_char_code);
        buf.put_u32(group.start_glyph_id);
    }

    assert_eq!(length, buf.len());

    buf.freeze()
}

/// Splits the character map into groups, in order of increasing `start_char_code`.
pub fn form_groups(map: &CharacterMap) -> Vec<SequentialMapGroup> {
    map.iter()
        .fold(Vec::new(), |mut groups: Vec<SequentialMapGroup>, (&c, &gid)| {
            let code = c as u32;
            match groups.last_mut() {
                Some(group) if group.continues(code, gid) => group.end_char_code = code,
                _ => groups.push(SequentialMapGroup {
                    start_char_code: code,
                    end_char_code: code,
                    start_glyph_id: gid,
                }),
            }
            groups
        })
}

/// Reads the mappings of a format 12 subtable.
///
/// Code points in the surrogate range are dropped.
pub fn parse(subtable: &[u8]) -> Result<CharacterMap, ReadError> {
    let mut reader = Reader::new(subtable);
    reader.skip(HEADER_SIZE - 4)?;
    let num_groups = reader.u32()?;
    let mut map = CharacterMap::new();

    for _ in 0..num_groups {
        let group = SequentialMapGroup {
            start_char_code: reader.u32()?,
            end_char_code: reader.u32()?,
            start_glyph_id: reader.u32()?,
        };

        if group.end_char_code < group.start_char_code {
            return Err(ReadError::Malformed("cmap format 12 group ends before it starts"));
        }

        map.extend((group.start_char_code..=group.end_char_code).filter_map(|code| {
            let gid = group.start_glyph_id + (code - group.start_char_code);
            char::from_u32(code).map(|c| (c, gid))
        }));
    }

    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_groups_breaks_on_gaps() {
        let mut map = CharacterMap::new();
        map.insert('\u{F0000}', 1);
        map.insert('\u{F0001}', 2);
        map.insert('\u{F0005}', 3);
        map.insert('\u{F0006}', 5);

        assert_eq!(
            form_groups(&map),
            vec![
                SequentialMapGroup {
                    start_char_code: 0xF0000,
                    end_char_code: 0xF0001,
                    start_glyph_id: 1
                },
                SequentialMapGroup {
                    start_char_code: 0xF0005,
                    end_char_code: 0xF0005,
                    start_glyph_id: 3
                },
                SequentialMapGroup {
                    start_char_code: 0xF0006,
                    end_char_code: 0xF0006,
                    start_glyph_id: 5
                },
            ]
        );
    }

    #[test]
    fn test_parse() {
        let mut map = CharacterMap::new();
        map.insert('\u{E600}', 1);
        map.insert('\u{10FFFD}', 2);
        let subtable = compile(&map);
        assert_eq!(subtable.len(), HEADER_SIZE + 2 * GROUP_SIZE);
        assert_eq!(parse(&subtable).unwrap(), map);
    }
}
