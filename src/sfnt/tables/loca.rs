//! # loca — Index to Location
//!
//! *Specification:*
//! [OpenType](https://docs.microsoft.com/en-us/typography/opentype/spec/loca).
//!
//! The short format stores offsets divided by two in 16 bits and is chosen whenever every offset allows it.

use crate::sfnt::read::{ReadError, Reader};
use crate::sfnt::types::Tag;
use bytes::{BufMut, Bytes, BytesMut};

/// The tag of the table.
pub const TAG: Tag = Tag(*b"loca");
/// The `indexToLocFormat` of the short format.
pub const SHORT_FORMAT: i16 = 0;
/// The `indexToLocFormat` of the long format.
pub const LONG_FORMAT: i16 = 1;

/// Returns whether the offsets can be stored in the short format.
pub fn fits_short(offsets: &[u32]) -> bool {
    offsets
        .iter()
        .all(|&offset| offset % 2 == 0 && offset / 2 <= u16::MAX as u32)
}

/// Returns a `loca` table and its `indexToLocFormat`.
///
/// `offsets` contains one offset per glyph plus the end offset of the last glyph.
pub fn compile(offsets: &[u32]) -> (Bytes, i16) {
    let format = if fits_short(offsets) {
        SHORT_FORMAT
    } else {
        LONG_FORMAT
    };

    (compile_with_format(offsets, format), format)
}

/// Returns a `loca` table of the given format.
///
/// # Panics
///
/// Panics if the format is short and an offset is not representable.
pub fn compile_with_format(offsets: &[u32], format: i16) -> Bytes {
    let long = format == LONG_FORMAT;
    let length = offsets.len() * if long { 4 } else { 2 };
    let mut buf = BytesMut::with_capacity(length);

    for &offset in offsets {
        if long {
            buf.put_u32(offset);
        } else {
            assert!(offset % 2 == 0 && offset / 2 <= u16::MAX as u32);
            buf.put_u16((offset / 2) as u16);
        }
    }

    assert_eq!(length, buf.len());

    buf.freeze()
}

/// Reads the `num_glyphs + 1` offsets of a `loca` table.
pub fn parse(table: &[u8], num_glyphs: u16, long: bool) -> Result<Vec<u32>, ReadError> {
    let mut reader = Reader::new(table);
    let offsets = (0..=num_glyphs as usize)
        .map(|_| {
            if long {
                reader.u32()
            } else {
                reader.u16().map(|x| x as u32 * 2)
            }
        })
        .collect::<Result<Vec<u32>, ReadError>>()?;

    if offsets.windows(2).any(|w| w[1] < w[0]) {
        return Err(ReadError::Malformed("loca offsets decrease"));
    }

    Ok(offsets)
}
