//! # maxp — Maximum Profile
//!
//! *Specification:*
//! [OpenType](https://docs.microsoft.com/en-us/typography/opentype/spec/maxp).
//!
//! Fonts with TrueType outlines use version 1.0 of the table.
//! The glyphs carry no instructions and no composites, so all hinting and composite limits are zero.

use crate::sfnt::read::{ReadError, Reader};
use crate::sfnt::tables::FontMetrics;
use crate::sfnt::types::{Fixed, Tag};
use bytes::{BufMut, Bytes, BytesMut};

/// The tag of the table.
pub const TAG: Tag = Tag(*b"maxp");
/// The size in bytes of the table.
const SIZE: usize = 32;

/// Returns a version 1.0 `maxp` table.
pub fn compile(metrics: &FontMetrics) -> Bytes {
    let mut buf = BytesMut::with_capacity(SIZE);

    buf.put_u32(Fixed::VERSION_1_0.into());
    buf.put_u16(metrics.num_glyphs);
    buf.put_u16(metrics.max_points);
    buf.put_u16(metrics.max_contours);
    // maxCompositePoints, maxCompositeContours
    buf.put_u16(0);
    buf.put_u16(0);
    // maxZones: the twilight zone is unused, but the value must be 1 or 2
    buf.put_u16(2);

    // maxTwilightPoints through maxComponentDepth
    for _ in 0..8 {
        buf.put_u16(0);
    }

    assert_eq!(SIZE, buf.len());

    buf.freeze()
}

/// Reads the `numGlyphs` field.
pub fn parse_num_glyphs(table: &[u8]) -> Result<u16, ReadError> {
    let mut reader = Reader::new(table);
    reader.skip(4)?;
    reader.u16()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ctx::Context;
    use crate::glyph::GlyphTable;

    #[test]
    fn test_compile() {
        let metrics = FontMetrics::measure(&GlyphTable::default(), &Context::default());
        let table = compile(&metrics);
        assert_eq!(table.len(), SIZE);
        assert_eq!(parse_num_glyphs(&table).unwrap(), 1);
    }
}
