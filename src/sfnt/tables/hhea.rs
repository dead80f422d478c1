//! # hhea — Horizontal Header Table
//!
//! *Specification:*
//! [OpenType](https://docs.microsoft.com/en-us/typography/opentype/spec/hhea).

use crate::ctx::Context;
use crate::sfnt::tables::FontMetrics;
use crate::sfnt::types::{Fixed, Tag};
use bytes::{BufMut, Bytes, BytesMut};

/// The tag of the table.
pub const TAG: Tag = Tag(*b"hhea");
/// The size in bytes of the table.
const SIZE: usize = 36;

/// Returns an `hhea` table.
///
/// Ascender and descender split the font height at the baseline, which lies `descent` units above the bottom of the icon frame.
pub fn compile(metrics: &FontMetrics, ctx: &Context) -> Bytes {
    let mut buf = BytesMut::with_capacity(SIZE);

    buf.put_u32(Fixed::VERSION_1_0.into());
    buf.put_i16(ctx.ascent());
    buf.put_i16(-ctx.descent);
    let line_gap = 0;
    buf.put_i16(line_gap);
    buf.put_u16(metrics.advance_width_max);
    buf.put_i16(metrics.min_left_side_bearing);
    buf.put_i16(metrics.min_right_side_bearing);
    buf.put_i16(metrics.x_max_extent);

    // upright caret
    let caret_slope_rise = 1;
    buf.put_i16(caret_slope_rise);
    let caret_slope_run = 0;
    buf.put_i16(caret_slope_run);
    let caret_offset = 0;
    buf.put_i16(caret_offset);

    for _ in 0..4 {
        buf.put_i16(0);
    }

    let metric_data_format = 0;
    buf.put_i16(metric_data_format);
    buf.put_u16(metrics.number_of_h_metrics);

    assert_eq!(SIZE, buf.len());

    buf.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyph::GlyphTable;

    #[test]
    fn test_compile_vertical_metrics() {
        let ctx = Context {
            descent: 125,
            ..Context::default()
        };
        let metrics = FontMetrics::measure(&GlyphTable::default(), &ctx);
        let table = compile(&metrics, &ctx);
        assert_eq!(i16::from_be_bytes([table[4], table[5]]), 875);
        assert_eq!(i16::from_be_bytes([table[6], table[7]]), -125);
        assert_eq!(u16::from_be_bytes([table[34], table[35]]), 1);
    }
}
