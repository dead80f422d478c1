//! # hmtx — Horizontal Metrics Table
//!
//! *Specification:*
//! [OpenType](https://docs.microsoft.com/en-us/typography/opentype/spec/hmtx).

use crate::sfnt::tables::FontMetrics;
use crate::sfnt::types::Tag;
use bytes::{BufMut, Bytes, BytesMut};

/// The tag of the table.
pub const TAG: Tag = Tag(*b"hmtx");

/// Returns an `hmtx` table.
///
/// The first `numberOfHMetrics` glyphs are written with advance width and left side bearing.
/// The remaining glyphs share the last advance width and are written with their left side bearing only.
pub fn compile(metrics: &FontMetrics) -> Bytes {
    let long = metrics.number_of_h_metrics as usize;
    let length = long * 4 + (metrics.horizontal.len() - long) * 2;
    let mut buf = BytesMut::with_capacity(length);

    for (index, metric) in metrics.horizontal.iter().enumerate() {
        if index < long {
            buf.put_u16(metric.advance_width);
        }
        buf.put_i16(metric.left_side_bearing);
    }

    assert_eq!(length, buf.len());

    buf.freeze()
}
