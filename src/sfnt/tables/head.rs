//! # head — Font Header Table
//!
//! *Specification:*
//! [OpenType](https://docs.microsoft.com/en-us/typography/opentype/spec/head).
//!
//! The creation and modification dates are both set to the configured timestamp, which keeps the output reproducible.
//! `checkSumAdjustment` is written as zero; [`crate::sfnt::compile`] fills it in once the whole font is known.

use crate::ctx::Context;
use crate::sfnt::read::{ReadError, Reader};
use crate::sfnt::tables::FontMetrics;
use crate::sfnt::types::{long_date_time, Fixed, Tag};
use bytes::{BufMut, Bytes, BytesMut};

/// The tag of the table.
pub const TAG: Tag = Tag(*b"head");
/// The size in bytes of the table.
pub const SIZE: usize = 54;
/// The offset of the `checkSumAdjustment` field.
pub const CHECKSUM_ADJUSTMENT_OFFSET: usize = 8;
/// The offset of the `indexToLocFormat` field.
const INDEX_TO_LOC_FORMAT_OFFSET: usize = 50;
/// The value of the `magicNumber` field.
pub const MAGIC_NUMBER: u32 = 0x5F0F_3CF5;
/// Baseline at y = 0, left side bearing point at x = 0, integer scaling.
const FLAGS: u16 = 0x000B;
/// The smallest readable size in pixels.
const LOWEST_REC_PPEM: u16 = 8;
/// Fully mixed directional glyphs with neutrals.
const FONT_DIRECTION_HINT: i16 = 2;

/// Returns a `head` table.
///
/// `index_to_loc_format` is `0` for short and `1` for long `loca` offsets.
pub fn compile(metrics: &FontMetrics, ctx: &Context, index_to_loc_format: i16) -> Bytes {
    let mut buf = BytesMut::with_capacity(SIZE);

    buf.put_u32(Fixed::VERSION_1_0.into());
    let font_revision = Fixed::VERSION_1_0;
    buf.put_u32(font_revision.into());
    let checksum_adjustment = 0;
    buf.put_u32(checksum_adjustment);
    buf.put_u32(MAGIC_NUMBER);
    buf.put_u16(FLAGS);
    buf.put_u16(ctx.font_height);

    let date = long_date_time(ctx.timestamp);
    // created
    buf.put_i64(date);
    // modified
    buf.put_i64(date);

    buf.put_i16(metrics.bounds.x_min);
    buf.put_i16(metrics.bounds.y_min);
    buf.put_i16(metrics.bounds.x_max);
    buf.put_i16(metrics.bounds.y_max);

    let mac_style = 0;
    buf.put_u16(mac_style);
    buf.put_u16(LOWEST_REC_PPEM);
    buf.put_i16(FONT_DIRECTION_HINT);
    buf.put_i16(index_to_loc_format);
    let glyph_data_format = 0;
    buf.put_i16(glyph_data_format);

    assert_eq!(SIZE, buf.len());

    buf.freeze()
}

/// Reads the `indexToLocFormat` field.
pub fn parse_index_to_loc_format(table: &[u8]) -> Result<i16, ReadError> {
    let mut reader = Reader::new(table);
    reader.seek(INDEX_TO_LOC_FORMAT_OFFSET)?;
    reader.i16()
}

/// Reads the `created` field as a Unix timestamp.
pub fn parse_created(table: &[u8]) -> Result<i64, ReadError> {
    let mut reader = Reader::new(table);
    // version, fontRevision, checkSumAdjustment, magicNumber, flags, unitsPerEm
    reader.skip(20)?;
    Ok(reader.i64()? - crate::sfnt::types::MAC_EPOCH_OFFSET)
}
