//! # OS/2 — OS/2 and Windows Metrics Table
//!
//! *Specification:*
//! [OpenType](https://docs.microsoft.com/en-us/typography/opentype/spec/os2).
//!
//! Version 4 of the table is written.
//! The Unicode range bits cover the ranges icon fonts use: the Private Use Area of the BMP, the supplementary Private Use Areas of planes 15 and 16, and the flag for code points beyond the BMP.

use crate::ctx::Context;
use crate::glyph::GlyphTable;
use crate::sfnt::tables::FontMetrics;
use crate::sfnt::types::Tag;
use bytes::{BufMut, Bytes, BytesMut};

/// The tag of the table.
pub const TAG: Tag = Tag(*b"OS/2");
/// The size in bytes of a version 4 table.
const SIZE: usize = 96;
/// The table version.
const VERSION: u16 = 4;
/// Regular weight.
const WEIGHT_CLASS: u16 = 400;
/// Medium (normal) width.
const WIDTH_CLASS: u16 = 5;
/// The vendor id written to `achVendID`.
const VENDOR_ID: Tag = Tag(*b"NONE");
/// The `REGULAR` bit of `fsSelection`.
const FS_SELECTION_REGULAR: u16 = 1 << 6;
/// The Unicode range bit of the BMP Private Use Area.
const PRIVATE_USE_AREA_BIT: u32 = 60;
/// The Unicode range bit set if any code point lies beyond the BMP.
const NON_PLANE_0_BIT: u32 = 57;
/// The Unicode range bit of the supplementary Private Use Areas.
const PRIVATE_USE_PLANES_BIT: u32 = 90;

/// Returns the Unicode range bits covered by the code points of the glyphs.
fn unicode_ranges(table: &GlyphTable) -> [u32; 4] {
    let mut ranges = [0u32; 4];
    let mut set = |bit: u32| ranges[(bit / 32) as usize] |= 1 << (bit % 32);

    for glyph in table.glyphs() {
        let code = glyph.code_point as u32;

        if (0xE000..=0xF8FF).contains(&code) {
            set(PRIVATE_USE_AREA_BIT);
        }
        if code > 0xFFFF {
            set(NON_PLANE_0_BIT);
        }
        if code >= 0xF0000 {
            set(PRIVATE_USE_PLANES_BIT);
        }
    }

    ranges
}

/// Returns a version 4 `OS/2` table.
pub fn compile(metrics: &FontMetrics, table: &GlyphTable, ctx: &Context) -> Bytes {
    let mut buf = BytesMut::with_capacity(SIZE);
    let em = ctx.font_height as i32;
    let scaled = |ratio: f64| (em as f64 * ratio).round() as i16;

    buf.put_u16(VERSION);
    buf.put_i16(metrics.average_advance);
    buf.put_u16(WEIGHT_CLASS);
    buf.put_u16(WIDTH_CLASS);
    // installable embedding
    let fs_type = 0;
    buf.put_u16(fs_type);

    // subscript size and offset
    buf.put_i16(scaled(0.65));
    buf.put_i16(scaled(0.6));
    buf.put_i16(0);
    buf.put_i16(scaled(0.075));
    // superscript size and offset
    buf.put_i16(scaled(0.65));
    buf.put_i16(scaled(0.6));
    buf.put_i16(0);
    buf.put_i16(scaled(0.35));
    // strikeout size and position
    buf.put_i16(scaled(0.05));
    buf.put_i16(scaled(0.25));

    let family_class = 0;
    buf.put_i16(family_class);
    let panose = [0u8; 10];
    buf.put_slice(&panose);

    for range in unicode_ranges(table) {
        buf.put_u32(range);
    }

    buf.put_u32(VENDOR_ID.into());
    buf.put_u16(FS_SELECTION_REGULAR);

    let first = table.glyphs().iter().map(|g| g.code_point as u32).min().unwrap_or(0);
    let last = table.glyphs().iter().map(|g| g.code_point as u32).max().unwrap_or(0);
    buf.put_u16(first.min(0xFFFF) as u16);
    buf.put_u16(last.min(0xFFFF) as u16);

    let ascent = ctx.ascent();
    let descent = ctx.descent;
    buf.put_i16(ascent);
    buf.put_i16(-descent);
    let typo_line_gap = 0;
    buf.put_i16(typo_line_gap);

    // the clipping region must cover every outline
    let win_ascent = (ascent as i32).max(metrics.bounds.y_max as i32).max(0);
    let win_descent = (descent as i32).max(-(metrics.bounds.y_min as i32)).max(0);
    buf.put_u16(win_ascent.min(u16::MAX as i32) as u16);
    buf.put_u16(win_descent.min(u16::MAX as i32) as u16);

    // Latin 1
    let code_page_range_1 = 1;
    buf.put_u32(code_page_range_1);
    buf.put_u32(0);

    // x-height and cap height
    buf.put_i16(scaled(0.5));
    buf.put_i16(scaled(0.7));
    let default_char = 0;
    buf.put_u16(default_char);
    let break_char = 0x20;
    buf.put_u16(break_char);
    let max_context = 0;
    buf.put_u16(max_context);

    assert_eq!(SIZE, buf.len());

    buf.freeze()
}
