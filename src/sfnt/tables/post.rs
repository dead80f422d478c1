//! # post — PostScript Table
//!
//! *Specification:*
//! [OpenType](https://docs.microsoft.com/en-us/typography/opentype/spec/post).
//!
//! Version 2.0 stores a name for every glyph.
//! Icon names become glyph names, which keeps the glyphs identifiable in font editors and inspection tools.

use crate::ctx::Context;
use crate::glyph::GlyphTable;
use crate::sfnt::read::{ReadError, Reader};
use crate::sfnt::types::{Fixed, Tag};
use bytes::{BufMut, Bytes, BytesMut};
use std::collections::HashSet;

/// The tag of the table.
pub const TAG: Tag = Tag(*b"post");
/// The size in bytes of the fixed part of the table.
const HEADER_SIZE: usize = 32;
/// The number of standard Macintosh glyph names; custom names are indexed from here.
const STANDARD_NAMES: u16 = 258;
/// The longest glyph name the table can store.
const MAX_GLYPH_NAME_LENGTH: usize = 63;

/// Returns the glyph names of the icons, in glyph order and excluding `.notdef`.
///
/// Names are restricted to `A-Z`, `a-z`, `0-9`, `.` and `_`, must not start with a digit or period, and are made unique with a numeric suffix.
pub fn glyph_names(table: &GlyphTable) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();
    used.insert(".notdef".to_string());

    table
        .glyphs()
        .iter()
        .map(|glyph| {
            let mut base: String = glyph
                .name
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() || c == '.' { c } else { '_' })
                .take(MAX_GLYPH_NAME_LENGTH - 4)
                .collect();

            if base.is_empty() || base.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
                base.insert(0, '_');
            }

            let mut name = base.clone();
            let mut suffix = 1;
            while used.contains(&name) {
                name = format!("{}.{}", base, suffix);
                suffix += 1;
            }

            used.insert(name.clone());
            name
        })
        .collect()
}

/// Returns a version 2.0 `post` table.
pub fn compile(table: &GlyphTable, ctx: &Context) -> Bytes {
    let names = glyph_names(table);
    let num_glyphs = names.len() + 1;
    let length = HEADER_SIZE + 2 + num_glyphs * 2 + names.iter().map(|n| n.len() + 1).sum::<usize>();
    let mut buf = BytesMut::with_capacity(length);
    let em = ctx.font_height as i16;

    buf.put_u32(Fixed::VERSION_2_0.into());
    let italic_angle = 0;
    buf.put_u32(italic_angle);
    // underline position and thickness
    buf.put_i16(-em / 10);
    buf.put_i16(em / 20);
    buf.put_u32(ctx.fixed_width as u32);
    // minMemType42, maxMemType42, minMemType1, maxMemType1
    for _ in 0..4 {
        buf.put_u32(0);
    }

    buf.put_u16(num_glyphs as u16);
    // `.notdef` is the standard name 0
    buf.put_u16(0);
    for index in 0..names.len() {
        buf.put_u16(STANDARD_NAMES + index as u16);
    }

    for name in &names {
        buf.put_u8(name.len() as u8);
        buf.put_slice(name.as_bytes());
    }

    assert_eq!(length, buf.len());

    buf.freeze()
}

/// Reads the glyph names of a version 2.0 `post` table, including `.notdef`.
pub fn parse_names(table: &[u8]) -> Result<Vec<String>, ReadError> {
    let mut reader = Reader::new(table);

    if reader.u32()? != u32::from(Fixed::VERSION_2_0) {
        return Err(ReadError::Malformed("post table is not version 2.0"));
    }

    reader.seek(HEADER_SIZE)?;
    let num_glyphs = reader.u16()?;
    let indices = reader.u16_array(num_glyphs as usize)?;
    let mut custom = Vec::new();

    while reader.remaining() > 0 {
        let length = reader.u8()? as usize;
        let bytes = reader.bytes(length)?;
        custom.push(String::from_utf8_lossy(bytes).into_owned());
    }

    indices
        .into_iter()
        .map(|index| match index {
            0 => Ok(".notdef".to_string()),
            index if index >= STANDARD_NAMES => custom
                .get((index - STANDARD_NAMES) as usize)
                .cloned()
                .ok_or(ReadError::OutOfBounds("glyph name")),
            _ => Err(ReadError::Malformed("standard glyph names are not supported")),
        })
        .collect()
}
