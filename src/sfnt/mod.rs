//! Implementation of the SFNT container format.
//!
//! An SFNT font starts with a table directory listing every table by tag, checksum, offset, and length, followed by the table data.
//! [`compile_ttf`] produces the canonical TrueType font of a [`GlyphTable`]; every other container format is derived from its bytes.
//!
//! Fonts are written deterministically: directory records are sorted by tag, table data follows [`arrange`], and the same glyphs and context always produce the same bytes.

pub mod read;
pub mod tables;
pub mod types;

use crate::ctx::Context;
use crate::glyph::GlyphTable;
use bytes::{BufMut, Bytes, BytesMut};
use read::{FontFile, ReadError, TRUETYPE_VERSION};
use tables::{cmap, glyf, head, hhea, hmtx, loca, maxp, name, os2, post, FontMetrics};
use types::Tag;

/// `sfntVersion`, `numTables`, `searchRange`, `entrySelector`, and `rangeShift`.
pub const PREAMBLE_SIZE: usize = 12;
/// `tableTag`, `checksum`, `offset`, and `length` of a table record.
pub const TABLE_RECORD_SIZE: usize = 16;
/// The font checksum is adjusted so that it sums up to this value.
const CHECKSUM_MAGIC: u32 = 0xB1B0_AFBA;
/// The recommended physical order of TrueType tables.
const TABLE_ORDER: [Tag; 10] = [
    head::TAG,
    hhea::TAG,
    maxp::TAG,
    os2::TAG,
    hmtx::TAG,
    cmap::TAG,
    loca::TAG,
    glyf::TAG,
    name::TAG,
    post::TAG,
];

/// Returns the checksum of a table.
pub fn table_checksum(table: &[u8]) -> u32 {
    table.chunks(4).fold(0u32, |sum, chunk| {
        // the final chunk is zero-padded
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        sum.wrapping_add(u32::from_be_bytes(word))
    })
}

/// Returns the number of bytes needed to pad `len` to a multiple of four.
pub fn padding(len: usize) -> usize {
    (4 - len % 4) % 4
}

/// Returns `searchRange`, `entrySelector`, and `rangeShift` for a directory of `num_tables` records.
pub fn search_parameters(num_tables: u16) -> (u16, u16, u16) {
    if num_tables == 0 {
        return (0, 0, 0);
    }

    let entry_selector = (u16::BITS - 1 - num_tables.leading_zeros()) as u16;
    let search_range = 16 * (1u16 << entry_selector);
    let range_shift = num_tables * 16 - search_range;

    (search_range, entry_selector, range_shift)
}

/// Sorts tables into the recommended physical order.
///
/// Tables without a recommended position follow in tag order.
pub fn arrange<T>(tables: &mut [(Tag, T)]) {
    tables.sort_by_key(|(tag, _)| {
        let rank = TABLE_ORDER
            .iter()
            .position(|x| x == tag)
            .unwrap_or(TABLE_ORDER.len());
        (rank, *tag)
    });
}

/// Compiles an SFNT font.
///
/// `sfnt_version` is written to the first four bytes of the font.
/// The tables are written in the given order to the font, while the directory records are sorted by tag.
/// If a `head` table is present, its `checkSumAdjustment` is set to make the font checksum `0xB1B0AFBA`; the field must be zero in the given table.
///
/// # Example
///
/// ```
/// # use glyphset::sfnt::types::Tag;
/// # use glyphset::sfnt::{compile, read::FontFile};
/// use bytes::Bytes;
///
/// let font = compile(0x00010000, vec![(Tag(*b"zzzz"), Bytes::from_static(b"abc"))]);
/// assert_eq!(font.len(), 12 + 16 + 4);
/// assert_eq!(FontFile::parse(&font).unwrap().table(Tag(*b"zzzz")).unwrap(), b"abc");
/// ```
pub fn compile(sfnt_version: u32, tables: Vec<(Tag, Bytes)>) -> Bytes {
    log::debug!("compiling SFNT 0x{:08X} with {} tables", sfnt_version, tables.len());

    let directory_size = PREAMBLE_SIZE + (tables.len() * TABLE_RECORD_SIZE);
    let length = directory_size
        + tables
            .iter()
            .map(|(_, x)| x.len() + padding(x.len()))
            .sum::<usize>();
    let num_tables = tables.len() as u16;
    let (search_range, entry_selector, range_shift) = search_parameters(num_tables);

    let mut buf = BytesMut::with_capacity(length);
    buf.put_u32(sfnt_version);
    for field in [num_tables, search_range, entry_selector, range_shift] {
        buf.put_u16(field);
    }

    let mut offsets = Vec::with_capacity(tables.len());
    let mut offset = directory_size;

    for (_, table) in &tables {
        offsets.push(offset);
        offset += table.len() + padding(table.len());
    }

    let mut records: Vec<usize> = (0..tables.len()).collect();
    records.sort_by_key(|&index| tables[index].0);

    for index in records {
        let (tag, table) = &tables[index];
        buf.put_u32((*tag).into());
        buf.put_u32(table_checksum(table));
        buf.put_u32(offsets[index] as u32);
        buf.put_u32(table.len() as u32);
    }

    let mut head_offset = None;

    for ((tag, table), offset) in tables.iter().zip(&offsets) {
        log::trace!("writing table {} ({} bytes)", tag, table.len());

        if *tag == head::TAG {
            head_offset = Some(*offset);
        }

        buf.put_slice(table);
        buf.put_bytes(0, padding(table.len()));
    }

    assert_eq!(length, buf.len());

    if let Some(offset) = head_offset {
        let position = offset + head::CHECKSUM_ADJUSTMENT_OFFSET;
        if position + 4 <= buf.len() {
            let adjustment = CHECKSUM_MAGIC.wrapping_sub(table_checksum(&buf));
            buf[position..position + 4].copy_from_slice(&adjustment.to_be_bytes());
        }
    }

    buf.freeze()
}

/// Compiles the canonical TrueType font of a glyph table.
pub fn compile_ttf(table: &GlyphTable, ctx: &Context) -> Bytes {
    let metrics = FontMetrics::measure(table, ctx);
    let (glyf, offsets) = glyf::compile(table);
    let (loca, index_to_loc_format) = loca::compile(&offsets);

    log::info!(
        "compiling TrueType font '{}' with {} glyphs",
        ctx.name,
        metrics.num_glyphs
    );

    let mut tables = vec![
        (head::TAG, head::compile(&metrics, ctx, index_to_loc_format)),
        (hhea::TAG, hhea::compile(&metrics, ctx)),
        (maxp::TAG, maxp::compile(&metrics)),
        (os2::TAG, os2::compile(&metrics, table, ctx)),
        (hmtx::TAG, hmtx::compile(&metrics)),
        (cmap::TAG, cmap::compile(&table.character_map(), ctx)),
        (loca::TAG, loca),
        (glyf::TAG, glyf),
        (name::TAG, name::compile(ctx)),
        (post::TAG, post::compile(table, ctx)),
    ];
    arrange(&mut tables);

    compile(TRUETYPE_VERSION, tables)
}

/// Rewrites a TrueType font in canonical layout.
///
/// The tables are kept as they are, except for `checkSumAdjustment`, which is recomputed.
/// Normalizing a font produced by [`compile_ttf`] returns the same bytes, and normalizing twice equals normalizing once.
///
/// # Errors
///
/// Fails if the data is not a TrueType font.
pub fn normalize(font: &[u8]) -> Result<Bytes, ReadError> {
    let file = FontFile::parse(font)?;
    let tables = file
        .tables()
        .into_iter()
        .map(|(tag, data)| (tag, Bytes::copy_from_slice(data)))
        .collect();

    assemble(tables)
}

/// Compiles a TrueType font from tables in any order, clearing `checkSumAdjustment` first.
///
/// Container decoders use this to restore the canonical font from its tables.
pub fn assemble(mut tables: Vec<(Tag, Bytes)>) -> Result<Bytes, ReadError> {
    for (tag, data) in tables.iter_mut() {
        if *tag == head::TAG {
            if data.len() < head::SIZE {
                return Err(ReadError::Malformed("head table is truncated"));
            }

            let mut cleared = BytesMut::from(&data[..]);
            let position = head::CHECKSUM_ADJUSTMENT_OFFSET;
            cleared[position..position + 4].copy_from_slice(&[0; 4]);
            *data = cleared.freeze();
        }
    }

    arrange(&mut tables);

    Ok(compile(TRUETYPE_VERSION, tables))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyph::{Glyph, Point};

    fn glyph_table() -> GlyphTable {
        let point = |x, y| Point {
            x,
            y,
            on_curve: true,
        };
        GlyphTable::new(vec![Glyph {
            name: "triangle".to_string(),
            code_point: '\u{E600}',
            contours: vec![vec![point(0, 0), point(500, 1000), point(1000, 0)]],
            advance_width: 1000,
        }])
    }

    #[test]
    fn test_table_checksum() {
        assert_eq!(table_checksum(b"abcd"), 1633837924);
        assert_eq!(table_checksum(b"abcdxyz"), 3655064932);
    }

    #[test]
    fn test_search_parameters() {
        assert_eq!(search_parameters(1), (16, 0, 0));
        assert_eq!(search_parameters(10), (128, 3, 32));
        assert_eq!(search_parameters(16), (256, 4, 0));
    }

    #[test]
    fn test_arrange() {
        let mut tables = vec![
            (Tag(*b"post"), ()),
            (Tag(*b"zzzz"), ()),
            (Tag(*b"glyf"), ()),
            (Tag(*b"head"), ()),
            (Tag(*b"DSIG"), ()),
        ];
        arrange(&mut tables);
        let tags: Vec<Tag> = tables.into_iter().map(|(tag, _)| tag).collect();
        assert_eq!(
            tags,
            vec![
                Tag(*b"head"),
                Tag(*b"glyf"),
                Tag(*b"post"),
                Tag(*b"DSIG"),
                Tag(*b"zzzz")
            ]
        );
    }

    #[test]
    fn test_compile_ttf_checksum() {
        let font = compile_ttf(&glyph_table(), &Context::default());
        assert_eq!(&font[..4], &[0, 1, 0, 0]);
        assert_eq!(font.len() % 4, 0);
        assert_eq!(table_checksum(&font), CHECKSUM_MAGIC);
    }

    #[test]
    fn test_compile_ttf_directory() {
        let font = compile_ttf(&glyph_table(), &Context::default());
        let file = FontFile::parse(&font).unwrap();
        let tags: Vec<Tag> = file.records.iter().map(|r| r.tag).collect();
        let mut sorted = tags.clone();
        sorted.sort();
        assert_eq!(tags, sorted);
        assert_eq!(tags.len(), 10);

        for record in &file.records {
            let data = file.table(record.tag).unwrap();
            if record.tag != head::TAG {
                assert_eq!(record.checksum, table_checksum(data));
            }
            assert_eq!(record.offset % 4, 0);
        }
    }

    #[test]
    fn test_compile_ttf_reads_back() {
        let table = glyph_table();
        let font = compile_ttf(&table, &Context::default());
        let file = FontFile::parse(&font).unwrap();

        assert_eq!(file.num_glyphs().unwrap(), 2);
        assert_eq!(file.character_map().unwrap(), table.character_map());
        let contours = file.glyph_contours().unwrap();
        assert!(contours[0].is_empty());
        assert_eq!(contours[1], table.glyphs()[0].contours);
    }

    #[test]
    fn test_normalize_is_identity_on_canonical_fonts() {
        let font = compile_ttf(&glyph_table(), &Context::default());
        let normalized = normalize(&font).unwrap();
        assert_eq!(normalized, font);
        assert_eq!(normalize(&normalized).unwrap(), normalized);
    }

    #[test]
    fn test_compile_ttf_is_deterministic() {
        let ctx = Context::default();
        assert_eq!(compile_ttf(&glyph_table(), &ctx), compile_ttf(&glyph_table(), &ctx));
    }

    #[test]
    fn test_normalize_rejects_other_data() {
        assert!(normalize(b"<svg/>").is_err());
    }
}
