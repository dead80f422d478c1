//! The WOFF 2.0 container.
//!
//! *Specification:* [W3C WOFF File Format 2.0](https://www.w3.org/TR/WOFF2/).
//!
//! All tables of a font are concatenated into a single stream compressed with Brotli.
//! Before compression, `glyf` and `loca` are replaced by the compact [glyf transform](transform): outlines are split into separate streams of contour counts, point counts, flags, and coordinate triplets, and `loca` is rebuilt by the decoder.
//! Fonts with composite glyphs keep their `glyf` and `loca` tables untransformed.
//!
//! [`decode`] restores the canonical TrueType font, so `decode(encode(ttf))` returns the normalized `ttf`.

pub mod transform;

use crate::sfnt::read::{FontFile, ReadError, Reader, TRUETYPE_VERSION};
use crate::sfnt::tables::{glyf, loca};
use crate::sfnt::types::Tag;
use crate::sfnt::{self, padding};
use bytes::{BufMut, Bytes, BytesMut};
use std::io::{Read, Write};

/// The `signature` of WOFF2 files, `wOF2`.
pub const SIGNATURE: u32 = 0x774F_4632;
/// The size in bytes of the WOFF2 header.
const HEADER_SIZE: usize = 48;
/// The version written to `majorVersion` and `minorVersion`.
const VERSION: (u16, u16) = (1, 0);
/// The flag value announcing an explicit tag.
const ARBITRARY_TAG: u8 = 0x3F;
/// The transform version of transformed `glyf` and `loca` tables.
const TRANSFORM_APPLIED: u8 = 0;
/// The transform version of untransformed `glyf` and `loca` tables.
const TRANSFORM_NULL: u8 = 3;
/// The size of the Brotli encoder's internal buffer.
const BUFFER_SIZE: usize = 4096;

/// The tags that are encoded by their index in the table directory.
const KNOWN_TAGS: [&[u8; 4]; 63] = [
    b"cmap", b"head", b"hhea", b"hmtx", b"maxp", b"name", b"OS/2", b"post", b"cvt ", b"fpgm",
    b"glyf", b"loca", b"prep", b"CFF ", b"VORG", b"EBDT", b"EBLC", b"gasp", b"hdmx", b"kern",
    b"LTSH", b"PCLT", b"VDMX", b"vhea", b"vmtx", b"BASE", b"GDEF", b"GPOS", b"GSUB", b"EBSC",
    b"JSTF", b"MATH", b"CBDT", b"CBLC", b"COLR", b"CPAL", b"SVG ", b"sbix", b"acnt", b"avar",
    b"bdat", b"bloc", b"bsln", b"cvar", b"fdsc", b"feat", b"fmtx", b"fvar", b"gvar", b"hsty",
    b"just", b"lcar", b"mort", b"morx", b"opbd", b"prop", b"trak", b"Zapf", b"Silf", b"Glat",
    b"Gloc", b"Feat", b"Sill",
];

/// Writes a `UIntBase128` value.
pub fn put_base128(buf: &mut BytesMut, value: u32) {
    let mut bytes = [0u8; 5];
    let mut len = 0;
    let mut rest = value;

    loop {
        bytes[len] = (rest & 0x7F) as u8;
        len += 1;
        rest >>= 7;
        if rest == 0 {
            break;
        }
    }

    for index in (0..len).rev() {
        let continuation = if index > 0 { 0x80 } else { 0 };
        buf.put_u8(bytes[index] | continuation);
    }
}

/// Reads a `UIntBase128` value.
///
/// Leading zero bytes, values exceeding 32 bits, and sequences longer than five bytes are malformed.
pub fn read_base128(reader: &mut Reader) -> Result<u32, ReadError> {
    let mut value: u32 = 0;

    for index in 0..5 {
        let byte = reader.u8()?;

        if index == 0 && byte == 0x80 {
            return Err(ReadError::Malformed("UIntBase128 with leading zeros"));
        }
        if value & 0xFE00_0000 != 0 {
            return Err(ReadError::Malformed("UIntBase128 exceeds 32 bits"));
        }

        value = (value << 7) | (byte & 0x7F) as u32;

        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }

    Err(ReadError::Malformed("UIntBase128 is longer than five bytes"))
}

/// Writes a `255UInt16` value.
pub fn put_255_u16(buf: &mut BytesMut, value: u16) {
    match value {
        0..=252 => buf.put_u8(value as u8),
        253..=505 => {
            buf.put_u8(255);
            buf.put_u8((value - 253) as u8);
        }
        506..=761 => {
            buf.put_u8(254);
            buf.put_u8((value - 506) as u8);
        }
        _ => {
            buf.put_u8(253);
            buf.put_u16(value);
        }
    }
}

/// Reads a `255UInt16` value.
pub fn read_255_u16(reader: &mut Reader) -> Result<u16, ReadError> {
    match reader.u8()? {
        253 => reader.u16(),
        254 => Ok(reader.u8()? as u16 + 506),
        255 => Ok(reader.u8()? as u16 + 253),
        code => Ok(code as u16),
    }
}

/// A table directory entry together with the data stored for the table.
#[derive(Debug)]
struct Entry {
    tag: Tag,
    transform_version: u8,
    orig_length: u32,
    transform_length: Option<u32>,
    data: Bytes,
}

impl Entry {
    fn is_transformed(&self) -> bool {
        self.transform_length.is_some()
    }
}

/// Returns the flags byte of a directory entry.
fn entry_flags(tag: Tag, transform_version: u8) -> u8 {
    let index = KNOWN_TAGS
        .iter()
        .position(|known| **known == tag.0)
        .map_or(ARBITRARY_TAG, |index| index as u8);

    index | (transform_version << 6)
}

/// Wraps a TrueType font in a WOFF2 container.
///
/// `quality` (0 to 11) and `window` (10 to 24) configure the Brotli encoder.
///
/// # Errors
///
/// Fails if `ttf` is not a TrueType font.
pub fn encode(ttf: &[u8], quality: u32, window: u32) -> Result<Bytes, ReadError> {
    let font = FontFile::parse(ttf)?;
    let mut tables = font.tables();
    tables.sort_by_key(|(tag, _)| *tag);

    // `loca` directly follows `glyf`
    if let Some(position) = tables.iter().position(|(tag, _)| *tag == loca::TAG) {
        let loca = tables.remove(position);
        if let Some(glyf) = tables.iter().position(|(tag, _)| *tag == glyf::TAG) {
            tables.insert(glyf + 1, loca);
        } else {
            tables.push(loca);
        }
    }

    let transformed = transform::encode(&font)?;

    if transformed.is_none() {
        log::info!("woff2: composite glyphs present; glyf and loca are stored untransformed");
    }

    let entries: Vec<Entry> = tables
        .into_iter()
        .map(|(tag, data)| {
            let orig_length = data.len() as u32;

            match (&transformed, tag) {
                (Some(stream), tag) if tag == glyf::TAG => Entry {
                    tag,
                    transform_version: TRANSFORM_APPLIED,
                    orig_length,
                    transform_length: Some(stream.len() as u32),
                    data: stream.clone(),
                },
                (Some(_), tag) if tag == loca::TAG => Entry {
                    tag,
                    transform_version: TRANSFORM_APPLIED,
                    orig_length,
                    transform_length: Some(0),
                    data: Bytes::new(),
                },
                (None, tag) if tag == glyf::TAG || tag == loca::TAG => Entry {
                    tag,
                    transform_version: TRANSFORM_NULL,
                    orig_length,
                    transform_length: None,
                    data: Bytes::copy_from_slice(data),
                },
                (_, tag) => Entry {
                    tag,
                    transform_version: 0,
                    orig_length,
                    transform_length: None,
                    data: Bytes::copy_from_slice(data),
                },
            }
        })
        .collect();

    let mut stream = BytesMut::new();
    for entry in &entries {
        stream.put_slice(&entry.data);
    }

    let mut compressor = brotli::CompressorWriter::new(Vec::new(), BUFFER_SIZE, quality, window);
    compressor.write_all(&stream)?;
    compressor.flush()?;
    let compressed = compressor.into_inner();

    let mut directory = BytesMut::new();
    for entry in &entries {
        let flags = entry_flags(entry.tag, entry.transform_version);
        directory.put_u8(flags);
        if flags & ARBITRARY_TAG == ARBITRARY_TAG {
            directory.put_u32(entry.tag.into());
        }
        put_base128(&mut directory, entry.orig_length);
        if let Some(length) = entry.transform_length {
            put_base128(&mut directory, length);
        }
    }

    let unpadded = HEADER_SIZE + directory.len() + compressed.len();
    let length = unpadded + padding(unpadded);
    let total_sfnt_size = sfnt::PREAMBLE_SIZE
        + entries.len() * sfnt::TABLE_RECORD_SIZE
        + entries
            .iter()
            .map(|e| e.orig_length as usize + padding(e.orig_length as usize))
            .sum::<usize>();

    let mut buf = BytesMut::with_capacity(length);
    buf.put_u32(SIGNATURE);
    buf.put_u32(font.sfnt_version);
    buf.put_u32(length as u32);
    buf.put_u16(entries.len() as u16);
    let reserved = 0;
    buf.put_u16(reserved);
    buf.put_u32(total_sfnt_size as u32);
    buf.put_u32(compressed.len() as u32);
    buf.put_u16(VERSION.0);
    buf.put_u16(VERSION.1);
    // metaOffset, metaLength, metaOrigLength, privOffset, privLength
    for _ in 0..5 {
        buf.put_u32(0);
    }

    buf.put_slice(&directory);
    buf.put_slice(&compressed);
    buf.put_bytes(0, padding(unpadded));

    assert_eq!(length, buf.len());

    log::info!(
        "woff2: {} -> {} bytes ({} tables{})",
        ttf.len(),
        length,
        entries.len(),
        if entries.iter().any(Entry::is_transformed) {
            ", glyf transformed"
        } else {
            ""
        }
    );

    Ok(buf.freeze())
}

/// Restores the TrueType font of a WOFF2 container.
///
/// # Errors
///
/// Fails for data that is not a well-formed WOFF2 file with TrueType outlines.
pub fn decode(woff2: &[u8]) -> Result<Bytes, ReadError> {
    let mut reader = Reader::new(woff2);
    let signature = reader.u32()?;

    if signature != SIGNATURE {
        return Err(ReadError::UnknownSignature(signature));
    }

    let flavor = reader.u32()?;
    if flavor != TRUETYPE_VERSION {
        return Err(ReadError::UnknownSignature(flavor));
    }

    let length = reader.u32()? as usize;
    if length != woff2.len() {
        return Err(ReadError::Malformed("WOFF2 length does not match the data"));
    }

    let num_tables = reader.u16()?;
    let _reserved = reader.u16()?;
    let _total_sfnt_size = reader.u32()?;
    let total_compressed_size = reader.u32()? as usize;
    reader.seek(HEADER_SIZE)?;

    let mut entries = Vec::with_capacity(num_tables as usize);

    for _ in 0..num_tables {
        let flags = reader.u8()?;
        let tag = match flags & ARBITRARY_TAG {
            ARBITRARY_TAG => Tag::from_u32(reader.u32()?).ok_or(ReadError::Malformed("table tag"))?,
            index => Tag(*KNOWN_TAGS[index as usize]),
        };
        let transform_version = flags >> 6;
        let orig_length = read_base128(&mut reader)?;

        let transformed = if tag == glyf::TAG || tag == loca::TAG {
            transform_version == TRANSFORM_APPLIED
        } else {
            transform_version != 0
        };
        let transform_length = if transformed {
            Some(read_base128(&mut reader)?)
        } else {
            None
        };

        entries.push(Entry {
            tag,
            transform_version,
            orig_length,
            transform_length,
            data: Bytes::new(),
        });
    }

    let compressed = reader.bytes(total_compressed_size)?;
    let mut stream = Vec::new();
    brotli::Decompressor::new(compressed, BUFFER_SIZE).read_to_end(&mut stream)?;

    let mut offset = 0;
    for entry in entries.iter_mut() {
        let stored = entry.transform_length.unwrap_or(entry.orig_length) as usize;
        let data = stream
            .get(offset..offset + stored)
            .ok_or(ReadError::OutOfBounds("WOFF2 table"))?;
        entry.data = Bytes::copy_from_slice(data);
        offset += stored;
    }

    if offset != stream.len() {
        return Err(ReadError::Malformed("WOFF2 stream has trailing data"));
    }

    let mut tables = Vec::with_capacity(entries.len());

    for entry in &entries {
        if !entry.is_transformed() {
            tables.push((entry.tag, entry.data.clone()));
            continue;
        }

        if entry.tag == glyf::TAG {
            let (glyf, loca) = transform::decode(&entry.data)?;

            if glyf.len() != entry.orig_length as usize {
                log::warn!(
                    "woff2: reconstructed glyf has {} bytes instead of {}",
                    glyf.len(),
                    entry.orig_length
                );
            }

            tables.push((glyf::TAG, glyf));
            tables.push((loca::TAG, loca));
        } else if entry.tag != loca::TAG {
            return Err(ReadError::Malformed("unsupported WOFF2 table transform"));
        }
    }

    if entries
        .iter()
        .any(|e| e.tag == loca::TAG && e.is_transformed())
        && !entries.iter().any(|e| e.tag == glyf::TAG && e.is_transformed())
    {
        return Err(ReadError::Malformed("transformed loca without transformed glyf"));
    }

    sfnt::assemble(tables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ctx::Context;
    use crate::glyph::{Glyph, GlyphTable, Point};

    fn font() -> Bytes {
        let glyphs = (0..4)
            .map(|n| Glyph {
                name: format!("icon{}", n),
                code_point: char::from_u32(0xE600 + n).unwrap(),
                contours: vec![(0..12 + n as i16)
                    .map(|i| Point {
                        x: i * 60 - 100,
                        y: (i % 3) * 400 - 150,
                        on_curve: i % 2 == 0,
                    })
                    .collect()],
                advance_width: 1000,
            })
            .collect();
        sfnt::compile_ttf(&GlyphTable::new(glyphs), &Context::default())
    }

    #[test]
    fn test_base128() {
        for (value, encoded) in [
            (0u32, vec![0x00]),
            (127, vec![0x7F]),
            (128, vec![0x81, 0x00]),
            (16384, vec![0x81, 0x80, 0x00]),
            (u32::MAX, vec![0x8F, 0xFF, 0xFF, 0xFF, 0x7F]),
        ] {
            let mut buf = BytesMut::new();
            put_base128(&mut buf, value);
            assert_eq!(&buf[..], &encoded[..]);
            assert_eq!(read_base128(&mut Reader::new(&encoded)).unwrap(), value);
        }

        assert!(read_base128(&mut Reader::new(&[0x80, 0x01])).is_err());
        assert!(read_base128(&mut Reader::new(&[0x90, 0x80, 0x80, 0x80, 0x00])).is_err());
    }

    #[test]
    fn test_255_u16() {
        for (value, encoded) in [
            (0u16, vec![0]),
            (252, vec![252]),
            (253, vec![255, 0]),
            (505, vec![255, 252]),
            (506, vec![254, 0]),
            (761, vec![254, 255]),
            (762, vec![253, 0x02, 0xFA]),
        ] {
            let mut buf = BytesMut::new();
            put_255_u16(&mut buf, value);
            assert_eq!(&buf[..], &encoded[..]);
            assert_eq!(read_255_u16(&mut Reader::new(&encoded)).unwrap(), value);
        }
    }

    #[test]
    fn test_entry_flags() {
        assert_eq!(entry_flags(glyf::TAG, TRANSFORM_APPLIED), 10);
        assert_eq!(entry_flags(loca::TAG, TRANSFORM_NULL), 11 | 0xC0);
        assert_eq!(entry_flags(Tag(*b"DSIG"), 0), ARBITRARY_TAG);
    }

    #[test]
    fn test_encode_header() {
        let ttf = font();
        let woff2 = encode(&ttf, 11, 22).unwrap();
        let mut reader = Reader::new(&woff2);
        assert_eq!(reader.u32().unwrap(), SIGNATURE);
        assert_eq!(reader.u32().unwrap(), TRUETYPE_VERSION);
        assert_eq!(reader.u32().unwrap() as usize, woff2.len());
        assert_eq!(reader.u16().unwrap(), 10);
        reader.skip(2).unwrap();
        assert_eq!(reader.u32().unwrap() as usize, ttf.len());
        assert_eq!(woff2.len() % 4, 0);
        assert!(woff2.len() < ttf.len());
    }

    #[test]
    fn test_decode_restores_font() {
        let ttf = font();
        for (quality, window) in [(4, 22), (11, 24)] {
            let woff2 = encode(&ttf, quality, window).unwrap();
            assert_eq!(decode(&woff2).unwrap(), ttf);
        }
    }

    #[test]
    fn test_decode_rejects_other_data() {
        let ttf = font();
        assert!(matches!(
            decode(&ttf),
            Err(ReadError::UnknownSignature(0x0001_0000))
        ));

        let woff2 = encode(&ttf, 4, 22).unwrap();
        let mut corrupted = woff2.to_vec();
        corrupted.truncate(woff2.len() - 8);
        assert!(decode(&corrupted).is_err());
    }
}
