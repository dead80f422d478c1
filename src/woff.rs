//! The WOFF 1.0 container.
//!
//! *Specification:* [W3C WOFF File Format 1.0](https://www.w3.org/TR/WOFF/).
//!
//! A WOFF file wraps the tables of an SFNT font, compressing each table with zlib.
//! A table is stored uncompressed if compression does not make it smaller.
//! No extended metadata or private data blocks are written.
//!
//! [`decode`] restores the canonical TrueType font, so `decode(encode(ttf))` returns the normalized `ttf`.

use crate::sfnt::read::{FontFile, ReadError, Reader};
use crate::sfnt::types::Tag;
use crate::sfnt::{self, padding, PREAMBLE_SIZE, TABLE_RECORD_SIZE};
use bytes::{BufMut, Bytes, BytesMut};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Read, Write};
use std::mem::size_of;

/// The `signature` of WOFF files, `wOFF`.
pub const SIGNATURE: u32 = 0x774F_4646;
/// The size in bytes of the WOFF header.
const HEADER_SIZE: usize = 44;
/// The size in bytes of a table directory entry.
const ENTRY_SIZE: usize = 5 * size_of::<u32>();
/// The version written to `majorVersion` and `minorVersion`.
const VERSION: (u16, u16) = (1, 0);

/// A table directory entry.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
struct Entry {
    tag: Tag,
    offset: u32,
    comp_length: u32,
    orig_length: u32,
    orig_checksum: u32,
}

/// Wraps a TrueType font in a WOFF container.
///
/// `level` is the zlib compression level from 0 to 9.
///
/// # Errors
///
/// Fails if `ttf` is not a TrueType font.
pub fn encode(ttf: &[u8], level: u32) -> Result<Bytes, ReadError> {
    let font = FontFile::parse(ttf)?;
    let mut records = font.records.clone();
    records.sort_by_key(|record| record.tag);

    let mut blocks: Vec<(Entry, Vec<u8>)> = Vec::with_capacity(records.len());
    let mut offset = HEADER_SIZE + records.len() * ENTRY_SIZE;

    for record in &records {
        let data = font.require(record.tag)?;
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(level));
        encoder.write_all(data)?;
        let compressed = encoder.finish()?;

        let stored = if compressed.len() < data.len() {
            compressed
        } else {
            data.to_vec()
        };

        log::trace!(
            "woff: table {} {} -> {} bytes",
            record.tag,
            data.len(),
            stored.len()
        );

        let entry = Entry {
            tag: record.tag,
            offset: offset as u32,
            comp_length: stored.len() as u32,
            orig_length: data.len() as u32,
            orig_checksum: record.checksum,
        };
        offset += stored.len() + padding(stored.len());
        blocks.push((entry, stored));
    }

    let length = offset;
    let total_sfnt_size = PREAMBLE_SIZE
        + records.len() * TABLE_RECORD_SIZE
        + records
            .iter()
            .map(|r| r.length as usize + padding(r.length as usize))
            .sum::<usize>();

    let mut buf = BytesMut::with_capacity(length);
    buf.put_u32(SIGNATURE);
    buf.put_u32(font.sfnt_version);
    buf.put_u32(length as u32);
    buf.put_u16(records.len() as u16);
    let reserved = 0;
    buf.put_u16(reserved);
    buf.put_u32(total_sfnt_size as u32);
    buf.put_u16(VERSION.0);
    buf.put_u16(VERSION.1);
    // metaOffset, metaLength, metaOrigLength, privOffset, privLength
    for _ in 0..5 {
        buf.put_u32(0);
    }

    for (entry, _) in &blocks {
        buf.put_u32(entry.tag.into());
        buf.put_u32(entry.offset);
        buf.put_u32(entry.comp_length);
        buf.put_u32(entry.orig_length);
        buf.put_u32(entry.orig_checksum);
    }

    for (_, data) in &blocks {
        buf.put_slice(data);
        buf.put_bytes(0, padding(data.len()));
    }

    assert_eq!(length, buf.len());

    log::info!("woff: {} -> {} bytes", ttf.len(), length);

    Ok(buf.freeze())
}

/// Restores the TrueType font of a WOFF container.
///
/// # Errors
///
/// Fails for data that is not a well-formed WOFF file, including tables that do not decompress to their declared length.
pub fn decode(woff: &[u8]) -> Result<Bytes, ReadError> {
    let mut reader = Reader::new(woff);
    let signature = reader.u32()?;

    if signature != SIGNATURE {
        return Err(ReadError::UnknownSignature(signature));
    }

    let flavor = reader.u32()?;
    if flavor != sfnt::read::TRUETYPE_VERSION {
        return Err(ReadError::UnknownSignature(flavor));
    }

    let length = reader.u32()? as usize;
    if length != woff.len() {
        return Err(ReadError::Malformed("WOFF length does not match the data"));
    }

    let num_tables = reader.u16()?;
    reader.seek(HEADER_SIZE)?;

    let mut tables = Vec::with_capacity(num_tables as usize);

    for _ in 0..num_tables {
        let entry = Entry {
            tag: Tag::from_u32(reader.u32()?).ok_or(ReadError::Malformed("table tag"))?,
            offset: reader.u32()?,
            comp_length: reader.u32()?,
            orig_length: reader.u32()?,
            orig_checksum: reader.u32()?,
        };

        let start = entry.offset as usize;
        let stored = woff
            .get(start..start + entry.comp_length as usize)
            .ok_or(ReadError::OutOfBounds("WOFF table"))?;

        let data = if entry.comp_length < entry.orig_length {
            let mut data = Vec::with_capacity(entry.orig_length as usize);
            ZlibDecoder::new(stored).read_to_end(&mut data)?;
            data
        } else if entry.comp_length == entry.orig_length {
            stored.to_vec()
        } else {
            return Err(ReadError::Malformed("WOFF table is larger than its original"));
        };

        if data.len() != entry.orig_length as usize {
            return Err(ReadError::Malformed("WOFF table has the wrong length"));
        }

        if entry.tag != sfnt::tables::head::TAG && sfnt::table_checksum(&data) != entry.orig_checksum {
            log::warn!("woff: checksum mismatch for table {}", entry.tag);
        }

        tables.push((entry.tag, Bytes::from(data)));
    }

    sfnt::assemble(tables)
}
