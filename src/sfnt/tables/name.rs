//! # name — Naming Table
//!
//! *Specification:*
//! [OpenType](https://docs.microsoft.com/en-us/typography/opentype/spec/name).
//!
//! The font family name is the configured name.
//! Strings are stored for the Windows platform in UTF-16BE with the US English language id, which every current platform reads.

use crate::ctx::Context;
use crate::sfnt::read::{ReadError, Reader};
use crate::sfnt::types::Tag;
use bytes::{BufMut, Bytes, BytesMut};
use std::mem::size_of;

/// The tag of the table.
pub const TAG: Tag = Tag(*b"name");
/// The Windows platform.
const PLATFORM_ID: u16 = 3;
/// Unicode BMP on the Windows platform.
const ENCODING_ID: u16 = 1;
/// English (United States).
const LANGUAGE_ID: u16 = 0x0409;
/// The size in bytes of the table header of format 0.
const HEADER_SIZE: usize = 3 * size_of::<u16>();
/// The size in bytes of a name record.
const NAME_RECORD_SIZE: usize = 6 * size_of::<u16>();
/// The longest font name, in UTF-16 code units.
///
/// The name occurs in three records; at this length their strings still fit the 16-bit offsets of the table.
pub const MAX_NAME_LENGTH: usize = 8192;
/// The maximal length of a PostScript name.
const MAX_POSTSCRIPT_NAME_LENGTH: usize = 63;

/// Name ids written to the table.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub enum NameId {
    /// Font family name.
    Family = 1,
    /// Font subfamily name.
    Subfamily = 2,
    /// Unique font identifier.
    UniqueId = 3,
    /// Full font name.
    FullName = 4,
    /// Version string.
    Version = 5,
    /// PostScript name.
    PostScriptName = 6,
}

/// Returns the PostScript form of a name: printable ASCII without delimiters or spaces, at most 63 characters.
pub fn postscript_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .filter(|c| c.is_ascii_graphic() && !"[](){}<>/%".contains(*c))
        .take(MAX_POSTSCRIPT_NAME_LENGTH)
        .collect();

    if sanitized.is_empty() {
        "Untitled".to_string()
    } else {
        sanitized
    }
}

/// Returns the name records of the font in order of their ids.
pub fn records(ctx: &Context) -> Vec<(NameId, String)> {
    vec![
        (NameId::Family, ctx.name.clone()),
        (NameId::Subfamily, "Regular".to_string()),
        (NameId::UniqueId, format!("{}:Regular", ctx.name)),
        (NameId::FullName, ctx.name.clone()),
        (NameId::Version, "Version 1.0".to_string()),
        (NameId::PostScriptName, postscript_name(&ctx.name)),
    ]
}

/// Returns a format 0 `name` table.
pub fn compile(ctx: &Context) -> Bytes {
    let records = records(ctx);
    let strings: Vec<Vec<u8>> = records
        .iter()
        .map(|(_, value)| value.encode_utf16().flat_map(u16::to_be_bytes).collect())
        .collect();

    let storage_offset = HEADER_SIZE + records.len() * NAME_RECORD_SIZE;
    let length = storage_offset + strings.iter().map(Vec::len).sum::<usize>();
    let mut buf = BytesMut::with_capacity(length);

    let format = 0;
    buf.put_u16(format);
    buf.put_u16(records.len() as u16);
    buf.put_u16(storage_offset as u16);

    let mut offset = 0;
    for ((id, _), string) in records.iter().zip(&strings) {
        buf.put_u16(PLATFORM_ID);
        buf.put_u16(ENCODING_ID);
        buf.put_u16(LANGUAGE_ID);
        buf.put_u16(*id as u16);
        buf.put_u16(string.len() as u16);
        buf.put_u16(offset as u16);
        offset += string.len();
    }

    for string in &strings {
        buf.put_slice(string);
    }

    assert_eq!(length, buf.len());

    buf.freeze()
}

/// Reads the Windows Unicode strings of a `name` table as pairs of name id and value.
pub fn parse(table: &[u8]) -> Result<Vec<(u16, String)>, ReadError> {
    let mut reader = Reader::new(table);
    let _format = reader.u16()?;
    let count = reader.u16()?;
    let storage_offset = reader.u16()? as usize;
    let mut names = Vec::with_capacity(count as usize);

    for _ in 0..count {
        let platform_id = reader.u16()?;
        let encoding_id = reader.u16()?;
        let _language_id = reader.u16()?;
        let name_id = reader.u16()?;
        let length = reader.u16()? as usize;
        let offset = reader.u16()? as usize;

        if platform_id != PLATFORM_ID || encoding_id != ENCODING_ID {
            continue;
        }

        let start = storage_offset + offset;
        let bytes = table
            .get(start..start + length)
            .ok_or(ReadError::OutOfBounds("name string"))?;
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        let value = String::from_utf16(&units)
            .map_err(|_| ReadError::Malformed("name string is not UTF-16"))?;

        names.push((name_id, value));
    }

    Ok(names)
}
