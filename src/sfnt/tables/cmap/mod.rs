//! # cmap — Character to Glyph Index Mapping Table
//!
//! Implementation of the `cmap` table.
//!
//! *Specification:*
//! [OpenType](https://docs.microsoft.com/en-us/typography/opentype/spec/cmap),
//! [TrueType](https://developer.apple.com/fonts/TrueType-Reference-Manual/RM06/Chap6cmap.html).
//!
//! The `cmap` table maps code points to glyph ids.
//! Text rendering resolves the glyph of an icon through this table: the CSS rule of an icon inserts its code point, and the font maps the code point to the glyph.
//!
//! A `cmap` table consists of one or multiple subtables, accessed by encoding records.
//! A record names the platform, the encoding, and the format of its subtable.
//! Records using the same subtable format share a single copy of the subtable.
//!
//! Icon fonts place their glyphs in a Private Use Area.
//! The default records use format 4 for code points in the Basic Multilingual Plane and add format 12 records only if a code point lies beyond it.
//!
//! # Example
//!
//! ```
//! # use glyphset::ctx::Context;
//! # use glyphset::data::CharacterMap;
//! # use glyphset::sfnt::tables::cmap::{compile, parse};
//! let ctx = Context::default();
//! let mut map = CharacterMap::new();
//! map.insert('\u{E600}', 1);
//! map.insert('\u{E601}', 2);
//! let table = compile(&map, &ctx);
//! assert_eq!(parse(&table).unwrap(), map);
//! ```

pub mod format12;
pub mod format4;

use crate::ctx::Context;
use crate::data::CharacterMap;
use crate::sfnt::read::{ReadError, Reader};
use crate::sfnt::types::Tag;
use bytes::{BufMut, Bytes, BytesMut};
use itertools::Itertools;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// The tag of the table.
pub const TAG: Tag = Tag(*b"cmap");

/// `version` and `numTables`.
const HEADER_SIZE: usize = 4;
/// `platformID`, `encodingID`, and `subtableOffset`.
const RECORD_SIZE: usize = 8;
/// The largest Unicode scalar that is part of the Basic Multilingual Plane (BMP).
pub const MAX_BMP_SCALAR: char = '\u{FFFF}';

/// The records of a character map within the BMP.
static BMP_RECORDS: [EncodingRecord; 2] = [
    EncodingRecord::new(Platform::Unicode, Codespace::Bmp),
    EncodingRecord::new(Platform::Windows, Codespace::Bmp),
];

/// The records of a character map reaching beyond the BMP.
///
/// Format 4 subtables stay for consumers without format 12 support.
static FULL_RECORDS: [EncodingRecord; 4] = [
    EncodingRecord::new(Platform::Unicode, Codespace::Bmp),
    EncodingRecord::new(Platform::Unicode, Codespace::Full),
    EncodingRecord::new(Platform::Windows, Codespace::Bmp),
    EncodingRecord::new(Platform::Windows, Codespace::Full),
];

/// Returns the encoding records used for the given character map.
///
/// These are the records of the context if set, otherwise the default records fitting the code points of the map.
pub fn encoding_records<'a>(map: &CharacterMap, ctx: &'a Context) -> &'a [EncodingRecord] {
    match &ctx.cmap_encoding_records {
        Some(records) => records.as_slice(),
        None if first_beyond_format4(map).is_some() => &FULL_RECORDS[..],
        None => &BMP_RECORDS[..],
    }
}

/// Returns the smallest code point of the map that no format 4 subtable can hold.
///
/// These are the code points beyond the BMP and `U+FFFF`, which format 4 reserves for its sentinel segment.
pub fn first_beyond_format4(map: &CharacterMap) -> Option<char> {
    map.range(MAX_BMP_SCALAR..).next().map(|(&c, _)| c)
}

/// Returns the smallest code point of the map that none of the records maps, or `None` if every code point is mapped.
pub fn first_unmapped(map: &CharacterMap, records: &[EncodingRecord]) -> Option<char> {
    if records.iter().any(|r| r.format == SubtableFormat::Format12) {
        return None;
    }

    if records.is_empty() {
        map.keys().next().copied()
    } else {
        first_beyond_format4(map)
    }
}

/// Returns a `cmap` table for the given character map.
pub fn compile(map: &CharacterMap, ctx: &Context) -> Bytes {
    let records = encoding_records(map, ctx);

    // one subtable per format, in order of first use
    let mut subtables: Vec<(SubtableFormat, Bytes)> = Vec::new();
    for format in records.iter().map(|r| r.format).unique() {
        let subtable = match format {
            SubtableFormat::Format4 => format4::compile(map),
            SubtableFormat::Format12 => format12::compile(map),
        };
        subtables.push((format, subtable));
    }

    let mut offsets: BTreeMap<SubtableFormat, u32> = BTreeMap::new();
    let mut offset = HEADER_SIZE + records.len() * RECORD_SIZE;
    for (format, subtable) in &subtables {
        offsets.insert(*format, offset as u32);
        offset += subtable.len();
    }

    let mut buf = BytesMut::with_capacity(offset);
    buf.put_u16(0);
    buf.put_u16(records.len() as u16);

    for record in records {
        log::debug!("cmap record {}", record);
        buf.put_u16(record.encoding.platform as u16);
        buf.put_u16(record.encoding.encoding_id());
        buf.put_u32(offsets[&record.format]);
    }

    for (_, subtable) in &subtables {
        buf.put_slice(subtable);
    }

    assert_eq!(offset, buf.len());

    buf.freeze()
}

/// Reads the character map of a `cmap` table.
///
/// The mappings of all supported subtables are merged.
/// Subtables of unsupported formats are skipped.
pub fn parse(table: &[u8]) -> Result<CharacterMap, ReadError> {
    let mut reader = Reader::new(table);
    let _version = reader.u16()?;
    let num_tables = reader.u16()?;

    let mut offsets: Vec<u32> = Vec::with_capacity(num_tables as usize);
    for _ in 0..num_tables {
        reader.skip(4)?;
        offsets.push(reader.u32()?);
    }

    let mut map = CharacterMap::new();

    for offset in offsets.into_iter().unique() {
        let subtable = table
            .get(offset as usize..)
            .ok_or(ReadError::OutOfBounds("cmap subtable"))?;
        let id = Reader::new(subtable).u16()?;

        match SubtableFormat::from_id(id) {
            Some(SubtableFormat::Format4) => map.extend(format4::parse(subtable)?),
            Some(SubtableFormat::Format12) => map.extend(format12::parse(subtable)?),
            None => log::warn!("skipping cmap subtable of unsupported format {}", id),
        }
    }

    Ok(map)
}

/// An error that may occur when reading an encoding record code.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Error)]
pub enum RecordError {
    /// The code is not of the form `platform/encoding=format`.
    #[error("expected a code of the form 'platform/encoding=format'")]
    InvalidSyntax,
    /// The platform is not a number.
    #[error("the platform is not a number")]
    InvalidPlatform,
    /// The encoding is not a number.
    #[error("the encoding is not a number")]
    InvalidEncoding,
    /// The format is not a number.
    #[error("the format is not a number")]
    InvalidFormat,
    /// Only the Unicode (0) and Windows (3) platforms are supported.
    #[error("only the platforms 0 and 3 are supported")]
    UnsupportedPlatform,
    /// The encoding can not address Unicode code points on its platform.
    #[error("the encoding is not a Unicode encoding of the platform")]
    UnsupportedEncoding,
    /// Only subtable formats 4 and 12 are supported.
    #[error("only the subtable formats 4 and 12 are supported")]
    UnsupportedFormat,
}

/// An encoding record describes a `cmap` subtable.
///
/// Records order by platform, then by encoding, which is the order required within a `cmap` table.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub struct EncodingRecord {
    /// The encoding used by the subtable.
    pub encoding: Encoding,
    /// The subtable format.
    pub format: SubtableFormat,
}

impl EncodingRecord {
    /// Returns the record of a platform and codespace with the smallest format able to address the codespace.
    pub const fn new(platform: Platform, codespace: Codespace) -> EncodingRecord {
        EncodingRecord {
            encoding: Encoding { platform, codespace },
            format: match codespace {
                Codespace::Bmp => SubtableFormat::Format4,
                Codespace::Full => SubtableFormat::Format12,
            },
        }
    }

    /// Creates an `EncodingRecord` from an encoding-record code.
    ///
    /// Codes are formatted as `<platform_id> "/" <encoding_id> "=" <format_id>`, the same as the `Display` output.
    ///
    /// ## Example
    ///
    /// ```
    /// # use glyphset::sfnt::tables::cmap::{Codespace, Encoding, EncodingRecord, Platform, SubtableFormat};
    /// assert_eq!(
    ///     EncodingRecord::from_code("3/1=4"),
    ///     Ok(EncodingRecord {
    ///         encoding: Encoding { platform: Platform::Windows, codespace: Codespace::Bmp },
    ///         format: SubtableFormat::Format4,
    ///     })
    /// );
    /// ```
    pub fn from_code(code: &str) -> Result<EncodingRecord, RecordError> {
        let (platform, rest) = code.split_once('/').ok_or(RecordError::InvalidSyntax)?;
        let (encoding, format) = rest.split_once('=').ok_or(RecordError::InvalidSyntax)?;

        let number = |text: &str, error| text.parse::<u16>().map_err(|_| error);
        let platform = number(platform, RecordError::InvalidPlatform)?;
        let encoding = number(encoding, RecordError::InvalidEncoding)?;
        let format = number(format, RecordError::InvalidFormat)?;

        Ok(EncodingRecord {
            encoding: Encoding::from_ids(platform, encoding)?,
            format: SubtableFormat::from_id(format).ok_or(RecordError::UnsupportedFormat)?,
        })
    }
}

impl fmt::Display for EncodingRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}={}",
            self.encoding.platform as u16,
            self.encoding.encoding_id(),
            self.format as u16
        )
    }
}

/// A platform of an encoding record; the discriminant is the `platformID`.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub enum Platform {
    /// The Unicode platform.
    Unicode = 0,
    /// The Windows platform.
    Windows = 3,
}

/// The code points a Unicode encoding is able to address.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub enum Codespace {
    /// The Basic Multilingual Plane.
    Bmp,
    /// All Unicode planes.
    Full,
}

/// A Unicode encoding on a platform.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub struct Encoding {
    /// The platform.
    pub platform: Platform,
    /// The addressable code points.
    pub codespace: Codespace,
}

/// The `encodingID` of every supported encoding.
const ENCODING_IDS: [(Platform, Codespace, u16); 4] = [
    (Platform::Unicode, Codespace::Bmp, 3),
    (Platform::Unicode, Codespace::Full, 4),
    (Platform::Windows, Codespace::Bmp, 1),
    (Platform::Windows, Codespace::Full, 10),
];

impl Encoding {
    /// Returns the encoding of a `platformID` and `encodingID`.
    ///
    /// # Errors
    ///
    /// Fails if the platform is neither Unicode nor Windows, or if the encoding does not map Unicode code points.
    pub fn from_ids(platform_id: u16, encoding_id: u16) -> Result<Encoding, RecordError> {
        let platform = match platform_id {
            0 => Platform::Unicode,
            3 => Platform::Windows,
            _ => return Err(RecordError::UnsupportedPlatform),
        };

        ENCODING_IDS
            .iter()
            .find(|&&(p, _, id)| p == platform && id == encoding_id)
            .map(|&(_, codespace, _)| Encoding { platform, codespace })
            .ok_or(RecordError::UnsupportedEncoding)
    }

    /// The `encodingID` of the encoding.
    pub fn encoding_id(&self) -> u16 {
        ENCODING_IDS
            .iter()
            .find(|&&(p, c, _)| p == self.platform && c == self.codespace)
            .map_or(0, |&(_, _, id)| id)
    }
}

/// A supported `cmap` subtable format; the discriminant is the format number.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub enum SubtableFormat {
    /// Segment mapping to delta values.
    Format4 = 4,
    /// Segmented coverage.
    Format12 = 12,
}

impl SubtableFormat {
    /// Returns the format of a subtable format number, or `None` if it is not supported.
    pub fn from_id(id: u16) -> Option<SubtableFormat> {
        match id {
            4 => Some(Self::Format4),
            12 => Some(Self::Format12),
            _ => None,
        }
    }
}
