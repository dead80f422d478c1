//! Structural reading of SFNT fonts.
//!
//! The reader covers what is needed to inspect and re-encode the fonts this crate produces: the table directory, the character map, and simple glyph outlines.
//! It is used by the container encoders to split a font into its tables and by the decoders to verify that a container reproduces its font.

use crate::data::CharacterMap;
use crate::glyph::Contour;
use crate::sfnt::tables::{cmap, glyf, head, loca, maxp};
use crate::sfnt::types::Tag;
use thiserror::Error;

/// The `sfntVersion` of fonts with TrueType outlines.
pub const TRUETYPE_VERSION: u32 = 0x0001_0000;

/// An error that may occur when reading a font or container.
#[derive(Debug, Error)]
pub enum ReadError {
    /// The data ends before a field that was expected at the given offset.
    #[error("unexpected end of data at offset {0}")]
    UnexpectedEnd(usize),
    /// A referenced range lies outside of the data.
    #[error("{0} lies outside of the data")]
    OutOfBounds(&'static str),
    /// The data starts with an unknown signature.
    #[error("unknown signature 0x{0:08X}")]
    UnknownSignature(u32),
    /// A required table is missing.
    #[error("the table {0} is missing")]
    MissingTable(Tag),
    /// A value contradicts the structure of the format.
    #[error("malformed data: {0}")]
    Malformed(&'static str),
    /// Compressed data could not be decompressed.
    #[error("decompression failed: {0}")]
    Decompression(#[from] std::io::Error),
}

/// A cursor over big-endian data that fails instead of panicking at the end of the data.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> Reader<'a> {
    /// Creates a reader positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Reader { data, position: 0 }
    }

    /// Returns the current offset.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Returns the number of bytes after the current offset.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Moves to the given offset.
    pub fn seek(&mut self, position: usize) -> Result<(), ReadError> {
        if position > self.data.len() {
            return Err(ReadError::UnexpectedEnd(position));
        }
        self.position = position;
        Ok(())
    }

    /// Advances by `count` bytes.
    pub fn skip(&mut self, count: usize) -> Result<(), ReadError> {
        self.bytes(count).map(|_| ())
    }

    /// Reads `count` bytes.
    pub fn bytes(&mut self, count: usize) -> Result<&'a [u8], ReadError> {
        let end = self
            .position
            .checked_add(count)
            .filter(|&end| end <= self.data.len())
            .ok_or(ReadError::UnexpectedEnd(self.position))?;
        let bytes = &self.data[self.position..end];
        self.position = end;
        Ok(bytes)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], ReadError> {
        let mut array = [0; N];
        array.copy_from_slice(self.bytes(N)?);
        Ok(array)
    }

    /// Reads a `uint8`.
    pub fn u8(&mut self) -> Result<u8, ReadError> {
        Ok(self.array::<1>()?[0])
    }

    /// Reads an `int8`.
    pub fn i8(&mut self) -> Result<i8, ReadError> {
        Ok(self.u8()? as i8)
    }

    /// Reads a `uint16`.
    pub fn u16(&mut self) -> Result<u16, ReadError> {
        Ok(u16::from_be_bytes(self.array()?))
    }

    /// Reads an `int16`.
    pub fn i16(&mut self) -> Result<i16, ReadError> {
        Ok(i16::from_be_bytes(self.array()?))
    }

    /// Reads a `uint32`.
    pub fn u32(&mut self) -> Result<u32, ReadError> {
        Ok(u32::from_be_bytes(self.array()?))
    }

    /// Reads an `int64`, the representation of `LONGDATETIME`.
    pub fn i64(&mut self) -> Result<i64, ReadError> {
        Ok(i64::from_be_bytes(self.array()?))
    }

    /// Reads `count` consecutive `uint16` values.
    pub fn u16_array(&mut self, count: usize) -> Result<Vec<u16>, ReadError> {
        (0..count).map(|_| self.u16()).collect()
    }
}

/// A record of the table directory.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct TableRecord {
    /// The tag of the table.
    pub tag: Tag,
    /// The checksum of the table.
    pub checksum: u32,
    /// The offset of the table from the start of the font.
    pub offset: u32,
    /// The unpadded length of the table.
    pub length: u32,
}

/// A parsed SFNT font borrowing its data.
#[derive(Debug, Clone)]
pub struct FontFile<'a> {
    data: &'a [u8],
    /// The `sfntVersion` of the font.
    pub sfnt_version: u32,
    /// The table directory in file order.
    pub records: Vec<TableRecord>,
}

impl<'a> FontFile<'a> {
    /// Parses the table directory of a font.
    ///
    /// # Errors
    ///
    /// Fails if the data is not a TrueType font or a table lies outside of the data.
    pub fn parse(data: &'a [u8]) -> Result<FontFile<'a>, ReadError> {
        let mut reader = Reader::new(data);
        let sfnt_version = reader.u32()?;

        if sfnt_version != TRUETYPE_VERSION {
            return Err(ReadError::UnknownSignature(sfnt_version));
        }

        let num_tables = reader.u16()?;
        // searchRange, entrySelector, rangeShift
        reader.skip(6)?;

        let mut records = Vec::with_capacity(num_tables as usize);

        for _ in 0..num_tables {
            let tag = Tag(reader.array()?);
            let checksum = reader.u32()?;
            let offset = reader.u32()?;
            let length = reader.u32()?;

            let end = offset as u64 + length as u64;
            if end > data.len() as u64 {
                return Err(ReadError::OutOfBounds("table"));
            }

            records.push(TableRecord {
                tag,
                checksum,
                offset,
                length,
            });
        }

        Ok(FontFile {
            data,
            sfnt_version,
            records,
        })
    }

    /// Returns the data of a table, or `None` if the font does not contain it.
    pub fn table(&self, tag: Tag) -> Option<&'a [u8]> {
        self.records
            .iter()
            .find(|record| record.tag == tag)
            .map(|record| {
                let start = record.offset as usize;
                &self.data[start..start + record.length as usize]
            })
    }

    /// Returns the data of a table that must be present.
    pub fn require(&self, tag: Tag) -> Result<&'a [u8], ReadError> {
        self.table(tag).ok_or(ReadError::MissingTable(tag))
    }

    /// Returns the tables in file order.
    pub fn tables(&self) -> Vec<(Tag, &'a [u8])> {
        self.records
            .iter()
            .map(|record| {
                let start = record.offset as usize;
                (record.tag, &self.data[start..start + record.length as usize])
            })
            .collect()
    }

    /// Returns the number of glyphs as declared by `maxp`.
    pub fn num_glyphs(&self) -> Result<u16, ReadError> {
        maxp::parse_num_glyphs(self.require(maxp::TAG)?)
    }

    /// Returns the character map of the font.
    pub fn character_map(&self) -> Result<CharacterMap, ReadError> {
        cmap::parse(self.require(cmap::TAG)?)
    }

    /// Returns the glyph offsets of the `loca` table, including the trailing end offset.
    pub fn loca_offsets(&self) -> Result<Vec<u32>, ReadError> {
        let long = head::parse_index_to_loc_format(self.require(head::TAG)?)? == 1;
        loca::parse(self.require(loca::TAG)?, self.num_glyphs()?, long)
    }

    /// Returns the data of every glyph in glyph id order.
    pub fn glyph_data(&self) -> Result<Vec<&'a [u8]>, ReadError> {
        let glyf = self.require(glyf::TAG)?;
        let offsets = self.loca_offsets()?;

        offsets
            .windows(2)
            .map(|window| {
                let (start, end) = (window[0] as usize, window[1] as usize);
                glyf.get(start..end)
                    .ok_or(ReadError::OutOfBounds("glyph"))
            })
            .collect()
    }

    /// Returns the contours of every glyph in glyph id order.
    pub fn glyph_contours(&self) -> Result<Vec<Vec<Contour>>, ReadError> {
        self.glyph_data()?
            .into_iter()
            .map(|data| glyf::decode_simple(data).map(|glyph| glyph.contours))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_bounds() {
        let mut reader = Reader::new(&[0x12, 0x34, 0x56]);
        assert_eq!(reader.u16().unwrap(), 0x1234);
        assert_eq!(reader.remaining(), 1);
        assert!(matches!(reader.u16(), Err(ReadError::UnexpectedEnd(2))));
        // a failed read does not advance
        assert_eq!(reader.u8().unwrap(), 0x56);
        assert!(reader.seek(4).is_err());
    }

    #[test]
    fn test_reader_signed() {
        let mut reader = Reader::new(&[0xFF, 0xFE, 0x80]);
        assert_eq!(reader.i16().unwrap(), -2);
        assert_eq!(reader.i8().unwrap(), -128);
    }

    #[test]
    fn test_parse_rejects_other_signatures() {
        assert!(matches!(
            FontFile::parse(b"wOFF\0\0\0\0\0\0\0\0"),
            Err(ReadError::UnknownSignature(0x774F_4646))
        ));
        assert!(matches!(
            FontFile::parse(&[0, 1]),
            Err(ReadError::UnexpectedEnd(0))
        ));
    }
}
