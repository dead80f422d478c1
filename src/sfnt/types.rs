//! Types used throughout an SFNT file.

use std::fmt;

/// A four-byte table tag such as `glyf` or `OS/2`.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Copy, Clone)]
pub struct Tag(pub [u8; 4]);

impl Tag {
    /// Reads a tag from its big-endian `u32` form, as stored in a table directory.
    ///
    /// Tags consist of printable ASCII characters; `None` is returned for any other byte.
    pub fn from_u32(value: u32) -> Option<Tag> {
        let bytes = value.to_be_bytes();
        bytes
            .iter()
            .all(|b| (0x20..=0x7E).contains(b))
            .then_some(Tag(bytes))
    }
}

impl From<Tag> for u32 {
    fn from(tag: Tag) -> u32 {
        u32::from_be_bytes(tag.0)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}'", self.0.escape_ascii())
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag({})", self.0.escape_ascii())
    }
}

/// Fixed-point number with 16 integer and 16 fractional bits.
#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone)]
pub struct Fixed(pub u32);

impl Fixed {
    /// Version 1.0 of tables such as `head`, `hhea`, and `maxp`.
    pub const VERSION_1_0: Fixed = Fixed(0x0001_0000);
    /// Version 2.0 of the `post` table.
    pub const VERSION_2_0: Fixed = Fixed(0x0002_0000);
}

impl From<Fixed> for u32 {
    fn from(value: Fixed) -> u32 {
        value.0
    }
}

/// The number of seconds between the `LONGDATETIME` epoch, 1904-01-01 00:00 UTC, and the Unix epoch.
pub const MAC_EPOCH_OFFSET: i64 = 2_082_844_800;

/// Converts a Unix timestamp in seconds to a `LONGDATETIME`.
pub fn long_date_time(unix_seconds: i64) -> i64 {
    unix_seconds.saturating_add(MAC_EPOCH_OFFSET)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_from_u32() {
        assert_eq!(Tag::from_u32(0x676C7966), Some(Tag(*b"glyf")));
        assert_eq!(Tag::from_u32(0x00010000), None);
        assert_eq!(u32::from(Tag(*b"OS/2")), 0x4F532F32);
    }

    #[test]
    fn test_tag_format() {
        assert_eq!(Tag(*b"cvt ").to_string(), "'cvt '");
        assert_eq!(format!("{:?}", Tag([b'a', 0, b'b', b'c'])), "Tag(a\\x00bc)");
    }

    #[test]
    fn test_tag_order_is_byte_order() {
        let mut tags = vec![Tag(*b"post"), Tag(*b"OS/2"), Tag(*b"cmap"), Tag(*b"glyf")];
        tags.sort();
        assert_eq!(
            tags,
            vec![Tag(*b"OS/2"), Tag(*b"cmap"), Tag(*b"glyf"), Tag(*b"post")]
        );
    }

    #[test]
    fn test_long_date_time() {
        assert_eq!(long_date_time(0), MAC_EPOCH_OFFSET);
    }
}
