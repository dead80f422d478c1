//! # glyf — Glyph Data
//!
//! *Specification:*
//! [OpenType](https://docs.microsoft.com/en-us/typography/opentype/spec/glyf).
//!
//! All glyphs are simple glyphs without instructions.
//! Coordinates are stored as deltas from the previous point; deltas of up to 255 units take a single byte, and repeated flags are run-length encoded.
//! Each glyph is padded to a multiple of four bytes, so `loca` offsets are always even.
//!
//! ```
//! # use glyphset::glyph::Point;
//! # use glyphset::sfnt::tables::glyf::{decode_simple, encode_simple, SimpleGlyph};
//! let triangle = vec![
//!     Point { x: 0, y: 0, on_curve: true },
//!     Point { x: 500, y: 1000, on_curve: true },
//!     Point { x: 1000, y: 0, on_curve: true },
//! ];
//! let glyph = SimpleGlyph::new(vec![triangle]);
//! let data = encode_simple(&glyph);
//! assert_eq!(decode_simple(&data).unwrap(), glyph);
//! ```

use crate::glyph::{Bounds, Contour, GlyphTable, Point};
use crate::sfnt::read::{ReadError, Reader};
use crate::sfnt::types::Tag;
use bytes::{BufMut, Bytes, BytesMut};

/// The tag of the table.
pub const TAG: Tag = Tag(*b"glyf");

/// The point is on the curve.
pub const ON_CURVE_POINT: u8 = 0x01;
/// The x delta is a single unsigned byte.
pub const X_SHORT_VECTOR: u8 = 0x02;
/// The y delta is a single unsigned byte.
pub const Y_SHORT_VECTOR: u8 = 0x04;
/// The next byte repeats the flag that many times.
pub const REPEAT_FLAG: u8 = 0x08;
/// Positive short x delta, or x equal to the previous x.
pub const X_IS_SAME_OR_POSITIVE: u8 = 0x10;
/// Positive short y delta, or y equal to the previous y.
pub const Y_IS_SAME_OR_POSITIVE: u8 = 0x20;

/// A simple glyph as stored in `glyf`.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct SimpleGlyph {
    /// The contours of the glyph.
    pub contours: Vec<Contour>,
    /// The bounding box; `None` for an empty glyph.
    pub bounds: Option<Bounds>,
    /// The TrueType instructions.
    pub instructions: Vec<u8>,
}

impl SimpleGlyph {
    /// Creates a glyph without instructions, computing its bounding box.
    pub fn new(contours: Vec<Contour>) -> Self {
        let bounds = Bounds::of(contours.iter().flatten());
        SimpleGlyph {
            contours,
            bounds,
            instructions: Vec::new(),
        }
    }
}

/// Returns a `glyf` table and the `loca` offsets of its glyphs.
///
/// The table starts with the empty `.notdef` glyph.
pub fn compile(table: &GlyphTable) -> (Bytes, Vec<u32>) {
    let mut buf = BytesMut::new();
    let mut offsets = Vec::with_capacity(table.len() + 2);

    // `.notdef`
    offsets.push(0);

    for glyph in table.glyphs() {
        offsets.push(buf.len() as u32);
        let data = encode_simple(&SimpleGlyph::new(glyph.contours.clone()));
        put_padded(&mut buf, &data);
    }

    offsets.push(buf.len() as u32);

    log::debug!("glyf: {} bytes for {} glyphs", buf.len(), table.len() + 1);

    (buf.freeze(), offsets)
}

/// Appends glyph data padded to a multiple of four bytes.
pub fn put_padded(buf: &mut BytesMut, data: &[u8]) {
    buf.put_slice(data);
    let padding = (4 - data.len() % 4) % 4;
    buf.put_bytes(0, padding);
}

/// Encodes a simple glyph; an empty glyph takes no bytes at all.
pub fn encode_simple(glyph: &SimpleGlyph) -> Bytes {
    let bounds = match glyph.bounds {
        Some(bounds) if !glyph.contours.is_empty() => bounds,
        _ => return Bytes::new(),
    };

    let mut buf = BytesMut::new();
    buf.put_i16(glyph.contours.len() as i16);
    buf.put_i16(bounds.x_min);
    buf.put_i16(bounds.y_min);
    buf.put_i16(bounds.x_max);
    buf.put_i16(bounds.y_max);

    let mut end = 0usize;
    for contour in &glyph.contours {
        end += contour.len();
        buf.put_u16((end - 1) as u16);
    }

    buf.put_u16(glyph.instructions.len() as u16);
    buf.put_slice(&glyph.instructions);

    let mut flags: Vec<u8> = Vec::with_capacity(end);
    let mut xs = BytesMut::new();
    let mut ys = BytesMut::new();
    let (mut last_x, mut last_y) = (0i16, 0i16);

    for point in glyph.contours.iter().flatten() {
        let mut flag = if point.on_curve { ON_CURVE_POINT } else { 0 };
        // `glyph::outline` bounds the extent of a glyph to `i16::MAX`, so no delta wraps
        flag |= put_delta(&mut xs, point.x.wrapping_sub(last_x), X_SHORT_VECTOR, X_IS_SAME_OR_POSITIVE);
        flag |= put_delta(&mut ys, point.y.wrapping_sub(last_y), Y_SHORT_VECTOR, Y_IS_SAME_OR_POSITIVE);
        flags.push(flag);
        last_x = point.x;
        last_y = point.y;
    }

    let mut index = 0;
    while index < flags.len() {
        let flag = flags[index];
        let repeats = flags[index + 1..]
            .iter()
            .take(255)
            .take_while(|&&next| next == flag)
            .count();

        // a single repeat costs as much as writing the flag twice
        if repeats > 1 {
            buf.put_u8(flag | REPEAT_FLAG);
            buf.put_u8(repeats as u8);
            index += repeats + 1;
        } else {
            buf.put_u8(flag);
            index += 1;
        }
    }

    buf.put_slice(&xs);
    buf.put_slice(&ys);

    buf.freeze()
}

/// Writes a coordinate delta and returns its flag bits.
fn put_delta(buf: &mut BytesMut, delta: i16, short: u8, same_or_positive: u8) -> u8 {
    if delta == 0 {
        same_or_positive
    } else if delta.unsigned_abs() <= 255 {
        buf.put_u8(delta.unsigned_abs() as u8);
        if delta > 0 {
            short | same_or_positive
        } else {
            short
        }
    } else {
        buf.put_i16(delta);
        0
    }
}

/// Decodes a simple glyph.
///
/// Empty data decodes to the empty glyph.
///
/// # Errors
///
/// Fails for truncated data and for composite glyphs.
pub fn decode_simple(data: &[u8]) -> Result<SimpleGlyph, ReadError> {
    if data.is_empty() {
        return Ok(SimpleGlyph::default());
    }

    let mut reader = Reader::new(data);
    let number_of_contours = reader.i16()?;

    if number_of_contours < 0 {
        return Err(ReadError::Malformed("composite glyphs are not supported"));
    }

    let bounds = Bounds {
        x_min: reader.i16()?,
        y_min: reader.i16()?,
        x_max: reader.i16()?,
        y_max: reader.i16()?,
    };
    let end_points = reader.u16_array(number_of_contours as usize)?;

    if end_points.windows(2).any(|w| w[1] <= w[0]) {
        return Err(ReadError::Malformed("contour end points do not increase"));
    }

    let point_count = end_points.last().map_or(0, |&end| end as usize + 1);
    let instruction_length = reader.u16()?;
    let instructions = reader.bytes(instruction_length as usize)?.to_vec();

    let mut flags = Vec::with_capacity(point_count);
    while flags.len() < point_count {
        let flag = reader.u8()?;
        flags.push(flag);

        if flag & REPEAT_FLAG != 0 {
            let repeats = reader.u8()?;
            for _ in 0..repeats {
                flags.push(flag);
            }
        }
    }

    if flags.len() != point_count {
        return Err(ReadError::Malformed("flags repeat beyond the last point"));
    }

    let xs = read_coordinates(&mut reader, &flags, X_SHORT_VECTOR, X_IS_SAME_OR_POSITIVE)?;
    let ys = read_coordinates(&mut reader, &flags, Y_SHORT_VECTOR, Y_IS_SAME_OR_POSITIVE)?;

    let mut points = flags
        .iter()
        .zip(xs.into_iter().zip(ys))
        .map(|(&flag, (x, y))| Point {
            x,
            y,
            on_curve: flag & ON_CURVE_POINT != 0,
        });

    let mut contours = Vec::with_capacity(end_points.len());
    let mut start = 0;
    for &end in &end_points {
        let len = end as usize + 1 - start;
        contours.push(points.by_ref().take(len).collect());
        start = end as usize + 1;
    }

    Ok(SimpleGlyph {
        contours,
        bounds: Some(bounds),
        instructions,
    })
}

fn read_coordinates(
    reader: &mut Reader,
    flags: &[u8],
    short: u8,
    same_or_positive: u8,
) -> Result<Vec<i16>, ReadError> {
    let mut value = 0i16;
    flags
        .iter()
        .map(|&flag| -> Result<i16, ReadError> {
            let delta = if flag & short != 0 {
                let magnitude = reader.u8()? as i16;
                if flag & same_or_positive != 0 {
                    magnitude
                } else {
                    -magnitude
                }
            } else if flag & same_or_positive != 0 {
                0
            } else {
                reader.i16()?
            };
            value = value.wrapping_add(delta);
            Ok(value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyph::Glyph;

    fn point(x: i16, y: i16, on_curve: bool) -> Point {
        Point { x, y, on_curve }
    }

    #[test]
    fn test_encode_square() {
        let glyph = SimpleGlyph::new(vec![vec![
            point(0, 0, true),
            point(0, 100, true),
            point(100, 100, true),
            point(100, 0, true),
        ]]);
        let data = encode_simple(&glyph);

        #[rustfmt::skip]
        let expected: &[u8] = &[
            0, 1, 0, 0, 0, 0, 0, 100, 0, 100, // header
            0, 3, // endPtsOfContours
            0, 0, // instructionLength
            0x31, 0x35, 0x33, 0x15, // flags
            100, // x deltas
            100, 100, // y deltas
        ];
        assert_eq!(&data[..], expected);
    }

    #[test]
    fn test_encode_repeats_flags() {
        let contour: Contour = (0..6).map(|i| point(i * 300, 0, true)).collect();
        let glyph = SimpleGlyph::new(vec![contour]);
        let data = encode_simple(&glyph);
        // the first point has no x delta, the other five share one flag
        assert_eq!(&data[14..17], &[0x31, 0x21 | REPEAT_FLAG, 4]);
        assert_eq!(decode_simple(&data).unwrap(), glyph);
    }

    #[test]
    fn test_decode_mixed_contours() {
        let glyph = SimpleGlyph::new(vec![
            vec![
                point(-500, -200, true),
                point(0, 800, false),
                point(500, -200, true),
            ],
            vec![point(10, 10, true), point(20, 10, true), point(15, 300, false)],
        ]);
        assert_eq!(decode_simple(&encode_simple(&glyph)).unwrap(), glyph);
    }

    #[test]
    fn test_decode_rejects_composites() {
        assert!(matches!(
            decode_simple(&[0xFF, 0xFF, 0, 0, 0, 0, 0, 0, 0, 0]),
            Err(ReadError::Malformed(_))
        ));
    }

    #[test]
    fn test_compile_offsets() {
        let table = GlyphTable::new(vec![
            Glyph {
                name: "a".to_string(),
                code_point: '\u{E600}',
                contours: vec![vec![point(0, 0, true), point(0, 100, true), point(100, 0, true)]],
                advance_width: 100,
            },
            Glyph {
                name: "b".to_string(),
                code_point: '\u{E601}',
                contours: Vec::new(),
                advance_width: 100,
            },
        ]);
        let (glyf, offsets) = compile(&table);
        assert_eq!(offsets.len(), 4);
        assert_eq!(offsets[0], 0);
        assert_eq!(offsets[1], 0);
        assert_eq!(offsets[2], offsets[3]);
        assert_eq!(offsets[3] as usize, glyf.len());
        assert_eq!(glyf.len() % 4, 0);
    }
}
