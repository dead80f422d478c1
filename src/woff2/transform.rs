//! The WOFF2 `glyf` and `loca` transform.
//!
//! The transformed table starts with a header of the glyph count, the `indexToLocFormat`, and the sizes of seven streams:
//!
//! | Stream        | Content                                                         |
//! |---------------|-----------------------------------------------------------------|
//! | `nContour`    | `int16` contour count of every glyph                            |
//! | `nPoints`     | `255UInt16` point count of every contour                        |
//! | `flag`        | one byte per point: the triplet encoding and the on-curve bit   |
//! | `glyph`       | coordinate triplets and `255UInt16` instruction lengths         |
//! | `composite`   | composite glyph data, always empty here                         |
//! | `bbox`        | a bitmap of glyphs with explicit bounds followed by those bounds |
//! | `instruction` | the instructions of every glyph                                 |
//!
//! Bounding boxes that equal the bounds of the points are left out and recomputed by the decoder.
//! The `loca` table is not stored at all; the decoder rebuilds it from the reconstructed glyphs.

use crate::glyph::{Bounds, Contour, Point};
use crate::sfnt::read::{FontFile, ReadError, Reader};
use crate::sfnt::tables::glyf::{self, SimpleGlyph};
use crate::sfnt::tables::{head, loca};
use bytes::{BufMut, Bytes, BytesMut};

use super::{put_255_u16, read_255_u16};

/// The size in bytes of the transformed table header.
const HEADER_SIZE: usize = 36;
/// The flag bit of off-curve points.
const OFF_CURVE: u8 = 0x80;

/// Writes the triplet of a coordinate delta and returns its flag without the on-curve bit.
pub fn put_triplet(buf: &mut BytesMut, dx: i32, dy: i32) -> u8 {
    let (x, y) = (dx.unsigned_abs(), dy.unsigned_abs());
    let x_sign = (dx >= 0) as u8;
    let y_sign = (dy >= 0) as u8;
    let xy_sign = x_sign + 2 * y_sign;

    if dx == 0 && y < 1280 {
        buf.put_u8((y & 0xFF) as u8);
        ((y & 0xF00) >> 7) as u8 + y_sign
    } else if dy == 0 && x < 1280 {
        buf.put_u8((x & 0xFF) as u8);
        10 + ((x & 0xF00) >> 7) as u8 + x_sign
    } else if x < 65 && y < 65 {
        let (x, y) = (x - 1, y - 1);
        buf.put_u8((((x & 0xF) << 4) | (y & 0xF)) as u8);
        20 + (x & 0x30) as u8 + ((y & 0x30) >> 2) as u8 + xy_sign
    } else if x < 769 && y < 769 {
        let (x, y) = (x - 1, y - 1);
        buf.put_u8((x & 0xFF) as u8);
        buf.put_u8((y & 0xFF) as u8);
        84 + 12 * ((x & 0x300) >> 8) as u8 + ((y & 0x300) >> 6) as u8 + xy_sign
    } else if x < 4096 && y < 4096 {
        buf.put_u8((x >> 4) as u8);
        buf.put_u8((((x & 0xF) << 4) | (y >> 8)) as u8);
        buf.put_u8((y & 0xFF) as u8);
        120 + xy_sign
    } else {
        buf.put_u16(x as u16);
        buf.put_u16(y as u16);
        124 + xy_sign
    }
}

/// Reads the coordinate delta of a triplet with the given flag, ignoring the on-curve bit.
pub fn read_triplet(reader: &mut Reader, flag: u8) -> Result<(i32, i32), ReadError> {
    let flag = flag & !OFF_CURVE;
    let with_sign = |flag: u8, value: i32| if flag & 1 != 0 { value } else { -value };

    Ok(match flag {
        0..=9 => {
            let b0 = reader.u8()? as i32;
            (0, with_sign(flag, (((flag & 14) as i32) << 7) + b0))
        }
        10..=19 => {
            let b0 = reader.u8()? as i32;
            (with_sign(flag, ((((flag - 10) & 14) as i32) << 7) + b0), 0)
        }
        20..=83 => {
            let b0 = (flag - 20) as i32;
            let b1 = reader.u8()? as i32;
            (
                with_sign(flag, 1 + (b0 & 0x30) + (b1 >> 4)),
                with_sign(flag >> 1, 1 + ((b0 & 0x0C) << 2) + (b1 & 0x0F)),
            )
        }
        84..=119 => {
            let b0 = (flag - 84) as i32;
            let (b1, b2) = (reader.u8()? as i32, reader.u8()? as i32);
            (
                with_sign(flag, 1 + ((b0 / 12) << 8) + b1),
                with_sign(flag >> 1, 1 + (((b0 % 12) >> 2) << 8) + b2),
            )
        }
        120..=123 => {
            let (b1, b2, b3) = (reader.u8()? as i32, reader.u8()? as i32, reader.u8()? as i32);
            (
                with_sign(flag, (b1 << 4) + (b2 >> 4)),
                with_sign(flag >> 1, ((b2 & 0x0F) << 8) + b3),
            )
        }
        _ => (
            with_sign(flag, reader.u16()? as i32),
            with_sign(flag >> 1, reader.u16()? as i32),
        ),
    })
}

/// Streams of the transformed table, in the order they are stored.
#[derive(Debug, Default)]
struct Streams {
    n_contour: BytesMut,
    n_points: BytesMut,
    flag: BytesMut,
    glyph: BytesMut,
    composite: BytesMut,
    bbox: BytesMut,
    instruction: BytesMut,
}

impl Streams {
    fn all(&self) -> [&BytesMut; 7] {
        [
            &self.n_contour,
            &self.n_points,
            &self.flag,
            &self.glyph,
            &self.composite,
            &self.bbox,
            &self.instruction,
        ]
    }
}

/// Transforms the `glyf` table of a font.
///
/// Returns `None` if the font contains composite glyphs, which are stored with the null transform instead.
pub fn encode(font: &FontFile) -> Result<Option<Bytes>, ReadError> {
    let index_format = head::parse_index_to_loc_format(font.require(head::TAG)?)?;
    let glyph_data = font.glyph_data()?;
    let num_glyphs = glyph_data.len();

    if glyph_data
        .iter()
        .any(|data| data.len() >= 2 && i16::from_be_bytes([data[0], data[1]]) < 0)
    {
        return Ok(None);
    }

    let mut streams = Streams::default();
    let mut explicit_bounds = BytesMut::new();
    let mut bitmap = vec![0u8; 4 * ((num_glyphs + 31) / 32)];

    for (index, data) in glyph_data.into_iter().enumerate() {
        let glyph = glyf::decode_simple(data)?;

        streams.n_contour.put_i16(glyph.contours.len() as i16);

        if glyph.contours.is_empty() {
            continue;
        }

        let (mut last_x, mut last_y) = (0i32, 0i32);
        for contour in &glyph.contours {
            put_255_u16(&mut streams.n_points, contour.len() as u16);

            for point in contour {
                let (x, y) = (point.x as i32, point.y as i32);
                let flag = put_triplet(&mut streams.glyph, x - last_x, y - last_y);
                streams
                    .flag
                    .put_u8(if point.on_curve { flag } else { flag | OFF_CURVE });
                last_x = x;
                last_y = y;
            }
        }

        put_255_u16(&mut streams.glyph, glyph.instructions.len() as u16);
        streams.instruction.put_slice(&glyph.instructions);

        let computed = Bounds::of(glyph.contours.iter().flatten());
        if let Some(bounds) = glyph.bounds.filter(|bounds| Some(*bounds) != computed) {
            bitmap[index >> 3] |= 0x80 >> (index & 7);
            explicit_bounds.put_i16(bounds.x_min);
            explicit_bounds.put_i16(bounds.y_min);
            explicit_bounds.put_i16(bounds.x_max);
            explicit_bounds.put_i16(bounds.y_max);
        }
    }

    streams.bbox.put_slice(&bitmap);
    streams.bbox.put_slice(&explicit_bounds);

    let length = HEADER_SIZE + streams.all().iter().map(|s| s.len()).sum::<usize>();
    let mut buf = BytesMut::with_capacity(length);

    let reserved = 0;
    buf.put_u16(reserved);
    let option_flags = 0;
    buf.put_u16(option_flags);
    buf.put_u16(num_glyphs as u16);
    buf.put_u16(index_format as u16);
    for stream in streams.all() {
        buf.put_u32(stream.len() as u32);
    }
    for stream in streams.all() {
        buf.put_slice(stream);
    }

    assert_eq!(length, buf.len());

    log::debug!(
        "woff2: glyf transform {} -> {} bytes",
        font.require(glyf::TAG)?.len(),
        length
    );

    Ok(Some(buf.freeze()))
}

/// Reconstructs the `glyf` and `loca` tables from a transformed `glyf` table.
///
/// # Errors
///
/// Fails for truncated streams, composite glyphs, and offsets the declared `indexToLocFormat` cannot store.
pub fn decode(data: &[u8]) -> Result<(Bytes, Bytes), ReadError> {
    let mut header = Reader::new(data);
    let _reserved = header.u16()?;
    let option_flags = header.u16()?;
    let num_glyphs = header.u16()? as usize;
    let index_format = header.u16()? as i16;
    let sizes = (0..7)
        .map(|_| header.u32().map(|size| size as usize))
        .collect::<Result<Vec<usize>, ReadError>>()?;

    if option_flags & 1 != 0 {
        return Err(ReadError::Malformed("overlap bitmaps are not supported"));
    }

    let mut body = Reader::new(data);
    body.seek(HEADER_SIZE)?;
    let mut streams = sizes
        .into_iter()
        .map(|size| body.bytes(size).map(Reader::new))
        .collect::<Result<Vec<Reader>, ReadError>>()?
        .into_iter();

    // the length of the vector is fixed above
    let mut next = || streams.next().ok_or(ReadError::Malformed("missing stream"));
    let mut n_contour = next()?;
    let mut n_points = next()?;
    let mut flags = next()?;
    let mut glyphs = next()?;
    let composite = next()?;
    let mut bbox = next()?;
    let mut instructions = next()?;

    if composite.remaining() > 0 {
        return Err(ReadError::Malformed("composite glyphs are not supported"));
    }

    let bitmap = bbox.bytes(4 * ((num_glyphs + 31) / 32))?;
    let mut glyf = BytesMut::new();
    let mut offsets = Vec::with_capacity(num_glyphs + 1);

    for index in 0..num_glyphs {
        offsets.push(glyf.len() as u32);
        let number_of_contours = n_contour.i16()?;
        let explicit = bitmap[index >> 3] & (0x80 >> (index & 7)) != 0;

        if number_of_contours < 0 {
            return Err(ReadError::Malformed("composite glyphs are not supported"));
        }
        if number_of_contours == 0 {
            if explicit {
                return Err(ReadError::Malformed("empty glyph with bounding box"));
            }
            continue;
        }

        let mut contours: Vec<Contour> = Vec::with_capacity(number_of_contours as usize);
        let (mut x, mut y) = (0i32, 0i32);

        for _ in 0..number_of_contours {
            let count = read_255_u16(&mut n_points)?;
            let contour = (0..count)
                .map(|_| -> Result<Point, ReadError> {
                    let flag = flags.u8()?;
                    let (dx, dy) = read_triplet(&mut glyphs, flag)?;
                    x += dx;
                    y += dy;
                    Ok(Point {
                        x: x as i16,
                        y: y as i16,
                        on_curve: flag & OFF_CURVE == 0,
                    })
                })
                .collect::<Result<Contour, ReadError>>()?;
            contours.push(contour);
        }

        let instruction_length = read_255_u16(&mut glyphs)?;
        let mut glyph = SimpleGlyph::new(contours);
        glyph.instructions = instructions.bytes(instruction_length as usize)?.to_vec();

        if explicit {
            glyph.bounds = Some(Bounds {
                x_min: bbox.i16()?,
                y_min: bbox.i16()?,
                x_max: bbox.i16()?,
                y_max: bbox.i16()?,
            });
        }

        glyf::put_padded(&mut glyf, &glyf::encode_simple(&glyph));
    }

    offsets.push(glyf.len() as u32);

    if index_format == loca::SHORT_FORMAT && !loca::fits_short(&offsets) {
        return Err(ReadError::Malformed("glyf is too large for the short loca format"));
    }
    if index_format != loca::SHORT_FORMAT && index_format != loca::LONG_FORMAT {
        return Err(ReadError::Malformed("unknown indexToLocFormat"));
    }

    Ok((glyf.freeze(), loca::compile_with_format(&offsets, index_format)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ctx::Context;
    use crate::glyph::{Glyph, GlyphTable};
    use crate::sfnt;
    use rand::{thread_rng, Rng};

    fn triplet(dx: i32, dy: i32) -> (u8, Vec<u8>) {
        let mut buf = BytesMut::new();
        let flag = put_triplet(&mut buf, dx, dy);
        (flag, buf.to_vec())
    }

    #[test]
    fn test_triplet_vertical() {
        assert_eq!(triplet(0, 0), (1, vec![0]));
        assert_eq!(triplet(0, 1), (1, vec![1]));
        assert_eq!(triplet(0, -1), (0, vec![1]));
        assert_eq!(triplet(0, 300), (3, vec![44]));
        assert_eq!(triplet(0, -1279), (8, vec![0xFF]));
    }

    #[test]
    fn test_triplet_horizontal() {
        assert_eq!(triplet(1, 0), (11, vec![1]));
        assert_eq!(triplet(-256, 0), (12, vec![0]));
    }

    #[test]
    fn test_triplet_sizes() {
        assert_eq!(triplet(1, 1), (23, vec![0x00]));
        assert_eq!(triplet(-64, 64), (20 + 0x30 + 0x0C + 2, vec![0xFF]));
        assert_eq!(triplet(100, -100), (84 + 1, vec![99, 99]));
        assert_eq!(triplet(768, 768), (84 + 12 * 2 + 8 + 3, vec![0xFF, 0xFF]));
        assert_eq!(triplet(1000, 2000), (123, vec![0x3E, 0x87, 0xD0]));
        assert_eq!(triplet(-5000, 10), (124 + 2, vec![0x13, 0x88, 0x00, 0x0A]));
    }

    #[test]
    fn test_read_triplet() {
        let mut rng = thread_rng();
        for _ in 0..2000 {
            let dx = rng.gen_range(-65535..=65535);
            let dy = match rng.gen_range(0..4) {
                0 => 0,
                1 => rng.gen_range(-70..=70),
                2 => rng.gen_range(-1300..=1300),
                _ => rng.gen_range(-65535..=65535),
            };
            for (dx, dy) in [(dx, dy), (dy, dx), (dx % 65, dy % 65), (dx % 800, dy % 800)] {
                let (flag, bytes) = triplet(dx, dy);
                let mut reader = Reader::new(&bytes);
                assert_eq!(read_triplet(&mut reader, flag | OFF_CURVE).unwrap(), (dx, dy));
                assert_eq!(reader.remaining(), 0);
            }
        }
    }

    fn font(glyphs: Vec<Vec<Contour>>) -> Bytes {
        let glyphs = glyphs
            .into_iter()
            .enumerate()
            .map(|(index, contours)| Glyph {
                name: format!("g{}", index),
                code_point: char::from_u32(0xE600 + index as u32).unwrap(),
                contours,
                advance_width: 1000,
            })
            .collect();
        sfnt::compile_ttf(&GlyphTable::new(glyphs), &Context::default())
    }

    #[test]
    fn test_decode_reconstructs_tables() {
        let point = |x, y, on_curve| Point { x, y, on_curve };
        let ttf = font(vec![
            vec![vec![point(0, 0, true), point(500, 900, false), point(1000, 0, true)]],
            Vec::new(),
            vec![
                vec![point(-30000, -30000, true), point(30000, 30000, true), point(0, 5, true)],
                vec![point(1, 1, false), point(2, 2, true), point(3, 1, false)],
            ],
        ]);
        let font = FontFile::parse(&ttf).unwrap();
        let transformed = encode(&font).unwrap().unwrap();
        let (glyf, loca) = decode(&transformed).unwrap();

        assert_eq!(&glyf[..], font.require(glyf::TAG).unwrap());
        assert_eq!(&loca[..], font.require(loca::TAG).unwrap());
    }

    #[test]
    fn test_decode_keeps_explicit_bounds() {
        let contour = vec![
            Point { x: 0, y: 0, on_curve: true },
            Point { x: 10, y: 10, on_curve: true },
            Point { x: 20, y: 0, on_curve: true },
        ];
        let mut glyph = SimpleGlyph::new(vec![contour]);
        glyph.bounds = Some(Bounds {
            x_min: -5,
            y_min: -5,
            x_max: 25,
            y_max: 15,
        });

        let mut glyf = BytesMut::new();
        glyf::put_padded(&mut glyf, &glyf::encode_simple(&glyph));
        let offsets = [0, 0, glyf.len() as u32];
        let (loca, format) = loca::compile(&offsets);

        let mut streams = Streams::default();
        streams.n_contour.put_i16(0);
        streams.n_contour.put_i16(1);
        put_255_u16(&mut streams.n_points, 3);
        for (dx, dy) in [(0, 0), (10, 10), (10, -10)] {
            let flag = put_triplet(&mut streams.glyph, dx, dy);
            streams.flag.put_u8(flag);
        }
        put_255_u16(&mut streams.glyph, 0);
        streams.bbox.put_slice(&[0x40, 0, 0, 0]);
        for value in [-5i16, -5, 25, 15] {
            streams.bbox.put_i16(value);
        }

        let mut data = BytesMut::new();
        data.put_u32(0);
        data.put_u16(2);
        data.put_u16(format as u16);
        for stream in streams.all() {
            data.put_u32(stream.len() as u32);
        }
        for stream in streams.all() {
            data.put_slice(stream);
        }

        let (decoded_glyf, decoded_loca) = decode(&data).unwrap();
        assert_eq!(decoded_glyf, glyf.freeze());
        assert_eq!(decoded_loca, loca);
    }

    #[test]
    fn test_decode_rejects_truncated_streams() {
        let ttf = font(vec![vec![vec![
            Point { x: 0, y: 0, on_curve: true },
            Point { x: 100, y: 0, on_curve: true },
            Point { x: 0, y: 100, on_curve: true },
        ]]]);
        let transformed = encode(&FontFile::parse(&ttf).unwrap()).unwrap().unwrap();
        assert!(decode(&transformed[..transformed.len() - 1]).is_err());
        assert!(decode(&transformed[..20]).is_err());
    }
}
