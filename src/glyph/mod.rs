//! Assembly of glyphs from normalized SVG icons.
//!
//! Each icon is parsed with `usvg`, which resolves shapes, transforms, and styles into absolute paths.
//! Filled paths contribute their outline; stroked paths contribute the outline of their stroke.
//! The paths are scaled from the coordinate frame of the icon to font units so that the height of the frame equals the font height, flipped to the upward y axis of fonts, and converted to quadratic contours.
//!
//! [`assemble`] builds the [`GlyphTable`] of all icons and compiles it into a TrueType font.

pub mod outline;

use crate::ctx::Context;
use crate::data::{CharacterMap, IconRecord};
use crate::error::{Error, Result};
use crate::sfnt;
use crate::sfnt::tables::cmap;
use bytes::Bytes;
use outline::{CurvePoint, OutlineBuilder};
use rayon::prelude::*;
use thiserror::Error;
use usvg::tiny_skia_path::{self, PathSegment};

/// The maximal number of points in a glyph; point indices are 16 bit.
const MAX_POINTS: usize = u16::MAX as usize;

/// A reason an icon can not be encoded as a glyph.
#[derive(Debug, Error)]
pub enum GlyphError {
    /// The markup could not be interpreted as an SVG document.
    #[error("unusable SVG: {0}")]
    Svg(#[from] usvg::Error),
    /// The coordinate frame of the icon has no area.
    #[error("the view box {width}×{height} has no area")]
    EmptyFrame {
        /// The width of the frame.
        width: f32,
        /// The height of the frame.
        height: f32,
    },
    /// A coordinate is not a finite number.
    #[error("the outline contains a non-finite coordinate")]
    NonFinite,
    /// A coordinate exceeds the 16 bit range of TrueType coordinates.
    #[error("coordinate {0} exceeds the range of font units")]
    CoordinateOutOfRange(i64),
    /// The outline spans more font units than the deltas between its points can hold.
    #[error("the outline spans {0} font units, more than the {max} a glyph can hold", max = i16::MAX)]
    ExtentOutOfRange(i64),
    /// The outline has more points than a glyph can hold.
    #[error("{0} points exceed the limit of {max} points per glyph", max = MAX_POINTS)]
    TooManyPoints(usize),
    /// The outline has more contours than a glyph can hold.
    #[error("{0} contours exceed the limit of {max} contours per glyph", max = i16::MAX)]
    TooManyContours(usize),
    /// The font has more glyphs than glyph ids are available.
    #[error("{0} glyphs exceed the limit of {max} glyphs per font", max = u16::MAX)]
    TooManyGlyphs(usize),
    /// The advance width does not fit into 16 bits.
    #[error("advance width {0} exceeds the range of font units")]
    AdvanceOutOfRange(i64),
}

/// A point of a contour in font units.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct Point {
    /// The horizontal coordinate.
    pub x: i16,
    /// The vertical coordinate.
    pub y: i16,
    /// Whether the point lies on the outline or is a quadratic control point.
    pub on_curve: bool,
}

/// A closed sequence of points.
pub type Contour = Vec<Point>;

/// The bounding box of a glyph.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Default)]
pub struct Bounds {
    /// The minimal horizontal coordinate.
    pub x_min: i16,
    /// The minimal vertical coordinate.
    pub y_min: i16,
    /// The maximal horizontal coordinate.
    pub x_max: i16,
    /// The maximal vertical coordinate.
    pub y_max: i16,
}

impl Bounds {
    /// Returns the bounding box of all points, or `None` if there are no points.
    pub fn of<'a, I>(points: I) -> Option<Bounds>
    where
        I: IntoIterator<Item = &'a Point>,
    {
        points.into_iter().fold(None, |bounds, p| {
            Some(match bounds {
                None => Bounds {
                    x_min: p.x,
                    y_min: p.y,
                    x_max: p.x,
                    y_max: p.y,
                },
                Some(b) => Bounds {
                    x_min: b.x_min.min(p.x),
                    y_min: b.y_min.min(p.y),
                    x_max: b.x_max.max(p.x),
                    y_max: b.y_max.max(p.y),
                },
            })
        })
    }

    /// Returns the smallest bounding box containing both boxes.
    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            x_min: self.x_min.min(other.x_min),
            y_min: self.y_min.min(other.y_min),
            x_max: self.x_max.max(other.x_max),
            y_max: self.y_max.max(other.y_max),
        }
    }
}

/// The outline and metrics of one icon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Glyph {
    /// The name of the icon; written to the `post` table for traceability.
    pub name: String,
    /// The code point mapped to the glyph.
    pub code_point: char,
    /// The closed contours of the glyph.
    pub contours: Vec<Contour>,
    /// The horizontal advance.
    pub advance_width: u16,
}

impl Glyph {
    /// Returns the bounding box of the outline, or `None` for an empty glyph.
    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::of(self.contours.iter().flatten())
    }

    /// Returns the number of points over all contours.
    pub fn point_count(&self) -> usize {
        self.contours.iter().map(Vec::len).sum()
    }
}

/// The glyphs of a font in code point order.
///
/// Glyph ids start at 1; glyph 0 is the implicit `.notdef` glyph.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GlyphTable {
    glyphs: Vec<Glyph>,
}

impl GlyphTable {
    /// Creates a table from glyphs in the order of their code points.
    pub fn new(glyphs: Vec<Glyph>) -> Self {
        GlyphTable { glyphs }
    }

    /// Returns the glyphs, excluding `.notdef`.
    pub fn glyphs(&self) -> &[Glyph] {
        &self.glyphs
    }

    /// Returns the number of glyphs, excluding `.notdef`.
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    /// Returns whether there are no glyphs besides `.notdef`.
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Returns the glyph mapped to the given code point.
    pub fn get(&self, code_point: char) -> Option<&Glyph> {
        self.glyphs.iter().find(|glyph| glyph.code_point == code_point)
    }

    /// Returns the character map of the table.
    pub fn character_map(&self) -> CharacterMap {
        self.glyphs
            .iter()
            .enumerate()
            .map(|(index, glyph)| (glyph.code_point, index as u32 + 1))
            .collect()
    }
}

/// Builds the glyph table of the given records and compiles it into a TrueType font.
///
/// Outlines are extracted in parallel; the glyph order equals the record order.
///
/// # Errors
///
/// - [`Error::GlyphAssembly`] for the first record whose outline can not be encoded.
/// - [`Error::InvalidOption`] if the configured `cmap` encoding records leave a code point unmapped.
///
/// No font is produced in either case.
pub fn assemble(records: &[IconRecord], ctx: &Context) -> Result<(GlyphTable, Bytes)> {
    log::info!("assembling {} glyphs", records.len());

    let glyphs = records
        .par_iter()
        .map(|record| {
            outline(record, ctx).map_err(|source| Error::GlyphAssembly {
                name: record.name.clone(),
                source,
            })
        })
        .collect::<Result<Vec<Glyph>>>()?;

    // glyph 0 is `.notdef`
    if glyphs.len() >= u16::MAX as usize {
        let name = records[u16::MAX as usize - 1].name.clone();
        return Err(Error::GlyphAssembly {
            name,
            source: GlyphError::TooManyGlyphs(glyphs.len() + 1),
        });
    }

    let table = GlyphTable::new(glyphs);

    let map = table.character_map();
    if let Some(c) = cmap::first_unmapped(&map, cmap::encoding_records(&map, ctx)) {
        return Err(Error::InvalidOption {
            key: "cmapEncodingRecords",
            reason: format!("U+{:04X} is not mapped by any record; add a format 12 record", c as u32),
        });
    }

    let font = sfnt::compile_ttf(&table, ctx);

    Ok((table, font))
}

/// Extracts the glyph of a single record.
pub fn outline(record: &IconRecord, ctx: &Context) -> std::result::Result<Glyph, GlyphError> {
    let tree = usvg::Tree::from_str(&record.content, &usvg::Options::default())?;
    let size = tree.size();
    let (width, height) = (size.width() as f64, size.height() as f64);

    if !(width > 0.0 && height > 0.0) {
        return Err(GlyphError::EmptyFrame {
            width: size.width(),
            height: size.height(),
        });
    }

    let scale = ctx.font_height as f64 / height;
    let descent = ctx.descent as f64;
    let mut builder = OutlineBuilder::new();
    let mut even_odd = false;

    collect_group(tree.root(), scale, &mut |path, fill_rule| {
        even_odd |= fill_rule == usvg::FillRule::EvenOdd;
        draw(path, &mut builder, |x, y| {
            (x as f64 * scale, (height - y as f64) * scale - descent)
        });
    });

    if even_odd {
        log::warn!(
            "'{}' uses the even-odd fill rule; fonts fill with the non-zero rule",
            record.name
        );
    }

    let drawn = builder.finish();
    let drawn_count = drawn.len();
    let mut contours = round_contours(drawn)?;
    let raw_advance = if ctx.fixed_width {
        ctx.font_height as i64
    } else {
        (width * scale).round() as i64
    };
    let advance_width =
        u16::try_from(raw_advance).map_err(|_| GlyphError::AdvanceOutOfRange(raw_advance))?;

    if ctx.center_horizontally {
        if let Some(bounds) = Bounds::of(contours.iter().flatten()) {
            let extent = bounds.x_max as i64 - bounds.x_min as i64;
            let shift = (advance_width as i64 - extent) / 2 - bounds.x_min as i64;
            contours = shift_contours(contours, shift)?;
        }
    }

    let glyph = Glyph {
        name: record.name.clone(),
        code_point: record.code_point,
        contours,
        advance_width,
    };

    if glyph.contours.len() > i16::MAX as usize {
        return Err(GlyphError::TooManyContours(glyph.contours.len()));
    }
    if glyph.point_count() > MAX_POINTS {
        return Err(GlyphError::TooManyPoints(glyph.point_count()));
    }
    if let Some(bounds) = glyph.bounds() {
        let extent = (bounds.x_max as i64 - bounds.x_min as i64).max(bounds.y_max as i64 - bounds.y_min as i64);
        if extent > i16::MAX as i64 {
            return Err(GlyphError::ExtentOutOfRange(extent));
        }
    }
    if glyph.contours.is_empty() && drawn_count > 0 {
        log::warn!(
            "all {} contours of '{}' collapse when rounded to font units; its glyph is empty",
            drawn_count,
            record.name
        );
    } else if glyph.contours.is_empty() {
        log::warn!("'{}' has no visible outline; its glyph is empty", record.name);
    }

    log::debug!(
        "glyph '{}' U+{:04X}: {} contours, {} points, advance {}",
        glyph.name,
        glyph.code_point as u32,
        glyph.contours.len(),
        glyph.point_count(),
        glyph.advance_width
    );

    Ok(glyph)
}

/// Visits every visible filled or stroked path in absolute coordinates.
fn collect_group<F>(group: &usvg::Group, scale: f64, visit: &mut F)
where
    F: FnMut(&tiny_skia_path::Path, usvg::FillRule),
{
    for node in group.children() {
        match node {
            usvg::Node::Group(group) => collect_group(group, scale, visit),
            usvg::Node::Path(path) => {
                if !path.is_visible() {
                    continue;
                }

                let transform = path.abs_transform();

                if let Some(fill) = path.fill() {
                    if let Some(data) = path.data().clone().transform(transform) {
                        visit(&data, fill.rule());
                    }
                }

                if let Some(stroke) = path.stroke() {
                    // outline the stroke in local coordinates so that scaling transforms scale its width
                    let outlined = path
                        .data()
                        .stroke(&stroke.to_tiny_skia(), scale.max(1.0) as f32)
                        .and_then(|data| data.transform(transform));
                    if let Some(data) = outlined {
                        visit(&data, usvg::FillRule::NonZero);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Feeds the segments of a path into the builder, mapping each point to font space.
fn draw<F>(path: &tiny_skia_path::Path, builder: &mut OutlineBuilder, map: F)
where
    F: Fn(f32, f32) -> (f64, f64),
{
    for segment in path.segments() {
        match segment {
            PathSegment::MoveTo(p) => {
                let (x, y) = map(p.x, p.y);
                builder.move_to(x, y);
            }
            PathSegment::LineTo(p) => {
                let (x, y) = map(p.x, p.y);
                builder.line_to(x, y);
            }
            PathSegment::QuadTo(c, p) => {
                let (cx, cy) = map(c.x, c.y);
                let (x, y) = map(p.x, p.y);
                builder.quad_to(cx, cy, x, y);
            }
            PathSegment::CubicTo(c1, c2, p) => {
                let (c1x, c1y) = map(c1.x, c1.y);
                let (c2x, c2y) = map(c2.x, c2.y);
                let (x, y) = map(p.x, p.y);
                builder.cubic_to(c1x, c1y, c2x, c2y, x, y);
            }
            PathSegment::Close => builder.close(),
        }
    }
    builder.close();
}

/// Rounds contours to font units and drops degenerate ones.
///
/// The point order is kept: a contour drawn clockwise on screen stays clockwise after the y axis is flipped, which is the direction TrueType expects for outer contours.
fn round_contours(contours: Vec<Vec<CurvePoint>>) -> std::result::Result<Vec<Contour>, GlyphError> {
    let mut rounded = Vec::with_capacity(contours.len());

    for contour in contours {
        let mut points: Contour = Vec::with_capacity(contour.len());

        for point in &contour {
            let point = Point {
                x: to_font_unit(point.x)?,
                y: to_font_unit(point.y)?,
                on_curve: point.on_curve,
            };

            // consecutive on-curve duplicates collapse after rounding
            match points.last() {
                Some(last) if last.on_curve && point.on_curve && last.x == point.x && last.y == point.y => {}
                _ => points.push(point),
            }
        }

        while points.len() > 1 {
            let first = points[0];
            match points.last() {
                Some(&last) if last == first && last.on_curve => {
                    points.pop();
                }
                _ => break,
            }
        }

        let on_curve_points = points.iter().filter(|p| p.on_curve).count();
        let distinct = points
            .iter()
            .any(|p| p.x != points[0].x || p.y != points[0].y);

        if on_curve_points == 0 || points.len() < 3 || !distinct {
            log::trace!("dropping degenerate contour of {} points", points.len());
            continue;
        }

        rounded.push(points);
    }

    Ok(rounded)
}

fn to_font_unit(value: f64) -> std::result::Result<i16, GlyphError> {
    if !value.is_finite() {
        return Err(GlyphError::NonFinite);
    }

    let rounded = value.round() as i64;
    i16::try_from(rounded).map_err(|_| GlyphError::CoordinateOutOfRange(rounded))
}

fn shift_contours(contours: Vec<Contour>, shift: i64) -> std::result::Result<Vec<Contour>, GlyphError> {
    contours
        .into_iter()
        .map(|contour| {
            contour
                .into_iter()
                .map(|p| {
                    let x = p.x as i64 + shift;
                    let x = i16::try_from(x).map_err(|_| GlyphError::CoordinateOutOfRange(x))?;
                    Ok(Point { x, ..p })
                })
                .collect()
        })
        .collect()
}
