//! The tables of a TrueType font.
//!
//! Each module compiles one table from the [`GlyphTable`] and the [`Context`].
//! Values shared by several tables, such as the font bounding box or the horizontal metrics, are computed once by [`FontMetrics::measure`].
//!
//! Glyph 0 is always `.notdef`: an empty glyph with an advance of one em.

pub mod cmap;
pub mod glyf;
pub mod head;
pub mod hhea;
pub mod hmtx;
pub mod loca;
pub mod maxp;
pub mod name;
pub mod os2;
pub mod post;

use crate::ctx::Context;
use crate::glyph::{Bounds, GlyphTable};

/// The advance width and left side bearing of a glyph.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct HorizontalMetric {
    /// The horizontal advance.
    pub advance_width: u16,
    /// The distance from the origin to the left edge of the outline.
    pub left_side_bearing: i16,
}

/// Aggregated metrics of all glyphs, including `.notdef`.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct FontMetrics {
    /// The number of glyphs including `.notdef`.
    pub num_glyphs: u16,
    /// The union of all glyph bounding boxes; zero if all glyphs are empty.
    pub bounds: Bounds,
    /// The horizontal metrics in glyph id order.
    pub horizontal: Vec<HorizontalMetric>,
    /// The number of leading metrics stored with their advance width in `hmtx`.
    pub number_of_h_metrics: u16,
    /// The maximal advance width.
    pub advance_width_max: u16,
    /// The minimal left side bearing of non-empty glyphs.
    pub min_left_side_bearing: i16,
    /// The minimal right side bearing of non-empty glyphs.
    pub min_right_side_bearing: i16,
    /// The maximal horizontal extent of non-empty glyphs.
    pub x_max_extent: i16,
    /// The average advance width of glyphs with a non-zero advance.
    pub average_advance: i16,
    /// The maximal number of points of a glyph.
    pub max_points: u16,
    /// The maximal number of contours of a glyph.
    pub max_contours: u16,
}

impl FontMetrics {
    /// Measures the glyphs of a table.
    pub fn measure(table: &GlyphTable, ctx: &Context) -> FontMetrics {
        let notdef = (ctx.font_height, None, 0usize, 0usize);
        let glyphs = std::iter::once(notdef).chain(table.glyphs().iter().map(|glyph| {
            (
                glyph.advance_width,
                glyph.bounds(),
                glyph.point_count(),
                glyph.contours.len(),
            )
        }));

        let mut horizontal = Vec::with_capacity(table.len() + 1);
        let mut bounds: Option<Bounds> = None;
        let mut min_left_side_bearing = i32::MAX;
        let mut min_right_side_bearing = i32::MAX;
        let mut x_max_extent = i32::MIN;
        let mut max_points = 0;
        let mut max_contours = 0;

        for (advance_width, glyph_bounds, points, contours) in glyphs {
            let left_side_bearing = glyph_bounds.map_or(0, |b| b.x_min);
            horizontal.push(HorizontalMetric {
                advance_width,
                left_side_bearing,
            });

            if let Some(b) = glyph_bounds {
                bounds = Some(bounds.map_or(b, |bounds| bounds.union(&b)));
                min_left_side_bearing = min_left_side_bearing.min(b.x_min as i32);
                min_right_side_bearing = min_right_side_bearing.min(advance_width as i32 - b.x_max as i32);
                x_max_extent = x_max_extent.max(b.x_max as i32);
            }

            max_points = max_points.max(points);
            max_contours = max_contours.max(contours);
        }

        let advances: Vec<u32> = horizontal
            .iter()
            .map(|m| m.advance_width as u32)
            .filter(|&advance| advance > 0)
            .collect();
        let average_advance = if advances.is_empty() {
            0
        } else {
            let sum: u32 = advances.iter().sum();
            ((sum as f64) / (advances.len() as f64)).round() as i32
        };

        // trailing glyphs sharing the last advance width store only their side bearing
        let number_of_h_metrics = match horizontal.last() {
            Some(last) => {
                let shared = horizontal
                    .iter()
                    .rev()
                    .take_while(|m| m.advance_width == last.advance_width)
                    .count();
                horizontal.len() - shared + 1
            }
            None => 0,
        };

        let non_empty = bounds.is_some();

        FontMetrics {
            num_glyphs: horizontal.len() as u16,
            bounds: bounds.unwrap_or_default(),
            advance_width_max: horizontal.iter().map(|m| m.advance_width).max().unwrap_or(0),
            horizontal,
            number_of_h_metrics: number_of_h_metrics as u16,
            min_left_side_bearing: if non_empty { clamp_i16(min_left_side_bearing) } else { 0 },
            min_right_side_bearing: if non_empty { clamp_i16(min_right_side_bearing) } else { 0 },
            x_max_extent: if non_empty { clamp_i16(x_max_extent) } else { 0 },
            average_advance: clamp_i16(average_advance),
            max_points: max_points.min(u16::MAX as usize) as u16,
            max_contours: max_contours.min(u16::MAX as usize) as u16,
        }
    }
}

fn clamp_i16(value: i32) -> i16 {
    value.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyph::{Glyph, Point};

    fn square(code_point: char, x: i16, size: i16, advance_width: u16) -> Glyph {
        let point = |x, y| Point {
            x,
            y,
            on_curve: true,
        };
        Glyph {
            name: format!("{:X}", code_point as u32),
            code_point,
            contours: vec![vec![
                point(x, 0),
                point(x, size),
                point(x + size, size),
                point(x + size, 0),
            ]],
            advance_width,
        }
    }

    #[test]
    fn test_measure() {
        let table = GlyphTable::new(vec![
            square('\u{E600}', 100, 800, 1000),
            square('\u{E601}', -50, 500, 600),
        ]);
        let metrics = FontMetrics::measure(&table, &Context::default());

        assert_eq!(metrics.num_glyphs, 3);
        assert_eq!(
            metrics.bounds,
            Bounds {
                x_min: -50,
                y_min: 0,
                x_max: 900,
                y_max: 800
            }
        );
        assert_eq!(metrics.horizontal[0].left_side_bearing, 0);
        assert_eq!(metrics.horizontal[2].left_side_bearing, -50);
        assert_eq!(metrics.advance_width_max, 1000);
        assert_eq!(metrics.min_left_side_bearing, -50);
        // 600 - 450 and 1000 - 900
        assert_eq!(metrics.min_right_side_bearing, 100);
        assert_eq!(metrics.x_max_extent, 900);
        assert_eq!(metrics.average_advance, 867);
        assert_eq!(metrics.max_points, 4);
        assert_eq!(metrics.max_contours, 1);
        assert_eq!(metrics.number_of_h_metrics, 3);
    }

    #[test]
    fn test_measure_shared_advances() {
        let table = GlyphTable::new(vec![
            square('\u{E600}', 0, 10, 1000),
            square('\u{E601}', 0, 10, 1000),
        ]);
        let metrics = FontMetrics::measure(&table, &Context::default());
        // `.notdef` and both glyphs advance by one em
        assert_eq!(metrics.number_of_h_metrics, 1);
    }

    #[test]
    fn test_measure_empty_glyphs() {
        let table = GlyphTable::new(vec![Glyph {
            name: "blank".to_string(),
            code_point: '\u{E600}',
            contours: Vec::new(),
            advance_width: 500,
        }]);
        let metrics = FontMetrics::measure(&table, &Context::default());
        assert_eq!(metrics.bounds, Bounds::default());
        assert_eq!(metrics.min_left_side_bearing, 0);
        assert_eq!(metrics.x_max_extent, 0);
        assert_eq!(metrics.number_of_h_metrics, 2);
    }
}
