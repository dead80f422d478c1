//! Conversion of path segments into quadratic contours.
//!
//! TrueType outlines consist of lines and quadratic Bézier curves only.
//! Cubic curves are therefore split into quadratic curves until the approximation error falls below [`TOLERANCE`].

/// The maximal deviation of an approximated curve, in font units.
pub const TOLERANCE: f64 = 1.0;
/// The maximal number of quadratic curves a single cubic curve is split into.
const MAX_SPLITS: usize = 32;

/// A point in font units before rounding.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct CurvePoint {
    /// The horizontal coordinate.
    pub x: f64,
    /// The vertical coordinate.
    pub y: f64,
    /// Whether the point lies on the outline or is a control point.
    pub on_curve: bool,
}

impl CurvePoint {
    fn on(x: f64, y: f64) -> Self {
        CurvePoint { x, y, on_curve: true }
    }

    fn off(x: f64, y: f64) -> Self {
        CurvePoint {
            x,
            y,
            on_curve: false,
        }
    }
}

/// Collects closed contours from a sequence of drawing commands.
///
/// Every contour is implicitly closed: a `move_to` or `close` ends the current contour.
#[derive(Debug, Default)]
pub struct OutlineBuilder {
    contours: Vec<Vec<CurvePoint>>,
    current: Vec<CurvePoint>,
}

impl OutlineBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new contour at the given point.
    pub fn move_to(&mut self, x: f64, y: f64) {
        self.close();
        self.current.push(CurvePoint::on(x, y));
    }

    /// Adds a line to the given point.
    pub fn line_to(&mut self, x: f64, y: f64) {
        self.ensure_started(x, y);
        self.current.push(CurvePoint::on(x, y));
    }

    /// Adds a quadratic curve with control point `(cx, cy)` ending at `(x, y)`.
    pub fn quad_to(&mut self, cx: f64, cy: f64, x: f64, y: f64) {
        self.ensure_started(cx, cy);
        self.current.push(CurvePoint::off(cx, cy));
        self.current.push(CurvePoint::on(x, y));
    }

    /// Adds a cubic curve, approximated by quadratic curves.
    pub fn cubic_to(&mut self, c1x: f64, c1y: f64, c2x: f64, c2y: f64, x: f64, y: f64) {
        self.ensure_started(c1x, c1y);

        let start = match self.current.last() {
            Some(point) => (point.x, point.y),
            None => return,
        };
        let cubic = Cubic {
            p0: start,
            p1: (c1x, c1y),
            p2: (c2x, c2y),
            p3: (x, y),
        };
        let splits = cubic.splits_needed(TOLERANCE);

        for i in 0..splits {
            let t0 = i as f64 / splits as f64;
            let t1 = (i + 1) as f64 / splits as f64;
            let (control, end) = cubic.segment(t0, t1).quadratic();
            self.current.push(CurvePoint::off(control.0, control.1));
            self.current.push(CurvePoint::on(end.0, end.1));
        }
    }

    /// Ends the current contour.
    pub fn close(&mut self) {
        if self.current.is_empty() {
            return;
        }

        let mut contour = std::mem::take(&mut self.current);

        // the closing line back to the start is implicit
        if contour.len() > 1 {
            let first = contour[0];
            if contour.last() == Some(&first) {
                contour.pop();
            }
        }

        self.contours.push(contour);
    }

    /// Returns all contours, closing the current one.
    pub fn finish(mut self) -> Vec<Vec<CurvePoint>> {
        self.close();
        self.contours
    }

    fn ensure_started(&mut self, x: f64, y: f64) {
        if self.current.is_empty() {
            // drawing without a preceding `move_to` starts where the last contour started
            let start = self
                .contours
                .last()
                .and_then(|contour| contour.first().copied())
                .unwrap_or_else(|| CurvePoint::on(x, y));
            self.current.push(start);
        }
    }
}

type Vector = (f64, f64);

#[derive(Debug, Clone, Copy)]
struct Cubic {
    p0: Vector,
    p1: Vector,
    p2: Vector,
    p3: Vector,
}

impl Cubic {
    fn at(&self, t: f64) -> Vector {
        let mt = 1.0 - t;
        let a = mt * mt * mt;
        let b = 3.0 * mt * mt * t;
        let c = 3.0 * mt * t * t;
        let d = t * t * t;
        (
            a * self.p0.0 + b * self.p1.0 + c * self.p2.0 + d * self.p3.0,
            a * self.p0.1 + b * self.p1.1 + c * self.p2.1 + d * self.p3.1,
        )
    }

    fn derivative(&self, t: f64) -> Vector {
        let mt = 1.0 - t;
        let a = 3.0 * mt * mt;
        let b = 6.0 * mt * t;
        let c = 3.0 * t * t;
        (
            a * (self.p1.0 - self.p0.0) + b * (self.p2.0 - self.p1.0) + c * (self.p3.0 - self.p2.0),
            a * (self.p1.1 - self.p0.1) + b * (self.p2.1 - self.p1.1) + c * (self.p3.1 - self.p2.1),
        )
    }

    /// Returns the part of the curve between `t0` and `t1` as a cubic curve of its own.
    fn segment(&self, t0: f64, t1: f64) -> Cubic {
        let scale = (t1 - t0) / 3.0;
        let p0 = self.at(t0);
        let p3 = self.at(t1);
        let d0 = self.derivative(t0);
        let d1 = self.derivative(t1);
        Cubic {
            p0,
            p1: (p0.0 + d0.0 * scale, p0.1 + d0.1 * scale),
            p2: (p3.0 - d1.0 * scale, p3.1 - d1.1 * scale),
            p3,
        }
    }

    /// Returns the control point and end point of the closest single quadratic curve.
    fn quadratic(&self) -> (Vector, Vector) {
        let control = (
            (3.0 * (self.p1.0 + self.p2.0) - self.p0.0 - self.p3.0) / 4.0,
            (3.0 * (self.p1.1 + self.p2.1) - self.p0.1 - self.p3.1) / 4.0,
        );
        (control, self.p3)
    }

    /// Returns the number of quadratic curves needed to stay within `tolerance`.
    ///
    /// The error of approximating a cubic curve by one quadratic curve is bounded by `√3 / 36 · |p3 − 3·p2 + 3·p1 − p0|` and shrinks with the cube of the number of splits.
    fn splits_needed(&self, tolerance: f64) -> usize {
        let dx = self.p3.0 - 3.0 * self.p2.0 + 3.0 * self.p1.0 - self.p0.0;
        let dy = self.p3.1 - 3.0 * self.p2.1 + 3.0 * self.p1.1 - self.p0.1;
        let error = 3f64.sqrt() / 36.0 * (dx * dx + dy * dy).sqrt();

        if !error.is_finite() || error <= tolerance {
            return 1;
        }

        ((error / tolerance).cbrt().ceil() as usize).clamp(1, MAX_SPLITS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines() {
        let mut builder = OutlineBuilder::new();
        builder.move_to(0.0, 0.0);
        builder.line_to(10.0, 0.0);
        builder.line_to(10.0, 10.0);
        builder.line_to(0.0, 0.0);
        builder.close();

        let contours = builder.finish();
        assert_eq!(contours.len(), 1);
        // the explicit closing point is dropped
        assert_eq!(contours[0].len(), 3);
        assert!(contours[0].iter().all(|p| p.on_curve));
    }

    #[test]
    fn test_implicit_close_on_move() {
        let mut builder = OutlineBuilder::new();
        builder.move_to(0.0, 0.0);
        builder.line_to(1.0, 0.0);
        builder.line_to(1.0, 1.0);
        builder.move_to(5.0, 5.0);
        builder.line_to(6.0, 5.0);
        builder.line_to(6.0, 6.0);

        let contours = builder.finish();
        assert_eq!(contours.len(), 2);
        assert_eq!(contours[1][0], CurvePoint::on(5.0, 5.0));
    }

    #[test]
    fn test_quad() {
        let mut builder = OutlineBuilder::new();
        builder.move_to(0.0, 0.0);
        builder.quad_to(5.0, 10.0, 10.0, 0.0);
        let contours = builder.finish();
        assert_eq!(
            contours[0],
            vec![
                CurvePoint::on(0.0, 0.0),
                CurvePoint::off(5.0, 10.0),
                CurvePoint::on(10.0, 0.0)
            ]
        );
    }

    #[test]
    fn test_flat_cubic_is_one_quad() {
        let mut builder = OutlineBuilder::new();
        builder.move_to(0.0, 0.0);
        builder.cubic_to(10.0, 0.0, 20.0, 0.0, 30.0, 0.0);
        let contours = builder.finish();
        assert_eq!(contours[0].len(), 3);
        assert_eq!(contours[0][2], CurvePoint::on(30.0, 0.0));
    }

    #[test]
    fn test_cubic_within_tolerance() {
        let cubic = Cubic {
            p0: (0.0, 0.0),
            p1: (0.0, 552.0),
            p2: (448.0, 1000.0),
            p3: (1000.0, 1000.0),
        };
        let splits = cubic.splits_needed(TOLERANCE);
        assert!(splits > 1);

        for i in 0..splits {
            let t0 = i as f64 / splits as f64;
            let t1 = (i + 1) as f64 / splits as f64;
            let part = cubic.segment(t0, t1);
            let (control, end) = part.quadratic();

            for step in 0..=8 {
                let t = step as f64 / 8.0;
                let mt = 1.0 - t;
                let on_cubic = part.at(t);
                let on_quad = (
                    mt * mt * part.p0.0 + 2.0 * mt * t * control.0 + t * t * end.0,
                    mt * mt * part.p0.1 + 2.0 * mt * t * control.1 + t * t * end.1,
                );
                let distance = ((on_cubic.0 - on_quad.0).powi(2)
                    + (on_cubic.1 - on_quad.1).powi(2))
                .sqrt();
                assert!(distance <= TOLERANCE, "deviation {} at split {}", distance, i);
            }
        }
    }

    #[test]
    fn test_segment_endpoints() {
        let cubic = Cubic {
            p0: (0.0, 0.0),
            p1: (10.0, 40.0),
            p2: (60.0, 40.0),
            p3: (80.0, 0.0),
        };
        let part = cubic.segment(0.25, 0.75);
        let start = cubic.at(0.25);
        let end = cubic.at(0.75);
        assert!((part.p0.0 - start.0).abs() < 1e-9 && (part.p0.1 - start.1).abs() < 1e-9);
        assert!((part.p3.0 - end.0).abs() < 1e-9 && (part.p3.1 - end.1).abs() < 1e-9);
    }
}
