// Path construction for GDI shapes
//
// Everything is built in logical coordinates; the caller supplies the
// logical-to-device transform when filling or stroking.

use std::f64::consts::FRAC_PI_2;

use tiny_skia::{Path, PathBuilder};

use crate::wmf::geometry::{Point, Rect};
use crate::wmf::target::angle_to_radians;

/// Cubic approximation constant for a quarter ellipse.
const KAPPA: f32 = 0.552_284_8;

/// How an elliptical arc is closed off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArcClose {
    Open,
    /// Back to the center (pie)
    Pie,
    /// Straight back to the start (chord)
    Chord,
}

#[inline]
fn pt(p: Point) -> (f32, f32) {
    (p.x as f32, p.y as f32)
}

pub fn rect(r: Rect) -> Option<Path> {
    let r = r.normalized();
    let (l, t) = (r.left as f32, r.top as f32);
    let (w, h) = (r.width as f32, r.height as f32);
    tiny_skia::Rect::from_xywh(l, t, w, h).map(PathBuilder::from_rect)
}

/// Rounded rectangle; `x_round`/`y_round` are percentages of the half extents.
pub fn round_rect(r: Rect, x_round: i32, y_round: i32) -> Option<Path> {
    let r = r.normalized();
    let rx = r.width as f32 / 2.0 * (x_round.clamp(0, 100) as f32 / 100.0);
    let ry = r.height as f32 / 2.0 * (y_round.clamp(0, 100) as f32 / 100.0);
    if rx <= 0.0 || ry <= 0.0 {
        return rect(r);
    }
    let (l, t) = (r.left as f32, r.top as f32);
    let (rr, b) = (r.right() as f32, r.bottom() as f32);
    let (kx, ky) = (rx * KAPPA, ry * KAPPA);

    let mut pb = PathBuilder::new();
    pb.move_to(l + rx, t);
    pb.line_to(rr - rx, t);
    pb.cubic_to(rr - rx + kx, t, rr, t + ry - ky, rr, t + ry);
    pb.line_to(rr, b - ry);
    pb.cubic_to(rr, b - ry + ky, rr - rx + kx, b, rr - rx, b);
    pb.line_to(l + rx, b);
    pb.cubic_to(l + rx - kx, b, l, b - ry + ky, l, b - ry);
    pb.line_to(l, t + ry);
    pb.cubic_to(l, t + ry - ky, l + rx - kx, t, l + rx, t);
    pb.close();
    pb.finish()
}

pub fn ellipse(r: Rect) -> Option<Path> {
    let r = r.normalized();
    let oval = tiny_skia::Rect::from_xywh(
        r.left as f32,
        r.top as f32,
        r.width as f32,
        r.height as f32,
    )?;
    PathBuilder::from_oval(oval)
}

/// Elliptical arc of `sweep` 1/16 degrees starting at `start`,
/// counter-clockwise on screen.
pub fn arc(r: Rect, start: i32, sweep: i32, close: ArcClose) -> Option<Path> {
    let r = r.normalized();
    let rx = f64::from(r.width) / 2.0;
    let ry = f64::from(r.height) / 2.0;
    let cx = f64::from(r.left) + rx;
    let cy = f64::from(r.top) + ry;
    let at = |a: f64| ((cx + rx * a.cos()) as f32, (cy - ry * a.sin()) as f32);
    // derivative of `at` with respect to the angle
    let tangent = |a: f64| (-rx * a.sin(), -ry * a.cos());

    let a0 = angle_to_radians(start);
    let total = angle_to_radians(sweep);
    let segments = (total.abs() / FRAC_PI_2).ceil().max(1.0) as usize;
    let step = total / segments as f64;
    let k = 4.0 / 3.0 * (step / 4.0).tan();

    let mut pb = PathBuilder::new();
    let (sx, sy) = at(a0);
    if close == ArcClose::Pie {
        pb.move_to(cx as f32, cy as f32);
        pb.line_to(sx, sy);
    } else {
        pb.move_to(sx, sy);
    }
    for i in 0..segments {
        let a = a0 + step * i as f64;
        let b = a + step;
        let (x0, y0) = at(a);
        let (x3, y3) = at(b);
        let (dx0, dy0) = tangent(a);
        let (dx3, dy3) = tangent(b);
        pb.cubic_to(
            x0 + (k * dx0) as f32,
            y0 + (k * dy0) as f32,
            x3 - (k * dx3) as f32,
            y3 - (k * dy3) as f32,
            x3,
            y3,
        );
    }
    if close != ArcClose::Open {
        pb.close();
    }
    pb.finish()
}

pub fn polyline(points: &[Point], closed: bool) -> Option<Path> {
    let (first, rest) = points.split_first()?;
    let mut pb = PathBuilder::new();
    let (x, y) = pt(*first);
    pb.move_to(x, y);
    for p in rest {
        let (x, y) = pt(*p);
        pb.line_to(x, y);
    }
    if closed {
        pb.close();
    }
    pb.finish()
}

/// All contours in one path, each closed.
pub fn poly_polygon(polygons: &[Vec<Point>]) -> Option<Path> {
    let mut pb = PathBuilder::new();
    for polygon in polygons {
        let Some((first, rest)) = polygon.split_first() else {
            continue;
        };
        let (x, y) = pt(*first);
        pb.move_to(x, y);
        for p in rest {
            let (x, y) = pt(*p);
            pb.line_to(x, y);
        }
        pb.close();
    }
    pb.finish()
}

/// Path covering every rectangle of a clip region.
pub fn region(rects: &[Rect]) -> Option<Path> {
    let mut pb = PathBuilder::new();
    for r in rects {
        if let Some(r) = tiny_skia::Rect::from_xywh(
            r.left as f32,
            r.top as f32,
            r.width as f32,
            r.height as f32,
        ) {
            pb.push_rect(r);
        }
    }
    pb.finish()
}

/// A segment between two points; a zero-length segment becomes a dot.
pub fn segment(from: Point, to: Point) -> Option<Path> {
    let mut pb = PathBuilder::new();
    let (x0, y0) = pt(from);
    let (x1, y1) = pt(to);
    pb.move_to(x0, y0);
    if from == to {
        pb.line_to(x1 + 0.5, y1);
    } else {
        pb.line_to(x1, y1);
    }
    pb.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degenerate_shapes() {
        assert!(rect(Rect::new(0, 0, 0, 10)).is_none());
        assert!(polyline(&[], false).is_none());
        assert!(poly_polygon(&[vec![], vec![]]).is_none());
    }

    #[test]
    fn test_arc_bounds() {
        let path = arc(Rect::new(0, 0, 100, 100), 0, 90 * 16, ArcClose::Open).unwrap();
        let b = path.bounds();
        // quarter from 3 o'clock to 12 o'clock sits in the top-right quadrant
        assert!(b.left() >= 49.9 && b.right() <= 100.1);
        assert!(b.top() >= -0.1 && b.bottom() <= 50.1);
    }

    #[test]
    fn test_pie_starts_at_center() {
        let path = arc(Rect::new(0, 0, 100, 100), 0, 180 * 16, ArcClose::Pie).unwrap();
        let first = path.points()[0];
        assert_eq!((first.x, first.y), (50.0, 50.0));
    }

    #[test]
    fn test_round_rect_stays_inside() {
        let path = round_rect(Rect::new(10, 10, 80, 40), 50, 50).unwrap();
        let b = path.bounds();
        assert!((b.left() - 10.0).abs() < 0.01 && (b.bottom() - 50.0).abs() < 0.01);
    }
}
