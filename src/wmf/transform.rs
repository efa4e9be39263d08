//! Logical window bookkeeping and the relative-mode world matrix.
//!
//! In [`CoordinateMode::Absolute`] every window record is forwarded to the
//! render target as a plain window change. In [`CoordinateMode::Relative`]
//! the transform keeps an accumulated [`Matrix`] and forwards each step of
//! its undo/reapply sequence so the target's world matrix stays identical to
//! the one kept here.
//!
//! [`Viewport`] is the device side of the mapping, kept by each backend.

use smallvec::SmallVec;

use super::geometry::{Point, Rect};

/// 2x3 affine matrix in painter convention.
///
/// A point maps to `(m11*x + m21*y + dx, m12*x + m22*y + dy)`. `translate`,
/// `scale` and `rotate` pre-multiply, so the newest operation is applied to
/// coordinates first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub m11: f64,
    pub m12: f64,
    pub m21: f64,
    pub m22: f64,
    pub dx: f64,
    pub dy: f64,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

    /// Mirror around the vertical axis.
    pub const FLIP_HORIZONTAL: Matrix = Matrix::new(-1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

    /// Mirror around the horizontal axis.
    pub const FLIP_VERTICAL: Matrix = Matrix::new(1.0, 0.0, 0.0, -1.0, 0.0, 0.0);

    pub const fn new(m11: f64, m12: f64, m21: f64, m22: f64, dx: f64, dy: f64) -> Self {
        Self {
            m11,
            m12,
            m21,
            m22,
            dx,
            dy,
        }
    }

    pub const fn translation(dx: f64, dy: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, dx, dy)
    }

    pub const fn scaling(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.dx += dx * self.m11 + dy * self.m21;
        self.dy += dy * self.m22 + dx * self.m12;
    }

    pub fn scale(&mut self, sx: f64, sy: f64) {
        self.m11 *= sx;
        self.m12 *= sx;
        self.m21 *= sy;
        self.m22 *= sy;
    }

    pub fn rotate(&mut self, degrees: f64) {
        let (sin, cos) = degrees.to_radians().sin_cos();
        let m11 = cos * self.m11 + sin * self.m21;
        let m12 = cos * self.m12 + sin * self.m22;
        let m21 = -sin * self.m11 + cos * self.m21;
        let m22 = -sin * self.m12 + cos * self.m22;
        self.m11 = m11;
        self.m12 = m12;
        self.m21 = m21;
        self.m22 = m22;
    }

    #[inline]
    pub fn map(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.m11 * x + self.m21 * y + self.dx,
            self.m12 * x + self.m22 * y + self.dy,
        )
    }

    /// Matrix applying `self` first, then `other`.
    pub fn then(&self, other: &Matrix) -> Matrix {
        Matrix {
            m11: self.m11 * other.m11 + self.m12 * other.m21,
            m12: self.m11 * other.m12 + self.m12 * other.m22,
            m21: self.m21 * other.m11 + self.m22 * other.m21,
            m22: self.m21 * other.m12 + self.m22 * other.m22,
            dx: self.dx * other.m11 + self.dy * other.m21 + other.dx,
            dy: self.dx * other.m12 + self.dy * other.m22 + other.dy,
        }
    }

    pub fn determinant(&self) -> f64 {
        self.m11 * self.m22 - self.m12 * self.m21
    }

    pub fn inverse(&self) -> Option<Matrix> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let m11 = self.m22 / det;
        let m12 = -self.m12 / det;
        let m21 = -self.m21 / det;
        let m22 = self.m11 / det;
        Some(Matrix {
            m11,
            m12,
            m21,
            m22,
            dx: -(self.dx * m11 + self.dy * m21),
            dy: -(self.dx * m12 + self.dy * m22),
        })
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

/// How window records are interpreted during playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoordinateMode {
    /// Window records reset the target's window directly.
    #[default]
    Absolute,
    /// Window records accumulate into a world matrix.
    Relative,
}

/// Device-level call the dispatcher forwards to the render target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransformCall {
    SetWindowOrg(Point),
    SetWindowExt { width: i32, height: i32 },
    /// Pre-multiply the target's world matrix.
    CombineMatrix(Matrix),
}

pub type TransformCalls = SmallVec<[TransformCall; 4]>;

/// Logical window state of one playback.
#[derive(Debug, Clone)]
pub struct WindowTransform {
    mode: CoordinateMode,
    base: Rect,
    window: Rect,
    matrix: Matrix,
}

impl WindowTransform {
    pub fn new(mode: CoordinateMode, bounding_rect: Rect) -> Self {
        Self {
            mode,
            base: bounding_rect,
            window: bounding_rect,
            matrix: Matrix::IDENTITY,
        }
    }

    pub fn mode(&self) -> CoordinateMode {
        self.mode
    }

    /// Current logical window (origin and extent as last declared).
    pub fn window(&self) -> Rect {
        self.window
    }

    /// Accumulated relative-mode matrix; identity in absolute mode.
    pub fn matrix(&self) -> Matrix {
        self.matrix
    }

    /// Map a logical point through the accumulated matrix.
    pub fn map(&self, p: Point) -> (f64, f64) {
        self.matrix.map(f64::from(p.x), f64::from(p.y))
    }

    pub fn set_origin(&mut self, x: i32, y: i32) -> TransformCalls {
        self.window.left = x;
        self.window.top = y;
        let mut calls = TransformCalls::new();
        match self.mode {
            CoordinateMode::Absolute => calls.push(TransformCall::SetWindowOrg(Point::new(x, y))),
            CoordinateMode::Relative => {
                let (dx, dy) = (self.matrix.dx, self.matrix.dy);
                self.translate(-dx, -dy, &mut calls);
                self.translate(-f64::from(x), -f64::from(y), &mut calls);
            },
        }
        calls
    }

    pub fn set_extent(&mut self, width: i32, height: i32) -> TransformCalls {
        self.window.width = width;
        self.window.height = height;
        let mut calls = TransformCalls::new();
        match self.mode {
            CoordinateMode::Absolute => {
                calls.push(TransformCall::SetWindowExt { width, height });
            },
            CoordinateMode::Relative => {
                if width == 0 || height == 0 {
                    return calls;
                }
                let (dx, dy) = (self.matrix.dx, self.matrix.dy);
                let (sx, sy) = (self.matrix.m11, self.matrix.m22);
                if sx == 0.0 || sy == 0.0 {
                    log::debug!("degenerate window scale ({sx}, {sy}), extent ignored");
                    return calls;
                }
                self.translate(-dx, -dy, &mut calls);
                self.scale(1.0 / sx, 1.0 / sy, &mut calls);
                let sx = f64::from(self.base.width) / f64::from(width);
                let sy = f64::from(self.base.height) / f64::from(height);
                self.scale(sx, sy, &mut calls);
                self.translate(dx, dy, &mut calls);
            },
        }
        calls
    }

    /// Move the origin relative to the current window.
    pub fn offset_origin(&mut self, dx: i32, dy: i32) -> TransformCalls {
        self.set_origin(self.window.left + dx, self.window.top + dy)
    }

    /// Scale the current extent by `num/den` per axis. Zero denominators are ignored.
    pub fn scale_extent(&mut self, x_num: i32, x_den: i32, y_num: i32, y_den: i32) -> TransformCalls {
        if x_den == 0 || y_den == 0 {
            return TransformCalls::new();
        }
        let scale = |extent: i32, num: i32, den: i32| {
            let v = i64::from(extent) * i64::from(num) / i64::from(den);
            v.clamp(i64::from(i16::MIN), i64::from(i16::MAX)) as i32
        };
        let width = scale(self.window.width, x_num, x_den);
        let height = scale(self.window.height, y_num, y_den);
        self.set_extent(width, height)
    }

    fn translate(&mut self, dx: f64, dy: f64, calls: &mut TransformCalls) {
        self.matrix.translate(dx, dy);
        calls.push(TransformCall::CombineMatrix(Matrix::translation(dx, dy)));
    }

    fn scale(&mut self, sx: f64, sy: f64, calls: &mut TransformCalls) {
        self.matrix.scale(sx, sy);
        calls.push(TransformCall::CombineMatrix(Matrix::scaling(sx, sy)));
    }
}

/// Viewport origin and extent as a backend tracks them.
///
/// The viewport has no effect until an extent is set; before that the
/// window alone decides what fills the output. The first extent set becomes
/// the reference: from then on the output shows the device rectangle at
/// (0, 0) spanning that extent, so later origin and extent changes move and
/// scale whatever is drawn after them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    origin: Point,
    extent: Option<(i32, i32)>,
    reference: Option<(i32, i32)>,
}

impl Viewport {
    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn extent(&self) -> Option<(i32, i32)> {
        self.extent
    }

    pub fn set_origin(&mut self, origin: Point) {
        self.origin = origin;
    }

    /// Zero extents are ignored.
    pub fn set_extent(&mut self, width: i32, height: i32) {
        if width == 0 || height == 0 {
            log::debug!("zero viewport extent ignored");
            return;
        }
        self.extent = Some((width, height));
        self.reference.get_or_insert((width, height));
    }

    /// Logical-space matrix that folds the window-to-viewport mapping into
    /// `window`, which the backend then stretches over its output.
    pub fn matrix(&self, window: Rect) -> Matrix {
        let (Some((vw, vh)), Some((rw, rh))) = (self.extent, self.reference) else {
            return Matrix::IDENTITY;
        };
        if window.width == 0 || window.height == 0 {
            return Matrix::IDENTITY;
        }
        // x' = org + ((x - org) * vext / ext + vorg) * ext / rext
        let axis = |org: i32, ext: i32, vorg: i32, vext: i32, rext: i32| {
            let scale = f64::from(vext) / f64::from(rext);
            let offset = f64::from(org) * (1.0 - scale)
                + f64::from(vorg) * f64::from(ext) / f64::from(rext);
            (scale, offset)
        };
        let (sx, dx) = axis(window.left, window.width, self.origin.x, vw, rw);
        let (sy, dy) = axis(window.top, window.height, self.origin.y, vh, rh);
        Matrix::new(sx, 0.0, 0.0, sy, dx, dy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn replay(calls: &[TransformCall], world: &mut Matrix) {
        for call in calls {
            if let TransformCall::CombineMatrix(m) = call {
                *world = m.then(world);
            }
        }
    }

    #[test]
    fn test_translate_prepends() {
        let mut m = Matrix::scaling(2.0, 3.0);
        m.translate(10.0, 10.0);
        assert_eq!(m.map(0.0, 0.0), (20.0, 30.0));
        assert_eq!(
            Matrix::translation(10.0, 10.0).then(&Matrix::scaling(2.0, 3.0)),
            m
        );
    }

    #[test]
    fn test_inverse() {
        let mut m = Matrix::scaling(2.0, 4.0);
        m.translate(3.0, -1.0);
        m.rotate(30.0);
        let inv = m.inverse().unwrap();
        let (x, y) = m.map(7.0, 5.0);
        let (bx, by) = inv.map(x, y);
        assert!((bx - 7.0).abs() < 1e-9 && (by - 5.0).abs() < 1e-9);
        assert!(Matrix::scaling(0.0, 1.0).inverse().is_none());
    }

    #[test]
    fn test_absolute_mode_forwards_window_calls() {
        let mut t = WindowTransform::new(CoordinateMode::Absolute, Rect::new(0, 0, 100, 100));
        let calls = t.set_origin(5, 6);
        assert_eq!(calls.as_slice(), [TransformCall::SetWindowOrg(Point::new(5, 6))]);
        let calls = t.set_extent(-50, 40);
        assert_eq!(
            calls.as_slice(),
            [TransformCall::SetWindowExt {
                width: -50,
                height: 40
            }]
        );
        assert_eq!(t.window(), Rect::new(5, 6, -50, 40));
        assert!(t.matrix().is_identity());
    }

    #[test]
    fn test_relative_origin_supersedes() {
        let bbox = Rect::new(0, 0, 100, 100);
        let mut twice = WindowTransform::new(CoordinateMode::Relative, bbox);
        let mut world = Matrix::IDENTITY;
        replay(&twice.set_origin(10, 10), &mut world);
        replay(&twice.set_origin(20, 20), &mut world);

        let mut once = WindowTransform::new(CoordinateMode::Relative, bbox);
        once.set_origin(20, 20);

        assert_eq!(twice.map(Point::new(0, 0)), once.map(Point::new(0, 0)));
        assert_eq!(twice.map(Point::new(0, 0)), (-20.0, -20.0));
        assert_eq!(world, twice.matrix());
    }

    #[test]
    fn test_relative_extent_rescales_from_base() {
        let mut t = WindowTransform::new(CoordinateMode::Relative, Rect::new(0, 0, 100, 100));
        let mut world = Matrix::IDENTITY;
        replay(&t.set_extent(200, 50), &mut world);
        assert_eq!(t.map(Point::new(200, 50)), (100.0, 100.0));
        replay(&t.set_extent(400, 400), &mut world);
        assert_eq!(t.map(Point::new(400, 400)), (100.0, 100.0));
        assert_eq!(world, t.matrix());
    }

    #[test]
    fn test_relative_zero_extent_ignored() {
        let mut t = WindowTransform::new(CoordinateMode::Relative, Rect::new(0, 0, 100, 100));
        assert!(t.set_extent(0, 10).is_empty());
        assert!(t.matrix().is_identity());
    }

    #[test]
    fn test_scale_extent_zero_denominator_is_noop() {
        let mut t = WindowTransform::new(CoordinateMode::Absolute, Rect::new(0, 0, 100, 80));
        assert!(t.scale_extent(1, 0, 1, 1).is_empty());
        assert_eq!(t.window(), Rect::new(0, 0, 100, 80));
        let calls = t.scale_extent(1, 2, 3, 4);
        assert_eq!(
            calls.as_slice(),
            [TransformCall::SetWindowExt {
                width: 50,
                height: 60
            }]
        );
    }

    #[test]
    fn test_viewport_inert_until_extent_set() {
        let window = Rect::new(0, 0, 100, 100);
        let mut v = Viewport::default();
        v.set_origin(Point::new(30, 30));
        assert!(v.matrix(window).is_identity());
        v.set_extent(0, 50);
        assert_eq!(v.extent(), None);
        assert!(v.matrix(window).is_identity());
    }

    #[test]
    fn test_viewport_moves_and_scales_after_reference() {
        let window = Rect::new(10, 10, 100, 100);
        let mut v = Viewport::default();
        v.set_extent(200, 200);
        assert!(v.matrix(window).is_identity());

        // 50 device units are a quarter of the reference, 25 logical units
        v.set_origin(Point::new(50, 0));
        assert_eq!(v.matrix(window).map(10.0, 10.0), (35.0, 10.0));

        v.set_origin(Point::new(0, 0));
        v.set_extent(100, 100);
        assert_eq!(v.matrix(window).map(10.0, 10.0), (10.0, 10.0));
        assert_eq!(v.matrix(window).map(110.0, 110.0), (60.0, 60.0));
    }

    #[test]
    fn test_offset_origin_is_relative_to_window() {
        let mut t = WindowTransform::new(CoordinateMode::Absolute, Rect::new(10, 20, 100, 100));
        let calls = t.offset_origin(5, -5);
        assert_eq!(calls.as_slice(), [TransformCall::SetWindowOrg(Point::new(15, 15))]);
    }
}
