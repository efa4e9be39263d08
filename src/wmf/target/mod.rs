//! Render targets driven by metafile playback.
//!
//! [`RenderTarget`] has one method per drawing primitive or state change a
//! WMF stream can express. The dispatcher never touches drawing state
//! directly; everything visible goes through this trait.
//!
//! Backends:
//! - [`Recorder`]: keeps the call sequence for inspection
//! - `PaintTarget` (feature `paint`): rasterizes onto a `tiny-skia` pixmap
//! - `SvgTarget` (feature `svg`): writes a minimal SVG document
//!
//! Angles for arcs, pies and chords are in 1/16 degree, counter-clockwise
//! from three o'clock, with the sweep always non-negative.

pub mod recorder;

#[cfg(feature = "paint")]
pub mod paint;

#[cfg(feature = "svg")]
pub mod svg;

pub use recorder::{Call, Recorder};

#[cfg(feature = "paint")]
pub use paint::PaintTarget;

#[cfg(feature = "svg")]
pub use svg::SvgTarget;

use image::RgbaImage;

use super::geometry::{Point, Rect, Region};
use super::objects::{
    BackgroundMode, Brush, Color, CompositionMode, ExtTextOutOptions, Font, Pen, TextAlign,
};
use super::transform::Matrix;

/// Text drawn by TextOut/ExtTextOut.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    /// Reference point, interpreted through `align`
    pub position: Point,
    pub text: String,
    pub align: TextAlign,
    pub color: Color,
    /// Clockwise degrees, taken from the selected font
    pub rotation: f64,
    pub options: ExtTextOutOptions,
    /// Clip or opaque rectangle when `options` asks for one
    pub rect: Option<Rect>,
    /// Per-character advances in logical units
    pub dx: Vec<i32>,
}

/// Capability surface the dispatcher draws through.
///
/// Coordinates are logical units. `set_window_org`/`set_window_ext` declare
/// which logical rectangle maps onto the output, and `set_matrix` applies a
/// world matrix on top of that mapping.
pub trait RenderTarget {
    /// Start a playback covering `bounding_rect`. Returning false aborts it.
    fn begin(&mut self, bounding_rect: Rect) -> bool;

    /// Finish a playback started by a successful `begin`.
    fn end(&mut self);

    /// Push the complete drawing state.
    fn save(&mut self);

    /// Pop the drawing state. Unbalanced calls are ignored.
    fn restore(&mut self);

    /// The pen currently in use.
    fn pen(&self) -> Pen;

    fn set_pen(&mut self, pen: &Pen);

    fn set_brush(&mut self, brush: &Brush);

    fn set_font(&mut self, font: &Font);

    fn set_background_color(&mut self, color: Color);

    fn set_background_mode(&mut self, mode: BackgroundMode);

    fn set_composition_mode(&mut self, mode: CompositionMode);

    fn set_window_org(&mut self, origin: Point);

    fn set_window_ext(&mut self, width: i32, height: i32);

    /// Device-side origin. See [`Viewport`](crate::wmf::transform::Viewport)
    /// for how it combines with the window.
    fn set_viewport_org(&mut self, origin: Point);

    fn set_viewport_ext(&mut self, width: i32, height: i32);

    /// Replace the world matrix, or pre-multiply it when `combine` is set.
    fn set_matrix(&mut self, matrix: &Matrix, combine: bool);

    /// Current clip area; `None` means unclipped.
    fn clip_region(&self) -> Option<Region>;

    fn set_clip_region(&mut self, region: Option<Region>);

    fn move_to(&mut self, point: Point);

    /// Line from the current position, which then moves to `point`.
    fn line_to(&mut self, point: Point);

    fn draw_rect(&mut self, rect: Rect);

    /// Corner radii are percentages of half the width and height.
    fn draw_round_rect(&mut self, rect: Rect, x_round: i32, y_round: i32);

    fn draw_ellipse(&mut self, rect: Rect);

    fn draw_arc(&mut self, rect: Rect, start_angle: i32, sweep: i32);

    fn draw_pie(&mut self, rect: Rect, start_angle: i32, sweep: i32);

    fn draw_chord(&mut self, rect: Rect, start_angle: i32, sweep: i32);

    fn draw_polyline(&mut self, points: &[Point]);

    /// Closed polygon; `winding` selects non-zero over even-odd filling.
    fn draw_polygon(&mut self, points: &[Point], winding: bool);

    /// Fill the area inside an odd number of `polygons`, then stroke every
    /// contour unless the pen is null. The fill is even-odd whatever the
    /// current fill mode; `winding` only reports that mode.
    fn draw_poly_polygon(&mut self, polygons: &[Vec<Point>], winding: bool);

    /// Draw `source` (in image pixels) of `image` scaled into `dest`.
    /// Returns false when the image could not be drawn.
    fn draw_image(&mut self, dest: Rect, image: &RgbaImage, source: Rect) -> bool;

    /// Returns false when the text could not be drawn.
    fn draw_text(&mut self, run: &TextRun) -> bool;
}

/// Convert a 1/16 degree angle to radians.
#[inline]
pub fn angle_to_radians(angle: i32) -> f64 {
    f64::from(angle) / 16.0 * std::f64::consts::PI / 180.0
}

/// Point on the ellipse inscribed in `rect` at `angle` (1/16 degree,
/// counter-clockwise, y axis pointing down).
pub fn ellipse_point(rect: &Rect, angle: i32) -> (f64, f64) {
    let r = rect.normalized();
    let rx = f64::from(r.width) / 2.0;
    let ry = f64::from(r.height) / 2.0;
    let cx = f64::from(r.left) + rx;
    let cy = f64::from(r.top) + ry;
    let a = angle_to_radians(angle);
    (cx + rx * a.cos(), cy - ry * a.sin())
}
