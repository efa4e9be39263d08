//! A render target that records every call.
//!
//! Used by tests and by callers that want to inspect a metafile without
//! rasterizing it. Pen and clip region are tracked so the query methods
//! answer the way a real backend would.

use image::RgbaImage;

use super::{RenderTarget, TextRun};
use crate::wmf::geometry::{Point, Rect, Region};
use crate::wmf::objects::{BackgroundMode, Brush, Color, CompositionMode, Font, Pen};
use crate::wmf::transform::Matrix;

/// One recorded [`RenderTarget`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Begin(Rect),
    End,
    Save,
    Restore,
    SetPen(Pen),
    SetBrush(Brush),
    SetFont(Font),
    SetBackgroundColor(Color),
    SetBackgroundMode(BackgroundMode),
    SetCompositionMode(CompositionMode),
    SetWindowOrg(Point),
    SetWindowExt { width: i32, height: i32 },
    SetViewportOrg(Point),
    SetViewportExt { width: i32, height: i32 },
    SetMatrix { matrix: Matrix, combine: bool },
    SetClipRegion(Option<Region>),
    MoveTo(Point),
    LineTo(Point),
    DrawRect(Rect),
    DrawRoundRect { rect: Rect, x_round: i32, y_round: i32 },
    DrawEllipse(Rect),
    DrawArc { rect: Rect, start: i32, sweep: i32 },
    DrawPie { rect: Rect, start: i32, sweep: i32 },
    DrawChord { rect: Rect, start: i32, sweep: i32 },
    DrawPolyline(Vec<Point>),
    DrawPolygon { points: Vec<Point>, winding: bool },
    DrawPolyPolygon { polygons: Vec<Vec<Point>>, winding: bool },
    /// Images are recorded by size only.
    DrawImage { dest: Rect, source: Rect, width: u32, height: u32 },
    DrawText(TextRun),
}

impl Call {
    /// Whether this call changes pixels.
    pub fn is_drawing(&self) -> bool {
        matches!(
            self,
            Call::LineTo(_)
                | Call::DrawRect(_)
                | Call::DrawRoundRect { .. }
                | Call::DrawEllipse(_)
                | Call::DrawArc { .. }
                | Call::DrawPie { .. }
                | Call::DrawChord { .. }
                | Call::DrawPolyline(_)
                | Call::DrawPolygon { .. }
                | Call::DrawPolyPolygon { .. }
                | Call::DrawImage { .. }
                | Call::DrawText(_)
        )
    }
}

#[derive(Debug, Clone, Default)]
struct SavedState {
    pen: Pen,
    clip: Option<Region>,
}

/// [`RenderTarget`] that appends each call to a list.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    calls: Vec<Call>,
    pen: Pen,
    clip: Option<Region>,
    stack: Vec<SavedState>,
    refuse_begin: bool,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A recorder whose `begin` returns false.
    pub fn refusing() -> Self {
        Self {
            refuse_begin: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn into_calls(self) -> Vec<Call> {
        self.calls
    }

    /// Number of recorded calls matching `pred`.
    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    /// Depth of the save stack.
    pub fn save_depth(&self) -> usize {
        self.stack.len()
    }
}

impl RenderTarget for Recorder {
    fn begin(&mut self, bounding_rect: Rect) -> bool {
        if self.refuse_begin {
            return false;
        }
        self.calls.push(Call::Begin(bounding_rect));
        true
    }

    fn end(&mut self) {
        self.calls.push(Call::End);
    }

    fn save(&mut self) {
        self.stack.push(SavedState {
            pen: self.pen,
            clip: self.clip.clone(),
        });
        self.calls.push(Call::Save);
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.pen = state.pen;
            self.clip = state.clip;
        }
        self.calls.push(Call::Restore);
    }

    fn pen(&self) -> Pen {
        self.pen
    }

    fn set_pen(&mut self, pen: &Pen) {
        self.pen = *pen;
        self.calls.push(Call::SetPen(*pen));
    }

    fn set_brush(&mut self, brush: &Brush) {
        self.calls.push(Call::SetBrush(brush.clone()));
    }

    fn set_font(&mut self, font: &Font) {
        self.calls.push(Call::SetFont(font.clone()));
    }

    fn set_background_color(&mut self, color: Color) {
        self.calls.push(Call::SetBackgroundColor(color));
    }

    fn set_background_mode(&mut self, mode: BackgroundMode) {
        self.calls.push(Call::SetBackgroundMode(mode));
    }

    fn set_composition_mode(&mut self, mode: CompositionMode) {
        self.calls.push(Call::SetCompositionMode(mode));
    }

    fn set_window_org(&mut self, origin: Point) {
        self.calls.push(Call::SetWindowOrg(origin));
    }

    fn set_window_ext(&mut self, width: i32, height: i32) {
        self.calls.push(Call::SetWindowExt { width, height });
    }

    fn set_viewport_org(&mut self, origin: Point) {
        self.calls.push(Call::SetViewportOrg(origin));
    }

    fn set_viewport_ext(&mut self, width: i32, height: i32) {
        self.calls.push(Call::SetViewportExt { width, height });
    }

    fn set_matrix(&mut self, matrix: &Matrix, combine: bool) {
        self.calls.push(Call::SetMatrix {
            matrix: *matrix,
            combine,
        });
    }

    fn clip_region(&self) -> Option<Region> {
        self.clip.clone()
    }

    fn set_clip_region(&mut self, region: Option<Region>) {
        self.clip = region.clone();
        self.calls.push(Call::SetClipRegion(region));
    }

    fn move_to(&mut self, point: Point) {
        self.calls.push(Call::MoveTo(point));
    }

    fn line_to(&mut self, point: Point) {
        self.calls.push(Call::LineTo(point));
    }

    fn draw_rect(&mut self, rect: Rect) {
        self.calls.push(Call::DrawRect(rect));
    }

    fn draw_round_rect(&mut self, rect: Rect, x_round: i32, y_round: i32) {
        self.calls.push(Call::DrawRoundRect {
            rect,
            x_round,
            y_round,
        });
    }

    fn draw_ellipse(&mut self, rect: Rect) {
        self.calls.push(Call::DrawEllipse(rect));
    }

    fn draw_arc(&mut self, rect: Rect, start_angle: i32, sweep: i32) {
        self.calls.push(Call::DrawArc {
            rect,
            start: start_angle,
            sweep,
        });
    }

    fn draw_pie(&mut self, rect: Rect, start_angle: i32, sweep: i32) {
        self.calls.push(Call::DrawPie {
            rect,
            start: start_angle,
            sweep,
        });
    }

    fn draw_chord(&mut self, rect: Rect, start_angle: i32, sweep: i32) {
        self.calls.push(Call::DrawChord {
            rect,
            start: start_angle,
            sweep,
        });
    }

    fn draw_polyline(&mut self, points: &[Point]) {
        self.calls.push(Call::DrawPolyline(points.to_vec()));
    }

    fn draw_polygon(&mut self, points: &[Point], winding: bool) {
        self.calls.push(Call::DrawPolygon {
            points: points.to_vec(),
            winding,
        });
    }

    fn draw_poly_polygon(&mut self, polygons: &[Vec<Point>], winding: bool) {
        self.calls.push(Call::DrawPolyPolygon {
            polygons: polygons.to_vec(),
            winding,
        });
    }

    fn draw_image(&mut self, dest: Rect, image: &RgbaImage, source: Rect) -> bool {
        let (width, height) = image.dimensions();
        self.calls.push(Call::DrawImage {
            dest,
            source,
            width,
            height,
        });
        true
    }

    fn draw_text(&mut self, run: &TextRun) -> bool {
        self.calls.push(Call::DrawText(run.clone()));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_restore_tracks_pen_and_clip() {
        let mut rec = Recorder::new();
        let red = Pen::new(crate::wmf::objects::PenStyle::Dash, 2, Color::rgb(255, 0, 0));
        rec.save();
        rec.set_pen(&red);
        rec.set_clip_region(Some(Region::from_rect(Rect::new(0, 0, 5, 5))));
        assert_eq!(rec.pen(), red);
        assert!(rec.clip_region().is_some());
        rec.restore();
        assert_eq!(rec.pen(), Pen::default());
        assert!(rec.clip_region().is_none());
        // unbalanced restore is harmless
        rec.restore();
        assert_eq!(rec.save_depth(), 0);
    }

    #[test]
    fn test_refusing_recorder() {
        let mut rec = Recorder::refusing();
        assert!(!rec.begin(Rect::new(0, 0, 1, 1)));
        assert!(rec.calls().is_empty());
    }
}
