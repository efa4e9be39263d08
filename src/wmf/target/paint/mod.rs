//! Raster backend on a `tiny-skia` pixmap.
//!
//! The logical window set by the metafile is stretched over the whole
//! pixmap, with the world matrix applied in logical space first. Clip
//! regions become device-space masks at the moment they are set, so later
//! window changes do not move them.

mod path;
mod style;

use image::RgbaImage;
use tiny_skia::{FillRule, FilterQuality, Mask, Path, Pixmap, PixmapPaint, Stroke, Transform};

use self::path::ArcClose;
use self::style::BrushFill;
use super::{RenderTarget, TextRun};
use crate::common::error::{Error, Result};
use crate::wmf::geometry::{Point, Rect, Region};
use crate::wmf::objects::{
    BackgroundMode, Brush, Color, CompositionMode, ExtTextOutOptions, Font, Pen,
};
use crate::wmf::transform::{Matrix, Viewport};

#[derive(Clone)]
struct PaintState {
    window: Rect,
    viewport: Viewport,
    world: Matrix,
    pen: Pen,
    brush: Brush,
    font: Font,
    bk_color: Color,
    bk_mode: BackgroundMode,
    composition: CompositionMode,
    clip: Option<Region>,
    mask: Option<Mask>,
    position: Point,
}

impl Default for PaintState {
    fn default() -> Self {
        Self {
            window: Rect::default(),
            viewport: Viewport::default(),
            world: Matrix::IDENTITY,
            pen: Pen::default(),
            brush: Brush::default(),
            font: Font::default(),
            bk_color: Color::WHITE,
            bk_mode: BackgroundMode::Opaque,
            composition: CompositionMode::SourceOver,
            clip: None,
            mask: None,
            position: Point::default(),
        }
    }
}

/// Renders playback into a fixed-size pixmap.
pub struct PaintTarget {
    width: u32,
    height: u32,
    background: Option<Color>,
    pixmap: Option<Pixmap>,
    state: PaintState,
    stack: Vec<PaintState>,
}

impl PaintTarget {
    /// A `width` x `height` surface cleared to transparent on `begin`.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            background: None,
            pixmap: None,
            state: PaintState::default(),
            stack: Vec::new(),
        }
    }

    /// Clear to `color` on `begin` instead of transparent.
    pub fn with_background(mut self, color: Option<Color>) -> Self {
        self.background = color;
        self
    }

    /// The surface, once `begin` has succeeded.
    pub fn pixmap(&self) -> Option<&Pixmap> {
        self.pixmap.as_ref()
    }

    /// Straight-alpha copy of the surface.
    pub fn to_image(&self) -> Option<RgbaImage> {
        self.pixmap.as_ref().map(style::image_from_pixmap)
    }

    pub fn encode_png(&self) -> Result<Vec<u8>> {
        let image = self
            .to_image()
            .ok_or_else(|| Error::InvalidState("nothing has been rendered".into()))?;
        crate::wmf::dib::encode_png(&image)
    }

    /// Logical-to-device transform: world matrix, then the viewport folded
    /// into the window, then the window stretched over the pixmap.
    fn device_transform(&self) -> Transform {
        let w = self.state.window;
        let sx = if w.width == 0 {
            1.0
        } else {
            self.width as f32 / w.width as f32
        };
        let sy = if w.height == 0 {
            1.0
        } else {
            self.height as f32 / w.height as f32
        };
        let viewport =
            Transform::from_row(sx, 0.0, 0.0, sy, -(w.left as f32) * sx, -(w.top as f32) * sy);
        let m = self.state.world.then(&self.state.viewport.matrix(w));
        viewport.pre_concat(Transform::from_row(
            m.m11 as f32,
            m.m12 as f32,
            m.m21 as f32,
            m.m22 as f32,
            m.dx as f32,
            m.dy as f32,
        ))
    }

    fn fill(&mut self, path: &Path, rule: FillRule) {
        let ts = self.device_transform();
        let state = &self.state;
        let Some(fill) = BrushFill::new(&state.brush, state.bk_color, state.bk_mode) else {
            return;
        };
        let Some(pixmap) = self.pixmap.as_mut() else {
            return;
        };
        let paint = fill.paint(style::blend_mode(state.composition), ts);
        pixmap.fill_path(path, &paint, rule, ts, state.mask.as_ref());
    }

    fn stroke(&mut self, path: &Path) {
        let ts = self.device_transform();
        let state = &self.state;
        if state.pen.is_null() {
            return;
        }
        let Some(pixmap) = self.pixmap.as_mut() else {
            return;
        };
        let blend = style::blend_mode(state.composition);
        let stroke = style::stroke(&state.pen);
        if stroke.dash.is_some() && state.bk_mode == BackgroundMode::Opaque {
            let gaps = Stroke {
                dash: None,
                ..stroke.clone()
            };
            let paint = style::solid_paint(state.bk_color, blend);
            pixmap.stroke_path(path, &paint, &gaps, ts, state.mask.as_ref());
        }
        let paint = style::solid_paint(state.pen.color, blend);
        pixmap.stroke_path(path, &paint, &stroke, ts, state.mask.as_ref());
    }

    fn shape(&mut self, path: Option<Path>, rule: FillRule) {
        if let Some(path) = path {
            self.fill(&path, rule);
            self.stroke(&path);
        }
    }
}

#[inline]
fn fill_rule(winding: bool) -> FillRule {
    if winding {
        FillRule::Winding
    } else {
        FillRule::EvenOdd
    }
}

impl RenderTarget for PaintTarget {
    fn begin(&mut self, bounding_rect: Rect) -> bool {
        let Some(mut pixmap) = Pixmap::new(self.width, self.height) else {
            log::warn!("cannot allocate a {}x{} surface", self.width, self.height);
            return false;
        };
        if let Some(color) = self.background {
            pixmap.fill(style::sk_color(color));
        }
        self.pixmap = Some(pixmap);
        self.stack.clear();
        self.state = PaintState {
            window: bounding_rect,
            ..PaintState::default()
        };
        true
    }

    fn end(&mut self) {
        if !self.stack.is_empty() {
            log::debug!("{} unbalanced save(s) at end of playback", self.stack.len());
            self.stack.clear();
        }
    }

    fn save(&mut self) {
        self.stack.push(self.state.clone());
    }

    fn restore(&mut self) {
        match self.stack.pop() {
            Some(state) => self.state = state,
            None => log::debug!("restore without save"),
        }
    }

    fn pen(&self) -> Pen {
        self.state.pen
    }

    fn set_pen(&mut self, pen: &Pen) {
        self.state.pen = *pen;
    }

    fn set_brush(&mut self, brush: &Brush) {
        self.state.brush = brush.clone();
    }

    fn set_font(&mut self, font: &Font) {
        self.state.font = font.clone();
    }

    fn set_background_color(&mut self, color: Color) {
        self.state.bk_color = color;
    }

    fn set_background_mode(&mut self, mode: BackgroundMode) {
        self.state.bk_mode = mode;
    }

    fn set_composition_mode(&mut self, mode: CompositionMode) {
        self.state.composition = mode;
    }

    fn set_window_org(&mut self, origin: Point) {
        self.state.window.left = origin.x;
        self.state.window.top = origin.y;
    }

    fn set_window_ext(&mut self, width: i32, height: i32) {
        if width == 0 || height == 0 {
            log::debug!("zero window extent ignored");
            return;
        }
        self.state.window.width = width;
        self.state.window.height = height;
    }

    fn set_viewport_org(&mut self, origin: Point) {
        self.state.viewport.set_origin(origin);
    }

    fn set_viewport_ext(&mut self, width: i32, height: i32) {
        self.state.viewport.set_extent(width, height);
    }

    fn set_matrix(&mut self, matrix: &Matrix, combine: bool) {
        self.state.world = if combine {
            matrix.then(&self.state.world)
        } else {
            *matrix
        };
    }

    fn clip_region(&self) -> Option<Region> {
        self.state.clip.clone()
    }

    fn set_clip_region(&mut self, region: Option<Region>) {
        self.state.mask = region.as_ref().and_then(|region| {
            let mut mask = Mask::new(self.width, self.height)?;
            if let Some(path) = path::region(region.rects()) {
                mask.fill_path(&path, FillRule::Winding, false, self.device_transform());
            }
            Some(mask)
        });
        self.state.clip = region;
    }

    fn move_to(&mut self, point: Point) {
        self.state.position = point;
    }

    fn line_to(&mut self, point: Point) {
        if let Some(path) = path::segment(self.state.position, point) {
            self.stroke(&path);
        }
        self.state.position = point;
    }

    fn draw_rect(&mut self, rect: Rect) {
        self.shape(path::rect(rect), FillRule::Winding);
    }

    fn draw_round_rect(&mut self, rect: Rect, x_round: i32, y_round: i32) {
        self.shape(path::round_rect(rect, x_round, y_round), FillRule::Winding);
    }

    fn draw_ellipse(&mut self, rect: Rect) {
        self.shape(path::ellipse(rect), FillRule::Winding);
    }

    fn draw_arc(&mut self, rect: Rect, start_angle: i32, sweep: i32) {
        if let Some(path) = path::arc(rect, start_angle, sweep, ArcClose::Open) {
            self.stroke(&path);
        }
    }

    fn draw_pie(&mut self, rect: Rect, start_angle: i32, sweep: i32) {
        let path = path::arc(rect, start_angle, sweep, ArcClose::Pie);
        self.shape(path, FillRule::Winding);
    }

    fn draw_chord(&mut self, rect: Rect, start_angle: i32, sweep: i32) {
        let path = path::arc(rect, start_angle, sweep, ArcClose::Chord);
        self.shape(path, FillRule::Winding);
    }

    fn draw_polyline(&mut self, points: &[Point]) {
        if let Some(path) = path::polyline(points, false) {
            self.stroke(&path);
        }
    }

    fn draw_polygon(&mut self, points: &[Point], winding: bool) {
        self.shape(path::polyline(points, true), fill_rule(winding));
    }

    fn draw_poly_polygon(&mut self, polygons: &[Vec<Point>], _winding: bool) {
        self.shape(path::poly_polygon(polygons), FillRule::EvenOdd);
    }

    fn draw_image(&mut self, dest: Rect, image: &RgbaImage, source: Rect) -> bool {
        let bounds = Rect::new(0, 0, image.width() as i32, image.height() as i32);
        let source = match source.normalized() {
            s if s.is_empty() => bounds,
            s => s,
        };
        let Some(visible) = source.intersection(&bounds) else {
            log::debug!("source {source:?} outside a {}x{} image", bounds.width, bounds.height);
            return false;
        };
        let cropped = image::imageops::crop_imm(
            image,
            visible.left as u32,
            visible.top as u32,
            visible.width as u32,
            visible.height as u32,
        )
        .to_image();
        let Some(tile) = style::pixmap_from_image(&cropped) else {
            return false;
        };

        let dest = dest.normalized();
        let sx = dest.width as f32 / source.width as f32;
        let sy = dest.height as f32 / source.height as f32;
        let place = Transform::from_row(
            sx,
            0.0,
            0.0,
            sy,
            dest.left as f32 + (visible.left - source.left) as f32 * sx,
            dest.top as f32 + (visible.top - source.top) as f32 * sy,
        );
        let ts = self.device_transform().pre_concat(place);
        let paint = PixmapPaint {
            opacity: 1.0,
            blend_mode: style::blend_mode(self.state.composition),
            quality: FilterQuality::Bilinear,
        };
        let Some(pixmap) = self.pixmap.as_mut() else {
            return false;
        };
        pixmap.draw_pixmap(0, 0, tile.as_ref(), &paint, ts, self.state.mask.as_ref());
        true
    }

    fn draw_text(&mut self, run: &TextRun) -> bool {
        if run.options.contains(ExtTextOutOptions::OPAQUE)
            && let Some(path) = run.rect.and_then(path::rect)
        {
            let ts = self.device_transform();
            let paint = style::solid_paint(self.state.bk_color, tiny_skia::BlendMode::SourceOver);
            if let Some(pixmap) = self.pixmap.as_mut() {
                pixmap.fill_path(&path, &paint, FillRule::Winding, ts, self.state.mask.as_ref());
            }
        }
        log::debug!(
            "text {:?} at ({}, {}) in {} {}pt not rasterized",
            run.text,
            run.position.x,
            run.position.y,
            self.state.font.family,
            self.state.font.size()
        );
        true
    }
}
