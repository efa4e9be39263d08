//! Minimal SVG backend.
//!
//! Output is a single line with no whitespace between elements and only
//! non-default attributes. Coordinates stay in logical units: the viewBox is
//! the bounding rectangle handed to `begin`, and any later window change or
//! world matrix shows up as a `transform` on the affected elements.
//!
//! Clip regions are emitted as `<clipPath>` definitions at the point they are
//! set, already mapped into viewBox space, and drawing is wrapped in a
//! `<g clip-path>` group while one is active. Hatched and pattern brushes
//! become `<pattern>` fills; bitmaps are embedded as PNG data URLs.

mod style;

use std::collections::HashMap;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::RgbaImage;

use self::style::{
    write_color, write_font_attrs, write_num, write_num_attr, write_stroke_attrs,
    write_xml_escaped,
};
use super::{RenderTarget, TextRun, ellipse_point};
use crate::wmf::dib;
use crate::wmf::geometry::{Point, Rect, Region};
use crate::wmf::objects::{
    BackgroundMode, Brush, BrushStyle, Color, CompositionMode, ExtTextOutOptions, Font,
    HatchStyle, HorizontalAlign, Pen, VerticalAlign,
};
use crate::wmf::transform::{Matrix, Viewport};

/// Largest output size used when none is given.
const MAX_WIDTH: f64 = 768.0;
const MAX_HEIGHT: f64 = 512.0;

/// Side of a hatch pattern cell in logical units.
const HATCH_SIZE: i32 = 8;

#[derive(Clone)]
struct SvgState {
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
    clip_id: Option<usize>,
    position: Point,
}

impl Default for SvgState {
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
            clip_id: None,
            position: Point::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fill {
    None,
    Brush,
    /// Brush with `fill-rule="evenodd"`
    BrushEvenOdd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArcClose {
    Open,
    Pie,
    Chord,
}

/// Writes playback as an SVG document.
pub struct SvgTarget {
    size: Option<(u32, u32)>,
    out: String,
    view: Rect,
    state: SvgState,
    stack: Vec<SvgState>,
    open_clip: Option<usize>,
    next_id: usize,
    hatches: HashMap<(HatchStyle, Color, Option<Color>), usize>,
    images: Vec<(Arc<RgbaImage>, usize)>,
    finished: bool,
}

impl Default for SvgTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl SvgTarget {
    /// Output sized to fit 768x512 with the bounding box's aspect ratio.
    pub fn new() -> Self {
        Self {
            size: None,
            out: String::new(),
            view: Rect::default(),
            state: SvgState::default(),
            stack: Vec::new(),
            open_clip: None,
            next_id: 0,
            hatches: HashMap::new(),
            images: Vec::new(),
            finished: false,
        }
    }

    /// Fixed output size in pixels.
    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            size: Some((width, height)),
            ..Self::new()
        }
    }

    /// The document, complete once `end` has run.
    pub fn as_str(&self) -> &str {
        &self.out
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn into_string(self) -> String {
        self.out
    }

    fn fit_dimensions(bbox: Rect) -> (f64, f64) {
        let w = f64::from(bbox.width).abs();
        let h = f64::from(bbox.height).abs();
        if w == 0.0 || h == 0.0 {
            return (MAX_WIDTH, MAX_HEIGHT);
        }
        let ratio = h / w;
        if ratio > MAX_HEIGHT / MAX_WIDTH {
            ((MAX_HEIGHT / ratio).round().max(1.0), MAX_HEIGHT)
        } else {
            (MAX_WIDTH, (MAX_WIDTH * ratio).round().max(1.0))
        }
    }

    /// Logical coordinates to viewBox coordinates.
    fn mapping(&self) -> Matrix {
        let w = self.state.window;
        let sx = if w.width == 0 {
            1.0
        } else {
            f64::from(self.view.width) / f64::from(w.width)
        };
        let sy = if w.height == 0 {
            1.0
        } else {
            f64::from(self.view.height) / f64::from(w.height)
        };
        let window = Matrix::new(
            sx,
            0.0,
            0.0,
            sy,
            f64::from(self.view.left) - f64::from(w.left) * sx,
            f64::from(self.view.top) - f64::from(w.top) * sy,
        );
        self.state
            .world
            .then(&self.state.viewport.matrix(w))
            .then(&window)
    }

    fn next_id(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Open or close the clip group so it matches the current clip.
    fn sync_clip(&mut self) {
        if self.open_clip == self.state.clip_id {
            return;
        }
        if self.open_clip.is_some() {
            self.out.push_str("</g>");
        }
        if let Some(id) = self.state.clip_id {
            self.out.push_str(r#"<g clip-path="url(#c"#);
            self.out.push_str(itoa::Buffer::new().format(id));
            self.out.push_str(")\">");
        }
        self.open_clip = self.state.clip_id;
    }

    fn hatch_pattern(&mut self, hatch: HatchStyle, color: Color) -> usize {
        let background = (self.state.bk_mode == BackgroundMode::Opaque).then_some(self.state.bk_color);
        if let Some(id) = self.hatches.get(&(hatch, color, background)) {
            return *id;
        }
        let id = self.next_id();
        let d = match hatch {
            HatchStyle::Horizontal => "M0 4H8",
            HatchStyle::Vertical => "M4 0V8",
            HatchStyle::ForwardDiagonal => "M0 0L8 8",
            HatchStyle::BackwardDiagonal => "M0 8L8 0",
            HatchStyle::Cross => "M0 4H8M4 0V8",
            HatchStyle::DiagonalCross => "M0 0L8 8M0 8L8 0",
        };
        self.pattern_open(id, HATCH_SIZE, HATCH_SIZE);
        if let Some(bg) = background {
            self.out.push_str(r#"<rect width="8" height="8" fill=""#);
            write_color(&mut self.out, bg);
            self.out.push_str("\"/>");
        }
        self.out.push_str(r#"<path d=""#);
        self.out.push_str(d);
        self.out.push_str(r#"" stroke=""#);
        write_color(&mut self.out, color);
        self.out.push_str("\"/></pattern>");
        self.hatches.insert((hatch, color, background), id);
        id
    }

    fn image_pattern(&mut self, image: &Arc<RgbaImage>) -> Option<usize> {
        if let Some((_, id)) = self.images.iter().find(|(i, _)| Arc::ptr_eq(i, image)) {
            return Some(*id);
        }
        let url = png_data_url(image)?;
        let id = self.next_id();
        let (w, h) = (image.width() as i32, image.height() as i32);
        self.pattern_open(id, w, h);
        self.out.push_str("<image");
        write_num_attr(&mut self.out, "width", f64::from(w));
        write_num_attr(&mut self.out, "height", f64::from(h));
        self.out.push_str(r#" href=""#);
        self.out.push_str(&url);
        self.out.push_str("\"/></pattern>");
        self.images.push((Arc::clone(image), id));
        Some(id)
    }

    fn pattern_open(&mut self, id: usize, width: i32, height: i32) {
        self.out.push_str(r#"<pattern id="p"#);
        self.out.push_str(itoa::Buffer::new().format(id));
        self.out.push('"');
        write_num_attr(&mut self.out, "width", f64::from(width));
        write_num_attr(&mut self.out, "height", f64::from(height));
        self.out.push_str(r#" patternUnits="userSpaceOnUse">"#);
    }

    /// `fill` attribute value for the current brush.
    fn brush_fill(&mut self) -> String {
        let brush = self.state.brush.clone();
        let mut value = String::with_capacity(12);
        match brush.style {
            BrushStyle::Null => value.push_str("none"),
            BrushStyle::Solid => write_color(&mut value, brush.color),
            BrushStyle::Hatched(hatch) => {
                let id = self.hatch_pattern(hatch, brush.color);
                value.push_str("url(#p");
                value.push_str(itoa::Buffer::new().format(id));
                value.push(')');
            },
            BrushStyle::Pattern => match brush.pattern.as_ref().and_then(|p| self.image_pattern(p)) {
                Some(id) => {
                    value.push_str("url(#p");
                    value.push_str(itoa::Buffer::new().format(id));
                    value.push(')');
                },
                None => write_color(&mut value, brush.color),
            },
        }
        value
    }

    fn write_transform(&mut self, rotate: Option<(f64, f64, f64)>) {
        let m = self.mapping();
        if m.is_identity() && rotate.is_none() {
            return;
        }
        self.out.push_str(r#" transform=""#);
        if !m.is_identity() {
            self.out.push_str("matrix(");
            for (i, v) in [m.m11, m.m12, m.m21, m.m22, m.dx, m.dy].into_iter().enumerate() {
                if i > 0 {
                    self.out.push(' ');
                }
                write_num(&mut self.out, v);
            }
            self.out.push(')');
        }
        if let Some((deg, x, y)) = rotate {
            if !m.is_identity() {
                self.out.push(' ');
            }
            self.out.push_str("rotate(");
            write_num(&mut self.out, deg);
            self.out.push(' ');
            write_num(&mut self.out, x);
            self.out.push(' ');
            write_num(&mut self.out, y);
            self.out.push(')');
        }
        self.out.push('"');
    }

    /// Whether anything drawn now would reach the output.
    fn drawing(&self) -> bool {
        !self.finished && self.state.composition != CompositionMode::Destination
    }

    /// Start an element: resolves the fill first, since patterns have to be
    /// defined outside the element that uses them.
    fn open(&mut self, tag: &str, fill: Fill) -> Option<String> {
        let fill = match fill {
            Fill::None => None,
            Fill::Brush | Fill::BrushEvenOdd => Some(self.brush_fill()),
        };
        self.sync_clip();
        self.out.push('<');
        self.out.push_str(tag);
        fill
    }

    /// Finish an element opened with [`Self::open`].
    fn close(&mut self, fill: Option<String>, rule: Fill) {
        match fill {
            None => self.out.push_str(r#" fill="none""#),
            Some(value) => {
                self.out.push_str(r#" fill=""#);
                self.out.push_str(&value);
                self.out.push('"');
                if rule == Fill::BrushEvenOdd && value != "none" {
                    self.out.push_str(r#" fill-rule="evenodd""#);
                }
            },
        }
        write_stroke_attrs(&mut self.out, &self.state.pen);
        self.write_transform(None);
        self.out.push_str("/>");
    }

    fn write_points(&mut self, points: &[Point]) {
        self.out.push_str(r#" points=""#);
        for (i, p) in points.iter().enumerate() {
            if i > 0 {
                self.out.push(' ');
            }
            write_num(&mut self.out, f64::from(p.x));
            self.out.push(',');
            write_num(&mut self.out, f64::from(p.y));
        }
        self.out.push('"');
    }

    fn write_xy(&mut self, cmd: char, x: f64, y: f64) {
        self.out.push(cmd);
        write_num(&mut self.out, x);
        self.out.push(' ');
        write_num(&mut self.out, y);
    }

    fn arc(&mut self, rect: Rect, start: i32, sweep: i32, close: ArcClose) {
        if !self.drawing() || sweep == 0 {
            return;
        }
        let r = rect.normalized();
        let rx = f64::from(r.width) / 2.0;
        let ry = f64::from(r.height) / 2.0;
        let fill = if close == ArcClose::Open {
            Fill::None
        } else {
            Fill::Brush
        };
        let value = self.open("path", fill);
        self.out.push_str(r#" d=""#);
        let (x0, y0) = ellipse_point(&r, start);
        if close == ArcClose::Pie {
            self.write_xy('M', f64::from(r.left) + rx, f64::from(r.top) + ry);
            self.write_xy('L', x0, y0);
        } else {
            self.write_xy('M', x0, y0);
        }
        // two halves so a full turn never collapses into a zero-length arc
        for end in [start + sweep / 2, start + sweep] {
            let (x, y) = ellipse_point(&r, end);
            self.out.push('A');
            write_num(&mut self.out, rx);
            self.out.push(' ');
            write_num(&mut self.out, ry);
            self.out.push_str(" 0 0 0 ");
            write_num(&mut self.out, x);
            self.out.push(' ');
            write_num(&mut self.out, y);
        }
        if close != ArcClose::Open {
            self.out.push('Z');
        }
        self.out.push('"');
        self.close(value, fill);
    }

    fn rect_element(&mut self, rect: Rect, round: Option<(f64, f64)>) {
        let r = rect.normalized();
        let value = self.open("rect", Fill::Brush);
        write_num_attr(&mut self.out, "x", f64::from(r.left));
        write_num_attr(&mut self.out, "y", f64::from(r.top));
        write_num_attr(&mut self.out, "width", f64::from(r.width));
        write_num_attr(&mut self.out, "height", f64::from(r.height));
        if let Some((rx, ry)) = round {
            write_num_attr(&mut self.out, "rx", rx);
            write_num_attr(&mut self.out, "ry", ry);
        }
        self.close(value, Fill::Brush);
    }
}

fn png_data_url(image: &RgbaImage) -> Option<String> {
    match dib::encode_png(image) {
        Ok(png) => {
            let mut url = String::from("data:image/png;base64,");
            BASE64.encode_string(png, &mut url);
            Some(url)
        },
        Err(e) => {
            log::debug!("cannot embed bitmap: {e}");
            None
        },
    }
}

impl RenderTarget for SvgTarget {
    fn begin(&mut self, bounding_rect: Rect) -> bool {
        let view = bounding_rect.normalized();
        let view = Rect::new(view.left, view.top, view.width.max(1), view.height.max(1));
        let (width, height) = match self.size {
            Some((w, h)) => (f64::from(w), f64::from(h)),
            None => Self::fit_dimensions(view),
        };

        self.out.clear();
        self.out.reserve(4096);
        self.out.push_str(r#"<svg xmlns="http://www.w3.org/2000/svg""#);
        write_num_attr(&mut self.out, "width", width);
        write_num_attr(&mut self.out, "height", height);
        self.out.push_str(r#" viewBox=""#);
        for (i, v) in [view.left, view.top, view.width, view.height].into_iter().enumerate() {
            if i > 0 {
                self.out.push(' ');
            }
            write_num(&mut self.out, f64::from(v));
        }
        self.out.push_str(r#"" preserveAspectRatio="none">"#);

        self.view = view;
        self.state = SvgState {
            window: bounding_rect,
            ..SvgState::default()
        };
        self.stack.clear();
        self.open_clip = None;
        self.next_id = 0;
        self.hatches.clear();
        self.images.clear();
        self.finished = false;
        true
    }

    fn end(&mut self) {
        if self.finished {
            return;
        }
        if self.open_clip.take().is_some() {
            self.out.push_str("</g>");
        }
        self.out.push_str("</svg>");
        self.stack.clear();
        self.finished = true;
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
        let Some(region) = region else {
            self.state.clip = None;
            self.state.clip_id = None;
            return;
        };
        let id = self.next_id();
        let m = self.mapping();
        self.out.push_str(r#"<clipPath id="c"#);
        self.out.push_str(itoa::Buffer::new().format(id));
        self.out.push_str("\">");
        if !region.is_empty() {
            self.out.push_str(r#"<path d=""#);
            for r in region.rects() {
                let (l, t) = (f64::from(r.left), f64::from(r.top));
                let (rt, b) = (f64::from(r.right()), f64::from(r.bottom()));
                for (i, (x, y)) in [(l, t), (rt, t), (rt, b), (l, b)].into_iter().enumerate() {
                    let (x, y) = m.map(x, y);
                    self.write_xy(if i == 0 { 'M' } else { 'L' }, x, y);
                }
                self.out.push('Z');
            }
            self.out.push_str("\"/>");
        }
        self.out.push_str("</clipPath>");
        self.state.clip = Some(region);
        self.state.clip_id = Some(id);
    }

    fn move_to(&mut self, point: Point) {
        self.state.position = point;
    }

    fn line_to(&mut self, point: Point) {
        let from = std::mem::replace(&mut self.state.position, point);
        if !self.drawing() || self.state.pen.is_null() {
            return;
        }
        let value = self.open("line", Fill::None);
        write_num_attr(&mut self.out, "x1", f64::from(from.x));
        write_num_attr(&mut self.out, "y1", f64::from(from.y));
        write_num_attr(&mut self.out, "x2", f64::from(point.x));
        write_num_attr(&mut self.out, "y2", f64::from(point.y));
        self.close(value, Fill::None);
    }

    fn draw_rect(&mut self, rect: Rect) {
        if self.drawing() {
            self.rect_element(rect, None);
        }
    }

    fn draw_round_rect(&mut self, rect: Rect, x_round: i32, y_round: i32) {
        if !self.drawing() {
            return;
        }
        let r = rect.normalized();
        let rx = f64::from(r.width) / 2.0 * f64::from(x_round.clamp(0, 100)) / 100.0;
        let ry = f64::from(r.height) / 2.0 * f64::from(y_round.clamp(0, 100)) / 100.0;
        self.rect_element(rect, (rx > 0.0 && ry > 0.0).then_some((rx, ry)));
    }

    fn draw_ellipse(&mut self, rect: Rect) {
        if !self.drawing() {
            return;
        }
        let r = rect.normalized();
        let rx = f64::from(r.width) / 2.0;
        let ry = f64::from(r.height) / 2.0;
        let value = self.open("ellipse", Fill::Brush);
        write_num_attr(&mut self.out, "cx", f64::from(r.left) + rx);
        write_num_attr(&mut self.out, "cy", f64::from(r.top) + ry);
        write_num_attr(&mut self.out, "rx", rx);
        write_num_attr(&mut self.out, "ry", ry);
        self.close(value, Fill::Brush);
    }

    fn draw_arc(&mut self, rect: Rect, start_angle: i32, sweep: i32) {
        self.arc(rect, start_angle, sweep, ArcClose::Open);
    }

    fn draw_pie(&mut self, rect: Rect, start_angle: i32, sweep: i32) {
        self.arc(rect, start_angle, sweep, ArcClose::Pie);
    }

    fn draw_chord(&mut self, rect: Rect, start_angle: i32, sweep: i32) {
        self.arc(rect, start_angle, sweep, ArcClose::Chord);
    }

    fn draw_polyline(&mut self, points: &[Point]) {
        if !self.drawing() || points.len() < 2 {
            return;
        }
        let value = self.open("polyline", Fill::None);
        self.write_points(points);
        self.close(value, Fill::None);
    }

    fn draw_polygon(&mut self, points: &[Point], winding: bool) {
        if !self.drawing() || points.is_empty() {
            return;
        }
        let rule = if winding { Fill::Brush } else { Fill::BrushEvenOdd };
        let value = self.open("polygon", rule);
        self.write_points(points);
        self.close(value, rule);
    }

    fn draw_poly_polygon(&mut self, polygons: &[Vec<Point>], _winding: bool) {
        if !self.drawing() || polygons.iter().all(Vec::is_empty) {
            return;
        }
        let rule = Fill::BrushEvenOdd;
        let value = self.open("path", rule);
        self.out.push_str(r#" d=""#);
        for polygon in polygons.iter().filter(|p| !p.is_empty()) {
            for (i, p) in polygon.iter().enumerate() {
                let cmd = if i == 0 { 'M' } else { 'L' };
                self.write_xy(cmd, f64::from(p.x), f64::from(p.y));
            }
            self.out.push('Z');
        }
        self.out.push('"');
        self.close(value, rule);
    }

    fn draw_image(&mut self, dest: Rect, image: &RgbaImage, source: Rect) -> bool {
        if !self.drawing() {
            return true;
        }
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
        let Some(url) = png_data_url(&cropped) else {
            return false;
        };

        let dest = dest.normalized();
        let sx = f64::from(dest.width) / f64::from(source.width);
        let sy = f64::from(dest.height) / f64::from(source.height);
        let _ = self.open("image", Fill::None);
        write_num_attr(&mut self.out, "x", f64::from(dest.left) + f64::from(visible.left - source.left) * sx);
        write_num_attr(&mut self.out, "y", f64::from(dest.top) + f64::from(visible.top - source.top) * sy);
        write_num_attr(&mut self.out, "width", f64::from(visible.width) * sx);
        write_num_attr(&mut self.out, "height", f64::from(visible.height) * sy);
        self.out.push_str(r#" preserveAspectRatio="none" href=""#);
        self.out.push_str(&url);
        self.out.push('"');
        self.write_transform(None);
        self.out.push_str("/>");
        true
    }

    fn draw_text(&mut self, run: &TextRun) -> bool {
        if !self.drawing() {
            return true;
        }
        if run.options.contains(ExtTextOutOptions::OPAQUE)
            && let Some(rect) = run.rect
        {
            let r = rect.normalized();
            self.sync_clip();
            self.out.push_str("<rect");
            write_num_attr(&mut self.out, "x", f64::from(r.left));
            write_num_attr(&mut self.out, "y", f64::from(r.top));
            write_num_attr(&mut self.out, "width", f64::from(r.width));
            write_num_attr(&mut self.out, "height", f64::from(r.height));
            self.out.push_str(r#" fill=""#);
            let bk = self.state.bk_color;
            write_color(&mut self.out, bk);
            self.out.push('"');
            self.write_transform(None);
            self.out.push_str("/>");
        }
        if run.text.is_empty() {
            return true;
        }

        let (x, y) = (f64::from(run.position.x), f64::from(run.position.y));
        self.sync_clip();
        self.out.push_str("<text");
        let horizontal = run.align.horizontal();
        if horizontal == HorizontalAlign::Left && !run.dx.is_empty() {
            // explicit advances: one x per character
            self.out.push_str(r#" x=""#);
            let mut cx = x;
            for (i, _) in run.text.chars().enumerate() {
                if i > 0 {
                    self.out.push(' ');
                }
                write_num(&mut self.out, cx);
                cx += f64::from(run.dx.get(i).copied().unwrap_or(0));
            }
            self.out.push('"');
        } else {
            write_num_attr(&mut self.out, "x", x);
        }
        write_num_attr(&mut self.out, "y", y);
        write_font_attrs(&mut self.out, &self.state.font);
        if run.color != Color::BLACK {
            self.out.push_str(r#" fill=""#);
            write_color(&mut self.out, run.color);
            self.out.push('"');
        }
        match horizontal {
            HorizontalAlign::Left => {},
            HorizontalAlign::Center => self.out.push_str(r#" text-anchor="middle""#),
            HorizontalAlign::Right => self.out.push_str(r#" text-anchor="end""#),
        }
        match run.align.vertical() {
            VerticalAlign::Baseline => {},
            VerticalAlign::Top => self.out.push_str(r#" dominant-baseline="hanging""#),
            VerticalAlign::Bottom => self.out.push_str(r#" dominant-baseline="text-after-edge""#),
        }
        let rotate = (run.rotation != 0.0).then_some((run.rotation, x, y));
        self.write_transform(rotate);
        self.out.push('>');
        write_xml_escaped(&mut self.out, &run.text);
        self.out.push_str("</text>");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wmf::objects::{PenStyle, TextAlign};

    fn target() -> SvgTarget {
        let mut t = SvgTarget::with_size(100, 100);
        assert!(t.begin(Rect::new(0, 0, 100, 100)));
        t
    }

    fn finish(mut t: SvgTarget) -> String {
        t.end();
        assert!(t.is_finished());
        t.into_string()
    }

    fn run(text: &str) -> TextRun {
        TextRun {
            position: Point::new(10, 20),
            text: text.to_string(),
            align: TextAlign::BASELINE,
            color: Color::BLACK,
            rotation: 0.0,
            options: ExtTextOutOptions::empty(),
            rect: None,
            dx: Vec::new(),
        }
    }

    #[test]
    fn test_document_shell() {
        let svg = finish(target());
        assert!(svg.starts_with("<svg "));
        assert!(svg.contains(r#"viewBox="0 0 100 100""#));
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn test_fit_dimensions() {
        assert_eq!(SvgTarget::fit_dimensions(Rect::new(0, 0, 200, 100)), (768.0, 384.0));
        assert_eq!(SvgTarget::fit_dimensions(Rect::new(0, 0, 100, 200)), (256.0, 512.0));
        assert_eq!(SvgTarget::fit_dimensions(Rect::new(0, 0, 0, 0)), (768.0, 512.0));
    }

    #[test]
    fn test_rect_attributes() {
        let mut t = target();
        t.set_brush(&Brush::solid(Color::rgb(255, 0, 0)));
        t.set_pen(&Pen::new(PenStyle::Null, 0, Color::BLACK));
        t.draw_rect(Rect::new(10, 20, 30, 40));
        let svg = finish(t);
        assert!(svg.contains(r##"<rect x="10" y="20" width="30" height="40" fill="#ff0000" stroke="none"/>"##));
    }

    #[test]
    fn test_window_change_becomes_transform() {
        let mut t = target();
        t.set_window_ext(50, 50);
        t.draw_ellipse(Rect::new(0, 0, 10, 10));
        let svg = finish(t);
        assert!(svg.contains(r#"transform="matrix(2 0 0 2 0 0)""#));
    }

    #[test]
    fn test_polygon_fill_rule() {
        let mut t = target();
        let pts = [Point::new(0, 0), Point::new(10, 0), Point::new(0, 10)];
        t.draw_polygon(&pts, false);
        t.draw_polygon(&pts, true);
        let svg = finish(t);
        assert_eq!(svg.matches(r#"fill-rule="evenodd""#).count(), 1);
    }

    #[test]
    fn test_poly_polygon_is_even_odd_in_winding_mode() {
        let mut t = target();
        let square = vec![
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(10, 10),
            Point::new(0, 10),
        ];
        t.draw_poly_polygon(&[square.clone(), square], true);
        let svg = finish(t);
        assert_eq!(svg.matches(r#"fill-rule="evenodd""#).count(), 1);
    }

    #[test]
    fn test_viewport_becomes_transform() {
        let mut t = target();
        t.set_viewport_ext(100, 100);
        t.set_viewport_org(Point::new(20, 0));
        t.draw_ellipse(Rect::new(0, 0, 10, 10));
        t.set_viewport_org(Point::new(0, 0));
        t.set_viewport_ext(50, 50);
        t.draw_ellipse(Rect::new(0, 0, 10, 10));
        let svg = finish(t);
        assert!(svg.contains(r#"transform="matrix(1 0 0 1 20 0)""#));
        assert!(svg.contains(r#"transform="matrix(0.5 0 0 0.5 0 0)""#));
    }

    #[test]
    fn test_clip_group() {
        let mut t = target();
        t.set_clip_region(Some(Region::from_rect(Rect::new(0, 0, 50, 50))));
        t.draw_rect(Rect::new(0, 0, 100, 100));
        t.set_clip_region(None);
        t.draw_rect(Rect::new(0, 0, 10, 10));
        let svg = finish(t);
        assert!(svg.contains(r#"<clipPath id="c0"><path d="M0 0L50 0L50 50L0 50Z"/></clipPath>"#));
        assert!(svg.contains(r#"<g clip-path="url(#c0)"><rect"#));
        assert_eq!(svg.matches("</g>").count(), 1);
    }

    #[test]
    fn test_restore_reopens_clip() {
        let mut t = target();
        t.save();
        t.set_clip_region(Some(Region::from_rect(Rect::new(0, 0, 50, 50))));
        t.draw_rect(Rect::new(0, 0, 10, 10));
        t.restore();
        assert!(t.clip_region().is_none());
        t.draw_rect(Rect::new(0, 0, 10, 10));
        let svg = finish(t);
        assert_eq!(svg.matches("<g ").count(), svg.matches("</g>").count());
    }

    #[test]
    fn test_hatch_pattern_is_shared() {
        let mut t = target();
        t.set_brush(&Brush {
            style: BrushStyle::Hatched(HatchStyle::Cross),
            ..Brush::solid(Color::BLACK)
        });
        t.draw_rect(Rect::new(0, 0, 10, 10));
        t.draw_rect(Rect::new(20, 0, 10, 10));
        let svg = finish(t);
        assert_eq!(svg.matches("<pattern").count(), 1);
        assert_eq!(svg.matches(r#"fill="url(#p0)""#).count(), 2);
    }

    #[test]
    fn test_full_circle_arc() {
        let mut t = target();
        t.draw_arc(Rect::new(0, 0, 100, 100), 0, 360 * 16);
        let svg = finish(t);
        assert_eq!(svg.matches("A50 50").count(), 2);
        assert!(svg.contains("M100 50A50 50 0 0 0 0 50A50 50 0 0 0 100 50"));
    }

    #[test]
    fn test_text_escaped_and_rotated() {
        let mut t = target();
        let mut r = run("a<b");
        r.rotation = 90.0;
        r.align = TextAlign::CENTER | TextAlign::BASELINE;
        assert!(t.draw_text(&r));
        let svg = finish(t);
        assert!(svg.contains(r#"text-anchor="middle""#));
        assert!(svg.contains(r#"transform="rotate(90 10 20)""#));
        assert!(svg.contains(">a&lt;b</text>"));
    }

    #[test]
    fn test_image_embedded() {
        let mut t = target();
        let image = RgbaImage::from_pixel(2, 2, image::Rgba([0, 0, 255, 255]));
        assert!(t.draw_image(Rect::new(0, 0, 20, 20), &image, Rect::new(0, 0, 2, 2)));
        let svg = finish(t);
        assert!(svg.contains(r#"href="data:image/png;base64,"#));
        assert!(svg.contains(r#"width="20" height="20""#));
    }

    #[test]
    fn test_destination_mode_draws_nothing() {
        let mut t = target();
        t.set_composition_mode(CompositionMode::Destination);
        t.draw_rect(Rect::new(0, 0, 10, 10));
        let svg = finish(t);
        assert!(!svg.contains("<rect"));
    }
}
