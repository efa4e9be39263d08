// Pen, brush and composition conversions for the raster backend

use image::RgbaImage;
use tiny_skia::{
    BlendMode, FilterQuality, IntSize, LineCap, LineJoin, Paint, Pattern, Pixmap, SpreadMode,
    Stroke, StrokeDash, Transform,
};

use crate::wmf::objects::{
    BackgroundMode, Brush, BrushStyle, Color, CompositionMode, HatchStyle, Pen,
};

/// Side of the square hatch tile in device pixels.
const HATCH_SIZE: u32 = 8;

pub fn sk_color(color: Color) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba8(color.r, color.g, color.b, 255)
}

pub fn blend_mode(mode: CompositionMode) -> BlendMode {
    match mode {
        CompositionMode::Source => BlendMode::Source,
        CompositionMode::SourceOver => BlendMode::SourceOver,
        CompositionMode::SourceIn => BlendMode::SourceIn,
        CompositionMode::SourceOut => BlendMode::SourceOut,
        CompositionMode::Destination => BlendMode::Destination,
        CompositionMode::DestinationOut => BlendMode::DestinationOut,
        CompositionMode::Clear => BlendMode::Clear,
        CompositionMode::Xor => BlendMode::Xor,
    }
}

pub fn solid_paint(color: Color, blend: BlendMode) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(sk_color(color));
    paint.blend_mode = blend;
    paint.anti_alias = true;
    paint
}

/// Round caps and joins; width 0 is a device hairline.
pub fn stroke(pen: &Pen) -> Stroke {
    let mut stroke = Stroke {
        width: f32::from(pen.width),
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };
    if let Some(pattern) = pen.style.dash_pattern() {
        let unit = f32::from(pen.width.max(1));
        let dashes = pattern.iter().map(|d| d * unit).collect();
        stroke.dash = StrokeDash::new(dashes, 0.0);
    }
    stroke
}

/// Whether the hatch tile pixel at `(x, y)` is part of a line.
fn hatch_hit(style: HatchStyle, x: u32, y: u32) -> bool {
    let last = HATCH_SIZE - 1;
    match style {
        HatchStyle::Horizontal => y == last / 2,
        HatchStyle::Vertical => x == last / 2,
        HatchStyle::ForwardDiagonal => x == y,
        HatchStyle::BackwardDiagonal => x + y == last,
        HatchStyle::Cross => x == last / 2 || y == last / 2,
        HatchStyle::DiagonalCross => x == y || x + y == last,
    }
}

/// Hatch tile: lines in `color`, gaps in `background` or transparent.
pub fn hatch_tile(style: HatchStyle, color: Color, background: Option<Color>) -> Option<Pixmap> {
    let mut image = RgbaImage::new(HATCH_SIZE, HATCH_SIZE);
    for (x, y, px) in image.enumerate_pixels_mut() {
        *px = if hatch_hit(style, x, y) {
            image::Rgba([color.r, color.g, color.b, 255])
        } else if let Some(bg) = background {
            image::Rgba([bg.r, bg.g, bg.b, 255])
        } else {
            image::Rgba([0, 0, 0, 0])
        };
    }
    pixmap_from_image(&image)
}

/// Premultiply an RGBA image into a pixmap.
pub fn pixmap_from_image(image: &RgbaImage) -> Option<Pixmap> {
    let size = IntSize::from_wh(image.width(), image.height())?;
    let mut data = image.as_raw().clone();
    for px in data.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        for c in &mut px[..3] {
            *c = ((u16::from(*c) * a + 127) / 255) as u8;
        }
    }
    Pixmap::from_vec(data, size)
}

/// Undo premultiplication.
pub fn image_from_pixmap(pixmap: &Pixmap) -> RgbaImage {
    let mut image = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in image.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = image::Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    image
}

/// Fill source for a brush.
pub enum BrushFill {
    Solid(Color),
    Tiled(Pixmap),
}

impl BrushFill {
    pub fn new(brush: &Brush, bk_color: Color, bk_mode: BackgroundMode) -> Option<Self> {
        match brush.style {
            BrushStyle::Null => None,
            BrushStyle::Solid => Some(Self::Solid(brush.color)),
            BrushStyle::Hatched(hatch) => {
                let background = (bk_mode == BackgroundMode::Opaque).then_some(bk_color);
                hatch_tile(hatch, brush.color, background).map(Self::Tiled)
            },
            BrushStyle::Pattern => match brush.pattern.as_deref() {
                Some(image) => pixmap_from_image(image).map(Self::Tiled),
                None => Some(Self::Solid(brush.color)),
            },
        }
    }

    /// `device` is the transform the fill will use; tiles are placed through
    /// its inverse so they stay aligned to device pixels.
    pub fn paint(&self, blend: BlendMode, device: Transform) -> Paint<'_> {
        match self {
            Self::Solid(color) => solid_paint(*color, blend),
            Self::Tiled(tile) => {
                let mut paint = Paint::default();
                paint.shader = Pattern::new(
                    tile.as_ref(),
                    SpreadMode::Repeat,
                    FilterQuality::Nearest,
                    1.0,
                    device.invert().unwrap_or_default(),
                );
                paint.blend_mode = blend;
                paint.anti_alias = false;
                paint
            },
        }
    }
}
