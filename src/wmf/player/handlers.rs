// Record handlers
//
// Parameter layouts follow the on-disk order, which for most single-point
// and rectangle records is reversed (y before x, bottom-right before
// top-left). Truncated parameters surface as `TruncatedRecord` and the
// dispatcher skips the record.

use std::f64::consts::PI;

use crate::common::binary::{BinaryResult, parse_windows1252_string};
use crate::common::error::Result;
use crate::wmf::constants::{bk_mode, fill_mode};
use crate::wmf::dib;
use crate::wmf::geometry::{Point, Rect, Region};
use crate::wmf::handles::{ObjectSlot, OpaqueKind};
use crate::wmf::objects::{
    BackgroundMode, Brush, Color, CompositionMode, ExtTextOutOptions, Font, Pen, PenStyle,
    TextAlign,
};
use crate::wmf::record::Record;
use crate::wmf::target::{RenderTarget, TextRun};
use crate::wmf::transform::Matrix;

use super::InterpreterContext;

/// Longest face name a LOGFONT can carry.
const FACE_NAME_LEN: usize = 32;

/// Convert start/end vectors (y pointing up) to a 1/16 degree start angle
/// and a non-negative sweep.
///
/// Coinciding start and end vectors give a full turn.
pub(crate) fn xy_to_angle(xs: i32, ys: i32, xe: i32, ye: i32) -> (i32, i32) {
    const TO_SIXTEENTHS: f64 = 2880.0 / PI;
    let start = f64::from(ys).atan2(f64::from(xs));
    let end = f64::from(ye).atan2(f64::from(xe));
    let angle = (start * TO_SIXTEENTHS).round() as i32;
    let mut sweep = ((end - start) * TO_SIXTEENTHS).round() as i32;
    if sweep <= 0 {
        sweep += 5760;
    }
    (angle, sweep)
}

fn add_object(ctx: &mut InterpreterContext<'_>, object: ObjectSlot) {
    if ctx.report.stack_overflow {
        log::debug!("object table overflowed earlier, creation dropped");
        return;
    }
    match ctx.handles.create(object) {
        Ok(handle) => log::trace!("object stored in slot {handle}"),
        Err(e) => {
            log::warn!("{e}; further object creation disabled");
            ctx.report.stack_overflow = true;
        },
    }
}

pub(super) fn ignore(
    _ctx: &mut InterpreterContext<'_>,
    _target: &mut dyn RenderTarget,
    record: &Record<'_>,
) -> Result<()> {
    log::debug!("function 0x{:04X} ignored", record.function);
    Ok(())
}

pub(super) fn end(
    _ctx: &mut InterpreterContext<'_>,
    _target: &mut dyn RenderTarget,
    _record: &Record<'_>,
) -> Result<()> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Drawing state
// ---------------------------------------------------------------------------

pub(super) fn set_bk_color(
    _ctx: &mut InterpreterContext<'_>,
    target: &mut dyn RenderTarget,
    record: &Record<'_>,
) -> Result<()> {
    let color = record.params().u32()?;
    target.set_background_color(Color::from_colorref(color));
    Ok(())
}

pub(super) fn set_bk_mode(
    _ctx: &mut InterpreterContext<'_>,
    target: &mut dyn RenderTarget,
    record: &Record<'_>,
) -> Result<()> {
    let mode = match record.params().u16()? {
        bk_mode::TRANSPARENT => BackgroundMode::Transparent,
        _ => BackgroundMode::Opaque,
    };
    target.set_background_mode(mode);
    Ok(())
}

pub(super) fn set_rop(
    _ctx: &mut InterpreterContext<'_>,
    target: &mut dyn RenderTarget,
    record: &Record<'_>,
) -> Result<()> {
    let rop = record.params().u16()?;
    target.set_composition_mode(CompositionMode::from_rop2(rop));
    Ok(())
}

pub(super) fn set_poly_fill_mode(
    ctx: &mut InterpreterContext<'_>,
    _target: &mut dyn RenderTarget,
    record: &Record<'_>,
) -> Result<()> {
    ctx.winding = record.params().u16()? == fill_mode::WINDING;
    Ok(())
}

pub(super) fn set_text_color(
    ctx: &mut InterpreterContext<'_>,
    _target: &mut dyn RenderTarget,
    record: &Record<'_>,
) -> Result<()> {
    ctx.text_color = Color::from_colorref(record.params().u32()?);
    Ok(())
}

pub(super) fn set_text_align(
    ctx: &mut InterpreterContext<'_>,
    _target: &mut dyn RenderTarget,
    record: &Record<'_>,
) -> Result<()> {
    ctx.text_align = TextAlign::from_bits_retain(record.params().u16()?);
    Ok(())
}

pub(super) fn save_dc(
    ctx: &mut InterpreterContext<'_>,
    target: &mut dyn RenderTarget,
    _record: &Record<'_>,
) -> Result<()> {
    target.save();
    ctx.save_depth += 1;
    Ok(())
}

/// Negative counts pop that many levels; a positive count names the saved
/// instance to return to.
pub(super) fn restore_dc(
    ctx: &mut InterpreterContext<'_>,
    target: &mut dyn RenderTarget,
    record: &Record<'_>,
) -> Result<()> {
    let n = record.params().i16()?;
    let levels = match n {
        n if n < 0 => usize::from(n.unsigned_abs()),
        n if n > 0 => {
            let instance = n as usize;
            if instance <= ctx.save_depth {
                ctx.save_depth - instance + 1
            } else {
                0
            }
        },
        _ => 0,
    };
    let levels = levels.min(ctx.save_depth);
    if levels == 0 {
        log::debug!("restoreDC({n}) with save depth {}, ignored", ctx.save_depth);
    }
    for _ in 0..levels {
        target.restore();
    }
    ctx.save_depth -= levels;
    Ok(())
}

// ---------------------------------------------------------------------------
// Window and clipping
// ---------------------------------------------------------------------------

pub(super) fn set_window_org(
    ctx: &mut InterpreterContext<'_>,
    target: &mut dyn RenderTarget,
    record: &Record<'_>,
) -> Result<()> {
    let origin = record.params().point_yx()?;
    let calls = ctx.transform.set_origin(origin.x, origin.y);
    InterpreterContext::apply(target, calls);
    Ok(())
}

pub(super) fn set_window_ext(
    ctx: &mut InterpreterContext<'_>,
    target: &mut dyn RenderTarget,
    record: &Record<'_>,
) -> Result<()> {
    let mut p = record.params();
    let height = p.coord()?;
    let width = p.coord()?;
    let calls = ctx.transform.set_extent(width, height);
    InterpreterContext::apply(target, calls);
    Ok(())
}

pub(super) fn offset_window_org(
    ctx: &mut InterpreterContext<'_>,
    target: &mut dyn RenderTarget,
    record: &Record<'_>,
) -> Result<()> {
    let offset = record.params().point_yx()?;
    let calls = ctx.transform.offset_origin(offset.x, offset.y);
    InterpreterContext::apply(target, calls);
    Ok(())
}

pub(super) fn scale_window_ext(
    ctx: &mut InterpreterContext<'_>,
    target: &mut dyn RenderTarget,
    record: &Record<'_>,
) -> Result<()> {
    let mut p = record.params();
    let y_den = p.coord()?;
    let y_num = p.coord()?;
    let x_den = p.coord()?;
    let x_num = p.coord()?;
    let calls = ctx.transform.scale_extent(x_num, x_den, y_num, y_den);
    InterpreterContext::apply(target, calls);
    Ok(())
}

pub(super) fn set_viewport_org(
    ctx: &mut InterpreterContext<'_>,
    target: &mut dyn RenderTarget,
    record: &Record<'_>,
) -> Result<()> {
    let origin = record.params().point_yx()?;
    ctx.viewport.set_origin(origin);
    target.set_viewport_org(origin);
    Ok(())
}

pub(super) fn set_viewport_ext(
    ctx: &mut InterpreterContext<'_>,
    target: &mut dyn RenderTarget,
    record: &Record<'_>,
) -> Result<()> {
    let mut p = record.params();
    let height = p.coord()?;
    let width = p.coord()?;
    ctx.viewport.set_extent(width, height);
    target.set_viewport_ext(width, height);
    Ok(())
}

pub(super) fn offset_viewport_org(
    ctx: &mut InterpreterContext<'_>,
    target: &mut dyn RenderTarget,
    record: &Record<'_>,
) -> Result<()> {
    let offset = record.params().point_yx()?;
    let current = ctx.viewport.origin();
    let origin = Point::new(
        current.x.saturating_add(offset.x),
        current.y.saturating_add(offset.y),
    );
    ctx.viewport.set_origin(origin);
    target.set_viewport_org(origin);
    Ok(())
}

/// Scales the viewport extent, or the window extent while no viewport
/// extent has been set.
pub(super) fn scale_viewport_ext(
    ctx: &mut InterpreterContext<'_>,
    target: &mut dyn RenderTarget,
    record: &Record<'_>,
) -> Result<()> {
    let mut p = record.params();
    let y_den = p.coord()?;
    let y_num = p.coord()?;
    let x_den = p.coord()?;
    let x_num = p.coord()?;
    if x_den == 0 || y_den == 0 {
        return Ok(());
    }
    let window = ctx.transform.window();
    let (width, height) = ctx
        .viewport
        .extent()
        .unwrap_or((window.width, window.height));
    let scale = |extent: i32, num: i32, den: i32| {
        let v = i64::from(extent) * i64::from(num) / i64::from(den);
        v.clamp(i64::from(i16::MIN), i64::from(i16::MAX)) as i32
    };
    let width = scale(width, x_num, x_den);
    let height = scale(height, y_num, y_den);
    ctx.viewport.set_extent(width, height);
    target.set_viewport_ext(width, height);
    Ok(())
}

pub(super) fn intersect_clip_rect(
    _ctx: &mut InterpreterContext<'_>,
    target: &mut dyn RenderTarget,
    record: &Record<'_>,
) -> Result<()> {
    let rect = record.params().rect_brtl()?;
    let region = match target.clip_region() {
        Some(clip) => clip.intersect(&rect),
        None => Region::from_rect(rect),
    };
    target.set_clip_region(Some(region));
    Ok(())
}

pub(super) fn exclude_clip_rect(
    ctx: &mut InterpreterContext<'_>,
    target: &mut dyn RenderTarget,
    record: &Record<'_>,
) -> Result<()> {
    let rect = record.params().rect_brtl()?;
    let clip = target
        .clip_region()
        .unwrap_or_else(|| Region::from_rect(ctx.transform.window()));
    target.set_clip_region(Some(clip.subtract(&rect)));
    Ok(())
}

// ---------------------------------------------------------------------------
// Lines and shapes
// ---------------------------------------------------------------------------

pub(super) fn move_to(
    ctx: &mut InterpreterContext<'_>,
    target: &mut dyn RenderTarget,
    record: &Record<'_>,
) -> Result<()> {
    let point = record.params().point_yx()?;
    target.move_to(point);
    ctx.position = point;
    Ok(())
}

pub(super) fn line_to(
    ctx: &mut InterpreterContext<'_>,
    target: &mut dyn RenderTarget,
    record: &Record<'_>,
) -> Result<()> {
    let point = record.params().point_yx()?;
    target.line_to(point);
    ctx.position = point;
    Ok(())
}

/// A one-point line in the pixel's color; pen and position are restored.
pub(super) fn set_pixel(
    ctx: &mut InterpreterContext<'_>,
    target: &mut dyn RenderTarget,
    record: &Record<'_>,
) -> Result<()> {
    let mut p = record.params();
    let color = Color::from_colorref(p.u32()?);
    let point = p.point_yx()?;

    let previous = target.pen();
    target.set_pen(&Pen::new(PenStyle::Solid, 0, color));
    target.move_to(point);
    target.line_to(point);
    target.set_pen(&previous);
    target.move_to(ctx.position);
    Ok(())
}

pub(super) fn rectangle(
    _ctx: &mut InterpreterContext<'_>,
    target: &mut dyn RenderTarget,
    record: &Record<'_>,
) -> Result<()> {
    target.draw_rect(record.params().rect_brtl()?);
    Ok(())
}

pub(super) fn round_rect(
    _ctx: &mut InterpreterContext<'_>,
    target: &mut dyn RenderTarget,
    record: &Record<'_>,
) -> Result<()> {
    let mut p = record.params();
    let corner_h = p.coord()?;
    let corner_w = p.coord()?;
    let rect = p.rect_brtl()?;

    let percent = |corner: i32, extent: i32| {
        if extent == 0 { 0 } else { corner * 100 / extent }
    };
    target.draw_round_rect(
        rect,
        percent(corner_w, rect.width),
        percent(corner_h, rect.height),
    );
    Ok(())
}

pub(super) fn ellipse(
    _ctx: &mut InterpreterContext<'_>,
    target: &mut dyn RenderTarget,
    record: &Record<'_>,
) -> Result<()> {
    target.draw_ellipse(record.params().rect_brtl()?);
    Ok(())
}

/// Decode the shared arc/pie/chord layout: end point, start point, bounds.
fn arc_params(record: &Record<'_>) -> Result<(Rect, i32, i32)> {
    let mut p = record.params();
    let end = p.point_yx()?;
    let start = p.point_yx()?;
    let rect = p.rect_brtl()?;

    let xc = rect.left + rect.width / 2;
    let yc = rect.top + rect.height / 2;
    let (angle, sweep) = xy_to_angle(start.x - xc, yc - start.y, end.x - xc, yc - end.y);
    Ok((rect, angle, sweep))
}

pub(super) fn arc(
    _ctx: &mut InterpreterContext<'_>,
    target: &mut dyn RenderTarget,
    record: &Record<'_>,
) -> Result<()> {
    let (rect, angle, sweep) = arc_params(record)?;
    target.draw_arc(rect, angle, sweep);
    Ok(())
}

pub(super) fn pie(
    _ctx: &mut InterpreterContext<'_>,
    target: &mut dyn RenderTarget,
    record: &Record<'_>,
) -> Result<()> {
    let (rect, angle, sweep) = arc_params(record)?;
    target.draw_pie(rect, angle, sweep);
    Ok(())
}

pub(super) fn chord(
    _ctx: &mut InterpreterContext<'_>,
    target: &mut dyn RenderTarget,
    record: &Record<'_>,
) -> Result<()> {
    let (rect, angle, sweep) = arc_params(record)?;
    target.draw_chord(rect, angle, sweep);
    Ok(())
}

pub(super) fn polygon(
    ctx: &mut InterpreterContext<'_>,
    target: &mut dyn RenderTarget,
    record: &Record<'_>,
) -> Result<()> {
    let mut p = record.params();
    let count = usize::from(p.u16()?);
    let points = p.points(count)?;
    target.draw_polygon(&points, ctx.winding);
    Ok(())
}

pub(super) fn polyline(
    _ctx: &mut InterpreterContext<'_>,
    target: &mut dyn RenderTarget,
    record: &Record<'_>,
) -> Result<()> {
    let mut p = record.params();
    let count = usize::from(p.u16()?);
    let points = p.points(count)?;
    target.draw_polyline(&points);
    Ok(())
}

pub(super) fn poly_polygon(
    ctx: &mut InterpreterContext<'_>,
    target: &mut dyn RenderTarget,
    record: &Record<'_>,
) -> Result<()> {
    let mut p = record.params();
    let count = usize::from(p.u16()?);
    let sizes = (0..count)
        .map(|_| p.u16().map(usize::from))
        .collect::<BinaryResult<Vec<_>>>()?;
    let polygons = sizes
        .into_iter()
        .map(|n| p.points(n))
        .collect::<BinaryResult<Vec<_>>>()?;
    target.draw_poly_polygon(&polygons, ctx.winding);
    Ok(())
}

// ---------------------------------------------------------------------------
// Text
// ---------------------------------------------------------------------------

fn emit_text(
    ctx: &mut InterpreterContext<'_>,
    target: &mut dyn RenderTarget,
    position: Point,
    bytes: &[u8],
    options: ExtTextOutOptions,
    rect: Option<Rect>,
    dx: Vec<i32>,
) {
    let text = parse_windows1252_string(bytes);
    let update_cp = ctx.text_align.updates_current_position();
    let run = TextRun {
        position: if update_cp { ctx.position } else { position },
        text,
        align: ctx.text_align,
        color: ctx.text_color,
        rotation: ctx.font.rotation(),
        options,
        rect,
        dx,
    };
    if !target.draw_text(&run) {
        log::debug!("text run {:?} not drawn", run.text);
    }
    if update_cp {
        let advance = run.dx.iter().fold(0i32, |sum, d| sum.saturating_add(*d));
        ctx.position.x = ctx.position.x.saturating_add(advance);
    }
}

pub(super) fn text_out(
    ctx: &mut InterpreterContext<'_>,
    target: &mut dyn RenderTarget,
    record: &Record<'_>,
) -> Result<()> {
    let mut p = record.params();
    let count = usize::from(p.u16()?);
    let bytes = p.bytes(count)?;
    if count % 2 == 1 {
        p.skip(1)?;
    }
    let position = p.point_yx()?;
    emit_text(
        ctx,
        target,
        position,
        bytes,
        ExtTextOutOptions::empty(),
        None,
        Vec::new(),
    );
    Ok(())
}

pub(super) fn ext_text_out(
    ctx: &mut InterpreterContext<'_>,
    target: &mut dyn RenderTarget,
    record: &Record<'_>,
) -> Result<()> {
    let mut p = record.params();
    let position = p.point_yx()?;
    let count = usize::from(p.u16()?);
    let options = ExtTextOutOptions::from_bits_retain(p.u16()?);
    let rect = if options.has_rect() {
        Some(p.rect_ltrb()?)
    } else {
        None
    };
    let bytes = p.bytes(count)?;
    if count % 2 == 1 && p.skip(1).is_err() {
        log::trace!("extTextOut string not padded");
    }
    let dx = if p.remaining().len() >= count * 2 {
        (0..count).map(|_| p.coord()).collect::<BinaryResult<Vec<_>>>()?
    } else {
        Vec::new()
    };
    emit_text(ctx, target, position, bytes, options, rect, dx);
    Ok(())
}

// ---------------------------------------------------------------------------
// Objects
// ---------------------------------------------------------------------------

pub(super) fn select_object(
    ctx: &mut InterpreterContext<'_>,
    target: &mut dyn RenderTarget,
    record: &Record<'_>,
) -> Result<()> {
    let handle = record.params().u16()?;
    let object = match ctx.handles.get(handle) {
        Ok(object) => object.clone(),
        Err(e) => {
            log::debug!("selectObject: {e}");
            ctx.report.dangling_handles += 1;
            return Ok(());
        },
    };
    match object {
        ObjectSlot::Pen(pen) => target.set_pen(&pen),
        ObjectSlot::Brush(brush) | ObjectSlot::PatternBrush(brush) => target.set_brush(&brush),
        ObjectSlot::Font(font) => {
            target.set_font(&font);
            ctx.font = font;
        },
        ObjectSlot::Opaque(kind) => {
            log::debug!("selected {kind:?} placeholder, default pen applied");
            target.set_pen(&Pen::default());
        },
        ObjectSlot::Empty => {},
    }
    Ok(())
}

pub(super) fn delete_object(
    ctx: &mut InterpreterContext<'_>,
    _target: &mut dyn RenderTarget,
    record: &Record<'_>,
) -> Result<()> {
    let handle = record.params().u16()?;
    if !ctx.handles.delete(handle) {
        log::debug!("deleteObject: handle {handle} is not in use");
        ctx.report.dangling_handles += 1;
    }
    Ok(())
}

pub(super) fn create_pen_indirect(
    ctx: &mut InterpreterContext<'_>,
    _target: &mut dyn RenderTarget,
    record: &Record<'_>,
) -> Result<()> {
    let mut p = record.params();
    let style = p.u16()?;
    let width = p.i16()?;
    let _width_y = p.i16()?;
    let color = p.u32()?;
    // cap and join bits live above the style nibble
    let pen = Pen::from_wmf(style & 0x0F, width.max(0).unsigned_abs(), color);
    add_object(ctx, ObjectSlot::Pen(pen));
    Ok(())
}

pub(super) fn create_brush_indirect(
    ctx: &mut InterpreterContext<'_>,
    _target: &mut dyn RenderTarget,
    record: &Record<'_>,
) -> Result<()> {
    let mut p = record.params();
    let style = p.u16()?;
    let color = p.u32()?;
    let hatch = p.u16()?;
    add_object(ctx, ObjectSlot::Brush(Brush::from_wmf(style, color, hatch)));
    Ok(())
}

pub(super) fn create_font_indirect(
    ctx: &mut InterpreterContext<'_>,
    _target: &mut dyn RenderTarget,
    record: &Record<'_>,
) -> Result<()> {
    let mut p = record.params();
    let height = p.i16()?;
    let width = p.i16()?;
    let escapement = p.i16()?;
    let _orientation = p.i16()?;
    let weight = p.i16()?;
    let attrs = p.bytes(8)?;
    let face = p.remaining();
    let face = &face[..face.len().min(FACE_NAME_LEN)];

    let font = Font {
        height,
        width,
        escapement,
        weight: weight.max(0).unsigned_abs(),
        italic: attrs[0] != 0,
        underline: attrs[1] != 0,
        strike_out: attrs[2] != 0,
        charset: attrs[3],
        fixed_pitch: attrs[7] & 0x03 == 1,
        family: parse_windows1252_string(face),
    };
    add_object(ctx, ObjectSlot::Font(font));
    Ok(())
}

pub(super) fn dib_create_pattern_brush(
    ctx: &mut InterpreterContext<'_>,
    _target: &mut dyn RenderTarget,
    record: &Record<'_>,
) -> Result<()> {
    let mut p = record.params();
    let _style = p.u16()?;
    let _color_usage = p.u16()?;
    let brush = match dib::decode_dib(p.remaining()) {
        Ok(image) => Brush::pattern(image),
        Err(e) => {
            log::debug!("pattern brush bitmap unusable: {e}");
            Brush::null()
        },
    };
    add_object(ctx, ObjectSlot::PatternBrush(brush));
    Ok(())
}

fn add_placeholder(ctx: &mut InterpreterContext<'_>, kind: OpaqueKind) -> Result<()> {
    log::debug!("{kind:?} object kept as a placeholder");
    add_object(ctx, ObjectSlot::Opaque(kind));
    Ok(())
}

pub(super) fn create_palette(
    ctx: &mut InterpreterContext<'_>,
    _target: &mut dyn RenderTarget,
    _record: &Record<'_>,
) -> Result<()> {
    add_placeholder(ctx, OpaqueKind::Palette)
}

pub(super) fn create_region(
    ctx: &mut InterpreterContext<'_>,
    _target: &mut dyn RenderTarget,
    _record: &Record<'_>,
) -> Result<()> {
    add_placeholder(ctx, OpaqueKind::Region)
}

pub(super) fn create_bitmap_indirect(
    ctx: &mut InterpreterContext<'_>,
    _target: &mut dyn RenderTarget,
    _record: &Record<'_>,
) -> Result<()> {
    add_placeholder(ctx, OpaqueKind::Bitmap)
}

pub(super) fn create_bitmap(
    ctx: &mut InterpreterContext<'_>,
    _target: &mut dyn RenderTarget,
    _record: &Record<'_>,
) -> Result<()> {
    add_placeholder(ctx, OpaqueKind::Bitmap)
}

pub(super) fn create_brush(
    ctx: &mut InterpreterContext<'_>,
    _target: &mut dyn RenderTarget,
    _record: &Record<'_>,
) -> Result<()> {
    add_placeholder(ctx, OpaqueKind::Bitmap)
}

pub(super) fn create_pattern_brush(
    ctx: &mut InterpreterContext<'_>,
    _target: &mut dyn RenderTarget,
    _record: &Record<'_>,
) -> Result<()> {
    add_placeholder(ctx, OpaqueKind::Bitmap)
}

// ---------------------------------------------------------------------------
// Bitmaps
// ---------------------------------------------------------------------------

/// Blit records without a bitmap carry one reserved word and are exactly
/// `(function >> 8) + 3` words long.
fn has_bitmap(record: &Record<'_>) -> bool {
    record.size != u32::from(record.function >> 8) + 3
}

/// Fill `dest` with the current brush under a raster operation.
fn pattern_fill(target: &mut dyn RenderTarget, rop: u32, dest: Rect) {
    target.save();
    target.set_composition_mode(CompositionMode::from_rop3(rop));
    target.set_pen(&Pen::new(PenStyle::Null, 0, Color::BLACK));
    target.draw_rect(dest.normalized());
    target.restore();
}

/// Draw `source` of a packed DIB into `dest`. A sign difference between
/// the two extents mirrors the image about the destination's center.
fn blit(
    target: &mut dyn RenderTarget,
    rop: u32,
    dest: Rect,
    source: Rect,
    bitmap: &[u8],
) -> Result<()> {
    let image = dib::decode_dib(bitmap)?;

    let flip_x = (dest.width < 0) != (source.width < 0);
    let flip_y = (dest.height < 0) != (source.height < 0);
    let dest = dest.normalized();
    let source = source.normalized();

    target.save();
    target.set_composition_mode(CompositionMode::from_rop3(rop));
    if flip_x {
        let axis = 2.0 * f64::from(dest.left) + f64::from(dest.width);
        let mirror = Matrix::FLIP_HORIZONTAL.then(&Matrix::translation(axis, 0.0));
        target.set_matrix(&mirror, true);
    }
    if flip_y {
        let axis = 2.0 * f64::from(dest.top) + f64::from(dest.height);
        let mirror = Matrix::FLIP_VERTICAL.then(&Matrix::translation(0.0, axis));
        target.set_matrix(&mirror, true);
    }
    if !target.draw_image(dest, &image, source) {
        log::debug!("{}x{} bitmap not drawn", image.width(), image.height());
    }
    target.restore();
    Ok(())
}

/// Fill a rectangle with the current brush; PatBlt never carries a bitmap.
pub(super) fn pat_blt(
    _ctx: &mut InterpreterContext<'_>,
    target: &mut dyn RenderTarget,
    record: &Record<'_>,
) -> Result<()> {
    let mut p = record.params();
    let rop = p.u32()?;
    let height = p.coord()?;
    let width = p.coord()?;
    let origin = p.point_yx()?;
    pattern_fill(target, rop, Rect::new(origin.x, origin.y, width, height));
    Ok(())
}

pub(super) fn dib_bit_blt(
    _ctx: &mut InterpreterContext<'_>,
    target: &mut dyn RenderTarget,
    record: &Record<'_>,
) -> Result<()> {
    let mut p = record.params();
    let rop = p.u32()?;
    let with_bitmap = has_bitmap(record);
    if !with_bitmap {
        p.skip(2)?;
    }
    let src = p.point_yx()?;
    let height = p.coord()?;
    let width = p.coord()?;
    let dst = p.point_yx()?;

    let dest = Rect::new(dst.x, dst.y, width, height);
    if !with_bitmap {
        pattern_fill(target, rop, dest);
        return Ok(());
    }
    blit(target, rop, dest, Rect::new(src.x, src.y, width, height), p.remaining())
}

pub(super) fn dib_stretch_blt(
    _ctx: &mut InterpreterContext<'_>,
    target: &mut dyn RenderTarget,
    record: &Record<'_>,
) -> Result<()> {
    let mut p = record.params();
    let rop = p.u32()?;
    let with_bitmap = has_bitmap(record);
    if !with_bitmap {
        p.skip(2)?;
    }
    let src_height = p.coord()?;
    let src_width = p.coord()?;
    let src = p.point_yx()?;
    let dst_height = p.coord()?;
    let dst_width = p.coord()?;
    let dst = p.point_yx()?;

    let dest = Rect::new(dst.x, dst.y, dst_width, dst_height);
    if !with_bitmap {
        pattern_fill(target, rop, dest);
        return Ok(());
    }
    let source = Rect::new(src.x, src.y, src_width, src_height);
    blit(target, rop, dest, source, p.remaining())
}

pub(super) fn stretch_dib(
    _ctx: &mut InterpreterContext<'_>,
    target: &mut dyn RenderTarget,
    record: &Record<'_>,
) -> Result<()> {
    let mut p = record.params();
    let rop = p.u32()?;
    let _color_usage = p.u16()?;
    let src_height = p.coord()?;
    let src_width = p.coord()?;
    let src = p.point_yx()?;
    let dst_height = p.coord()?;
    let dst_width = p.coord()?;
    let dst = p.point_yx()?;

    let dest = Rect::new(dst.x, dst.y, dst_width, dst_height);
    let source = Rect::new(src.x, src.y, src_width, src_height);
    blit(target, rop, dest, source, p.remaining())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xy_to_angle_quarter() {
        // from 3 o'clock to 12 o'clock, counter-clockwise
        let (start, sweep) = xy_to_angle(10, 0, 0, 10);
        assert_eq!(start, 0);
        assert_eq!(sweep, 90 * 16);
    }

    #[test]
    fn test_xy_to_angle_wraps_negative_sweep() {
        // from 12 o'clock to 3 o'clock goes the long way round
        let (start, sweep) = xy_to_angle(0, 10, 10, 0);
        assert_eq!(start, 90 * 16);
        assert_eq!(sweep, 270 * 16);
    }

    #[test]
    fn test_xy_to_angle_full_turn() {
        assert_eq!(xy_to_angle(5, 5, 5, 5).1, 5760);
    }
}
