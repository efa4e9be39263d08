//! Metafile encoder.
//!
//! [`MetafileWriter`] is the mirror image of playback: every call appends one
//! record to an in-memory buffer. The placeable and standard headers are
//! reserved as zeroes by [`MetafileWriter::begin`] and filled in by
//! [`MetafileWriter::end`] once the bounding box, object count and largest
//! record are known.
//!
//! Pens, brushes and fonts are tracked the way a reader allocates them:
//! every creation takes the first free handle, and replacing the selected
//! object creates and selects the new one before deleting the old one.
//!
//! # Example
//!
//! ```
//! use wmfkit::wmf::geometry::Rect;
//! use wmfkit::wmf::objects::{Brush, Color};
//! use wmfkit::wmf::writer::MetafileWriter;
//!
//! let mut writer = MetafileWriter::new();
//! writer.set_default_dpi(96);
//! writer.begin();
//! writer.set_brush(&Brush::solid(Color::rgb(255, 0, 0)));
//! writer.draw_rect(Rect::new(0, 0, 100, 100));
//! let bytes = writer.end()?;
//! assert!(bytes.len() > 40);
//! # Ok::<(), wmfkit::common::error::Error>(())
//! ```

use std::path::Path;

use image::RgbaImage;
use zerocopy::IntoBytes;
use zerocopy::{LE, U16, U32};

use super::constants::{
    PLACEABLE_HEADER_SIZE, RECORD_HEADER_WORDS, STANDARD_HEADER_SIZE, STANDARD_HEADER_WORDS,
    bk_mode, brush, color_usage, fill_mode, record, rop3,
};
use super::dib;
use super::geometry::{Point, Rect};
use super::header::{RawPlaceableHeader, RawStandardHeader};
use super::objects::{BackgroundMode, Brush, BrushStyle, Color, CompositionMode, Font, Pen};
use crate::common::binary::{encode_windows1252_string, patch_u32_le, put_i16_le, put_u16_le, put_u32_le};
use crate::common::error::{Error, Result};

/// Memory metafile.
const FILE_TYPE_MEMORY: u16 = 1;

/// META_HEADER version for files with DIB records.
const METAFILE_VERSION: u16 = 0x0300;

/// Handles reserved after the default pen and brush.
const RESERVED_SLOTS: usize = 4;

/// Longest face name written, without the terminator.
const FACE_NAME_MAX: usize = 31;

/// DPI used until [`MetafileWriter::set_default_dpi`] is called.
const WRITER_DEFAULT_DPI: u16 = 1440;

#[inline]
fn clamp16(v: i32) -> i16 {
    v.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
}

fn put_point_yx(out: &mut Vec<u8>, p: Point) {
    put_i16_le(out, clamp16(p.y));
    put_i16_le(out, clamp16(p.x));
}

fn put_point_xy(out: &mut Vec<u8>, p: Point) {
    put_i16_le(out, clamp16(p.x));
    put_i16_le(out, clamp16(p.y));
}

fn put_rect_brtl(out: &mut Vec<u8>, r: Rect) {
    let r = r.normalized();
    put_i16_le(out, clamp16(r.bottom()));
    put_i16_le(out, clamp16(r.right()));
    put_i16_le(out, clamp16(r.top));
    put_i16_le(out, clamp16(r.left));
}

/// Records a WMF stream.
#[derive(Debug, Clone)]
pub struct MetafileWriter {
    out: Vec<u8>,
    dpi: u16,
    active: bool,
    explicit_bounds: Option<Rect>,
    drawn_bounds: Option<Rect>,
    slots: Vec<bool>,
    max_record: u32,
    pen: (Pen, u16),
    brush: (Brush, u16),
    font: Option<(Font, u16)>,
    winding: bool,
    text_color: Color,
}

impl Default for MetafileWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl MetafileWriter {
    pub fn new() -> Self {
        Self {
            out: Vec::new(),
            dpi: WRITER_DEFAULT_DPI,
            active: false,
            explicit_bounds: None,
            drawn_bounds: None,
            slots: Vec::new(),
            max_record: 0,
            pen: (Pen::default(), 0),
            brush: (Brush::default(), 1),
            font: None,
            winding: false,
            text_color: Color::BLACK,
        }
    }

    /// Logical units per inch written to the placeable header.
    pub fn set_default_dpi(&mut self, dpi: u16) {
        self.dpi = dpi.max(1);
    }

    /// Start a new document, dropping anything recorded before.
    ///
    /// Writes the header placeholders and the default objects: a black pen in
    /// handle 0, a white brush in handle 1 and four reserved handles.
    pub fn begin(&mut self) {
        self.out.clear();
        self.out.resize(PLACEABLE_HEADER_SIZE + STANDARD_HEADER_SIZE, 0);
        self.active = true;
        self.explicit_bounds = None;
        self.drawn_bounds = None;
        self.slots.clear();
        self.max_record = 0;
        self.winding = false;
        self.text_color = Color::BLACK;
        self.font = None;

        let pen = Pen::default();
        let handle = self.create_pen(&pen);
        self.select(handle);
        self.pen = (pen, handle);

        let brush = Brush::default();
        let handle = self.create_brush(&brush);
        self.select(handle);
        self.brush = (brush, handle);

        for _ in 0..RESERVED_SLOTS {
            self.allocate();
            self.write_record(record::CREATE_PALETTE, |out| {
                put_u16_le(out, METAFILE_VERSION);
                put_u16_le(out, 0);
            });
        }
    }

    /// Finish the document and return its bytes.
    pub fn end(&mut self) -> Result<Vec<u8>> {
        if !self.active {
            return Err(Error::InvalidState("MetafileWriter::end without begin".into()));
        }
        self.write_record(record::EOF, |_| {});
        self.active = false;

        let bounds = self
            .explicit_bounds
            .or(self.drawn_bounds)
            .unwrap_or_default()
            .normalized();
        let placeable = RawPlaceableHeader::new(bounds, self.dpi);
        self.out[..PLACEABLE_HEADER_SIZE].copy_from_slice(placeable.as_bytes());

        let words = (self.out.len() - PLACEABLE_HEADER_SIZE) / 2;
        let standard = RawStandardHeader {
            file_type: U16::<LE>::new(FILE_TYPE_MEMORY),
            header_size: U16::new(STANDARD_HEADER_WORDS),
            version: U16::new(METAFILE_VERSION),
            file_size: U32::new(u32::try_from(words).unwrap_or(u32::MAX)),
            num_objects: U16::new(u16::try_from(self.slots.len()).unwrap_or(u16::MAX)),
            max_record: U32::new(self.max_record),
            num_params: U16::new(0),
        };
        self.out[PLACEABLE_HEADER_SIZE..PLACEABLE_HEADER_SIZE + STANDARD_HEADER_SIZE]
            .copy_from_slice(standard.as_bytes());
        Ok(std::mem::take(&mut self.out))
    }

    /// Finish the document and write it to `path`.
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let bytes = self.end()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Append one record; `params` writes the payload, which is padded to
    /// whole words.
    fn write_record(&mut self, function: u16, params: impl FnOnce(&mut Vec<u8>)) {
        if !self.active {
            log::debug!("record 0x{function:04X} written outside begin/end, dropped");
            return;
        }
        let start = self.out.len();
        put_u32_le(&mut self.out, 0);
        put_u16_le(&mut self.out, function);
        params(&mut self.out);
        if (self.out.len() - start) % 2 == 1 {
            self.out.push(0);
        }
        let words = ((self.out.len() - start) / 2) as u32;
        debug_assert!(words >= RECORD_HEADER_WORDS);
        patch_u32_le(&mut self.out, start, words);
        self.max_record = self.max_record.max(words);
    }

    fn include(&mut self, rect: Rect) {
        let rect = rect.normalized();
        self.drawn_bounds = Some(match self.drawn_bounds {
            Some(b) => b.union(&rect),
            None => rect,
        });
    }

    fn include_points(&mut self, points: &[Point]) {
        for p in points {
            self.include(Rect::new(p.x, p.y, 0, 0));
        }
    }

    /// First free handle, growing the table when every slot is taken.
    fn allocate(&mut self) -> u16 {
        let idx = match self.slots.iter().position(|used| !used) {
            Some(idx) => idx,
            None => {
                self.slots.push(false);
                self.slots.len() - 1
            },
        };
        self.slots[idx] = true;
        idx as u16
    }

    fn select(&mut self, handle: u16) {
        self.write_record(record::SELECT_OBJECT, |out| put_u16_le(out, handle));
    }

    fn delete(&mut self, handle: u16) {
        self.write_record(record::DELETE_OBJECT, |out| put_u16_le(out, handle));
        if let Some(slot) = self.slots.get_mut(usize::from(handle)) {
            *slot = false;
        }
    }

    fn create_pen(&mut self, pen: &Pen) -> u16 {
        let handle = self.allocate();
        self.write_record(record::CREATE_PEN_INDIRECT, |out| {
            put_u16_le(out, pen.style.to_u16());
            put_i16_le(out, clamp16(i32::from(pen.width)));
            put_i16_le(out, 0);
            put_u32_le(out, pen.color.to_colorref());
        });
        handle
    }

    fn create_brush(&mut self, b: &Brush) -> u16 {
        let handle = self.allocate();
        if let (BrushStyle::Pattern, Some(image)) = (b.style, b.pattern.as_deref()) {
            match dib::encode_dib(image) {
                Ok(bitmap) => {
                    self.write_record(record::DIB_CREATE_PATTERN_BRUSH, |out| {
                        put_u16_le(out, brush::BS_DIBPATTERNPT);
                        put_u16_le(out, color_usage::DIB_RGB_COLORS);
                        out.extend_from_slice(&bitmap);
                    });
                    return handle;
                },
                Err(e) => log::debug!("pattern brush written as solid: {e}"),
            }
        }
        let (style, hatch) = match b.style {
            BrushStyle::Null => (brush::BS_NULL, 0),
            BrushStyle::Hatched(h) => (brush::BS_HATCHED, h.to_u16()),
            BrushStyle::Solid | BrushStyle::Pattern => (brush::BS_SOLID, 0),
        };
        self.write_record(record::CREATE_BRUSH_INDIRECT, |out| {
            put_u16_le(out, style);
            put_u32_le(out, b.color.to_colorref());
            put_u16_le(out, hatch);
        });
        handle
    }

    fn create_font(&mut self, font: &Font) -> u16 {
        let handle = self.allocate();
        let mut face = encode_windows1252_string(&font.family);
        face.truncate(FACE_NAME_MAX);
        face.push(0);
        self.write_record(record::CREATE_FONT_INDIRECT, |out| {
            put_i16_le(out, font.height);
            put_i16_le(out, font.width);
            put_i16_le(out, font.escapement);
            put_i16_le(out, font.escapement);
            put_i16_le(out, clamp16(i32::from(font.weight)));
            out.extend_from_slice(&[
                u8::from(font.italic),
                u8::from(font.underline),
                u8::from(font.strike_out),
                font.charset,
                0,
                0,
                0,
                if font.fixed_pitch { 1 } else { 2 },
            ]);
            out.extend_from_slice(&face);
        });
        handle
    }

    pub fn save_dc(&mut self) {
        self.write_record(record::SAVE_DC, |_| {});
    }

    /// Return to the most recently saved state.
    pub fn restore_dc(&mut self) {
        self.write_record(record::RESTORE_DC, |out| put_i16_le(out, -1));
    }

    pub fn set_pen(&mut self, pen: &Pen) {
        if self.pen.0 == *pen {
            return;
        }
        let old = self.pen.1;
        let handle = self.create_pen(pen);
        self.select(handle);
        self.delete(old);
        self.pen = (*pen, handle);
    }

    pub fn set_brush(&mut self, brush: &Brush) {
        if self.brush.0 == *brush {
            return;
        }
        let old = self.brush.1;
        let handle = self.create_brush(brush);
        self.select(handle);
        self.delete(old);
        self.brush = (brush.clone(), handle);
    }

    pub fn set_font(&mut self, font: &Font) {
        if self.font.as_ref().is_some_and(|(f, _)| f == font) {
            return;
        }
        let old = self.font.as_ref().map(|(_, h)| *h);
        let handle = self.create_font(font);
        self.select(handle);
        if let Some(old) = old {
            self.delete(old);
        }
        self.font = Some((font.clone(), handle));
    }

    pub fn set_background_color(&mut self, color: Color) {
        self.write_record(record::SET_BK_COLOR, |out| put_u32_le(out, color.to_colorref()));
    }

    pub fn set_background_mode(&mut self, mode: BackgroundMode) {
        let value = match mode {
            BackgroundMode::Transparent => bk_mode::TRANSPARENT,
            BackgroundMode::Opaque => bk_mode::OPAQUE,
        };
        self.write_record(record::SET_BK_MODE, |out| put_u16_le(out, value));
    }

    /// Written as SetROP2.
    pub fn set_composition_mode(&mut self, mode: CompositionMode) {
        self.write_record(record::SET_ROP2, |out| put_u16_le(out, mode.to_rop2()));
    }

    pub fn set_text_color(&mut self, color: Color) {
        if self.text_color == color {
            return;
        }
        self.text_color = color;
        self.write_record(record::SET_TEXT_COLOR, |out| put_u32_le(out, color.to_colorref()));
    }

    /// Declare the logical window: origin then extent.
    pub fn set_window(&mut self, window: Rect) {
        self.write_record(record::SET_WINDOW_ORG, |out| {
            put_point_yx(out, Point::new(window.left, window.top));
        });
        self.write_record(record::SET_WINDOW_EXT, |out| {
            put_i16_le(out, clamp16(window.height));
            put_i16_le(out, clamp16(window.width));
        });
    }

    /// Use `rect` for the placeable header instead of the drawn extent.
    pub fn set_bounding_rect(&mut self, rect: Rect) {
        self.explicit_bounds = Some(rect);
    }

    pub fn intersect_clip_rect(&mut self, rect: Rect) {
        self.write_record(record::INTERSECT_CLIP_RECT, |out| put_rect_brtl(out, rect));
    }

    pub fn exclude_clip_rect(&mut self, rect: Rect) {
        self.write_record(record::EXCLUDE_CLIP_RECT, |out| put_rect_brtl(out, rect));
    }

    pub fn move_to(&mut self, point: Point) {
        self.write_record(record::MOVE_TO, |out| put_point_yx(out, point));
    }

    pub fn line_to(&mut self, point: Point) {
        self.include_points(&[point]);
        self.write_record(record::LINE_TO, |out| put_point_yx(out, point));
    }

    pub fn draw_rect(&mut self, rect: Rect) {
        self.include(rect);
        self.write_record(record::RECTANGLE, |out| put_rect_brtl(out, rect));
    }

    /// Corner radii as percentages of half the width and height.
    pub fn draw_round_rect(&mut self, rect: Rect, x_round: i32, y_round: i32) {
        let r = rect.normalized();
        let corner_w = r.width * x_round.clamp(0, 100) / 100;
        let corner_h = r.height * y_round.clamp(0, 100) / 100;
        self.include(r);
        self.write_record(record::ROUND_RECT, |out| {
            put_i16_le(out, clamp16(corner_h));
            put_i16_le(out, clamp16(corner_w));
            put_rect_brtl(out, r);
        });
    }

    pub fn draw_ellipse(&mut self, rect: Rect) {
        self.include(rect);
        self.write_record(record::ELLIPSE, |out| put_rect_brtl(out, rect));
    }

    /// Radial end points for a start angle and sweep in 1/16 degree.
    ///
    /// The points lie on the rays from the center, one radius out, so a
    /// reader recovers the same angles regardless of the ellipse's shape.
    fn arc_points(rect: Rect, start: i32, sweep: i32) -> (Point, Point) {
        let r = rect.normalized();
        let cx = f64::from(r.left) + f64::from(r.width) / 2.0;
        let cy = f64::from(r.top) + f64::from(r.height) / 2.0;
        let radius = f64::from(r.width.max(r.height).max(2)) / 2.0;
        let at = |angle: i32| {
            let a = super::target::angle_to_radians(angle);
            Point::new(
                (cx + radius * a.cos()).round() as i32,
                (cy - radius * a.sin()).round() as i32,
            )
        };
        (at(start), at(start + sweep))
    }

    fn write_arc(&mut self, function: u16, rect: Rect, start: i32, sweep: i32) {
        let (from, to) = Self::arc_points(rect, start, sweep);
        self.include(rect);
        self.write_record(function, |out| {
            put_point_yx(out, to);
            put_point_yx(out, from);
            put_rect_brtl(out, rect);
        });
    }

    pub fn draw_arc(&mut self, rect: Rect, start_angle: i32, sweep: i32) {
        self.write_arc(record::ARC, rect, start_angle, sweep);
    }

    pub fn draw_pie(&mut self, rect: Rect, start_angle: i32, sweep: i32) {
        self.write_arc(record::PIE, rect, start_angle, sweep);
    }

    pub fn draw_chord(&mut self, rect: Rect, start_angle: i32, sweep: i32) {
        self.write_arc(record::CHORD, rect, start_angle, sweep);
    }

    fn write_points(&mut self, function: u16, points: &[Point]) {
        let points = &points[..points.len().min(usize::from(u16::MAX))];
        self.include_points(points);
        self.write_record(function, |out| {
            put_u16_le(out, points.len() as u16);
            for p in points {
                put_point_xy(out, *p);
            }
        });
    }

    pub fn draw_polyline(&mut self, points: &[Point]) {
        self.write_points(record::POLYLINE, points);
    }

    fn set_winding(&mut self, winding: bool) {
        if self.winding == winding {
            return;
        }
        self.winding = winding;
        let mode = if winding {
            fill_mode::WINDING
        } else {
            fill_mode::ALTERNATE
        };
        self.write_record(record::SET_POLY_FILL_MODE, |out| put_u16_le(out, mode));
    }

    pub fn draw_polygon(&mut self, points: &[Point], winding: bool) {
        self.set_winding(winding);
        self.write_points(record::POLYGON, points);
    }

    pub fn draw_poly_polygon(&mut self, polygons: &[Vec<Point>], winding: bool) {
        self.set_winding(winding);
        let polygons = &polygons[..polygons.len().min(usize::from(u16::MAX))];
        for polygon in polygons {
            self.include_points(polygon);
        }
        self.write_record(record::POLY_POLYGON, |out| {
            put_u16_le(out, polygons.len() as u16);
            for polygon in polygons {
                put_u16_le(out, polygon.len().min(usize::from(u16::MAX)) as u16);
            }
            for polygon in polygons {
                for p in polygon.iter().take(usize::from(u16::MAX)) {
                    put_point_xy(out, *p);
                }
            }
        });
    }

    /// Draw `source` of `image` stretched into `dest`, as a StretchDIB record.
    pub fn draw_image(&mut self, dest: Rect, image: &RgbaImage, source: Rect) -> Result<()> {
        let bitmap = dib::encode_dib(image)?;
        self.include(dest);
        self.write_record(record::STRETCH_DIB, |out| {
            put_u32_le(out, rop3::SRCCOPY);
            put_u16_le(out, color_usage::DIB_RGB_COLORS);
            put_i16_le(out, clamp16(source.height));
            put_i16_le(out, clamp16(source.width));
            put_point_yx(out, Point::new(source.left, source.top));
            put_i16_le(out, clamp16(dest.height));
            put_i16_le(out, clamp16(dest.width));
            put_point_yx(out, Point::new(dest.left, dest.top));
            out.extend_from_slice(&bitmap);
        });
        Ok(())
    }

    /// TextOut at `position`; the text is stored as Windows-1252.
    pub fn draw_text(&mut self, position: Point, text: &str) {
        let mut bytes = encode_windows1252_string(text);
        bytes.truncate(usize::from(u16::MAX));
        self.include_points(&[position]);
        self.write_record(record::TEXT_OUT, |out| {
            put_u16_le(out, bytes.len() as u16);
            out.extend_from_slice(&bytes);
            if bytes.len() % 2 == 1 {
                out.push(0);
            }
            put_point_yx(out, position);
        });
    }
}
