// GDI objects and drawing attributes
//
// Pens, brushes and fonts are decoded from their create*Indirect records and
// live in the object handle table until selected into a render target.
// The remaining types describe device-context state carried by plain records
// (background mode, raster operation, text alignment).

use bitflags::bitflags;
use image::RgbaImage;
use std::sync::Arc;

use super::constants::{brush, pen, rop3};

/// RGB color decoded from a COLORREF (0x00BBGGRR).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Decode a COLORREF. The high (palette flag) byte is ignored.
    pub const fn from_colorref(value: u32) -> Self {
        Self {
            r: (value & 0xFF) as u8,
            g: ((value >> 8) & 0xFF) as u8,
            b: ((value >> 16) & 0xFF) as u8,
        }
    }

    pub const fn to_colorref(self) -> u32 {
        self.r as u32 | (self.g as u32) << 8 | (self.b as u32) << 16
    }
}

/// Pen styles from GDI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PenStyle {
    #[default]
    Solid,
    Dash,
    Dot,
    DashDot,
    DashDotDot,
    Null,
    /// Drawn like `Solid`; GDI only changes how the width grows.
    InsideFrame,
}

impl PenStyle {
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            pen::PS_SOLID => Some(Self::Solid),
            pen::PS_DASH => Some(Self::Dash),
            pen::PS_DOT => Some(Self::Dot),
            pen::PS_DASHDOT => Some(Self::DashDot),
            pen::PS_DASHDOTDOT => Some(Self::DashDotDot),
            pen::PS_NULL => Some(Self::Null),
            pen::PS_INSIDEFRAME => Some(Self::InsideFrame),
            _ => None,
        }
    }

    pub fn to_u16(self) -> u16 {
        match self {
            Self::Solid => pen::PS_SOLID,
            Self::Dash => pen::PS_DASH,
            Self::Dot => pen::PS_DOT,
            Self::DashDot => pen::PS_DASHDOT,
            Self::DashDotDot => pen::PS_DASHDOTDOT,
            Self::Null => pen::PS_NULL,
            Self::InsideFrame => pen::PS_INSIDEFRAME,
        }
    }

    /// Dash pattern in multiples of the pen width, `None` for continuous lines.
    pub fn dash_pattern(self) -> Option<&'static [f32]> {
        match self {
            Self::Dash => Some(&[10.0, 10.0]),
            Self::Dot => Some(&[1.0, 2.0]),
            Self::DashDot => Some(&[10.0, 2.0, 1.0, 2.0]),
            Self::DashDotDot => Some(&[10.0, 2.0, 1.0, 2.0, 1.0, 2.0]),
            Self::Solid | Self::Null | Self::InsideFrame => None,
        }
    }
}

/// Pen object for stroking outlines. Caps are always round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pen {
    pub style: PenStyle,
    /// Width in logical units; 0 draws a one-pixel hairline.
    pub width: u16,
    pub color: Color,
}

impl Default for Pen {
    fn default() -> Self {
        Self {
            style: PenStyle::Solid,
            width: 0,
            color: Color::BLACK,
        }
    }
}

impl Pen {
    pub const fn new(style: PenStyle, width: u16, color: Color) -> Self {
        Self {
            style,
            width,
            color,
        }
    }

    /// Decode CreatePenIndirect fields. Unknown styles draw solid.
    pub fn from_wmf(style: u16, width: u16, colorref: u32) -> Self {
        let style = PenStyle::from_u16(style).unwrap_or_else(|| {
            log::debug!("invalid pen style {style}, using solid");
            PenStyle::Solid
        });
        Self::new(style, width, Color::from_colorref(colorref))
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.style == PenStyle::Null
    }
}

/// Hatch patterns for `BrushStyle::Hatched`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HatchStyle {
    Horizontal,
    Vertical,
    ForwardDiagonal,
    BackwardDiagonal,
    Cross,
    DiagonalCross,
}

impl HatchStyle {
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            brush::HS_HORIZONTAL => Some(Self::Horizontal),
            brush::HS_VERTICAL => Some(Self::Vertical),
            brush::HS_FDIAGONAL => Some(Self::ForwardDiagonal),
            brush::HS_BDIAGONAL => Some(Self::BackwardDiagonal),
            brush::HS_CROSS => Some(Self::Cross),
            brush::HS_DIAGCROSS => Some(Self::DiagonalCross),
            _ => None,
        }
    }

    pub fn to_u16(self) -> u16 {
        match self {
            Self::Horizontal => brush::HS_HORIZONTAL,
            Self::Vertical => brush::HS_VERTICAL,
            Self::ForwardDiagonal => brush::HS_FDIAGONAL,
            Self::BackwardDiagonal => brush::HS_BDIAGONAL,
            Self::Cross => brush::HS_CROSS,
            Self::DiagonalCross => brush::HS_DIAGCROSS,
        }
    }
}

/// Brush styles from GDI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BrushStyle {
    #[default]
    Solid,
    Null,
    Hatched(HatchStyle),
    /// Texture brush; the bitmap lives in [`Brush::pattern`].
    Pattern,
}

/// Brush object for filling interiors
#[derive(Debug, Clone, PartialEq)]
pub struct Brush {
    pub style: BrushStyle,
    pub color: Color,
    pub pattern: Option<Arc<RgbaImage>>,
}

impl Default for Brush {
    fn default() -> Self {
        Self::solid(Color::WHITE)
    }
}

impl Brush {
    pub fn solid(color: Color) -> Self {
        Self {
            style: BrushStyle::Solid,
            color,
            pattern: None,
        }
    }

    pub fn null() -> Self {
        Self {
            style: BrushStyle::Null,
            color: Color::WHITE,
            pattern: None,
        }
    }

    pub fn pattern(image: RgbaImage) -> Self {
        Self {
            style: BrushStyle::Pattern,
            color: Color::BLACK,
            pattern: Some(Arc::new(image)),
        }
    }

    /// Decode CreateBrushIndirect fields.
    ///
    /// Pattern styles carry no bitmap in this record and fall back to a solid
    /// fill, as do unknown styles and hatch indices.
    pub fn from_wmf(style: u16, colorref: u32, hatch: u16) -> Self {
        let color = Color::from_colorref(colorref);
        let style = match style {
            brush::BS_SOLID => BrushStyle::Solid,
            brush::BS_NULL => BrushStyle::Null,
            brush::BS_HATCHED => match HatchStyle::from_u16(hatch) {
                Some(h) => BrushStyle::Hatched(h),
                None => {
                    log::debug!("invalid hatched brush {hatch}, using solid");
                    BrushStyle::Solid
                },
            },
            brush::BS_PATTERN..=brush::BS_DIBPATTERN8X8 => BrushStyle::Solid,
            other => {
                log::debug!("invalid brush style {other}, using solid");
                BrushStyle::Solid
            },
        };
        Self {
            style,
            color,
            pattern: None,
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.style == BrushStyle::Null
    }
}

/// Logical font
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Font {
    /// Character height in logical units; the sign selects cell vs glyph height.
    pub height: i16,
    pub width: i16,
    /// Baseline angle in tenths of a degree, counter-clockwise.
    pub escapement: i16,
    pub weight: u16,
    pub italic: bool,
    pub underline: bool,
    pub strike_out: bool,
    pub charset: u8,
    pub fixed_pitch: bool,
    pub family: String,
}

impl Default for Font {
    fn default() -> Self {
        Self {
            height: 12,
            width: 0,
            escapement: 0,
            weight: 400,
            italic: false,
            underline: false,
            strike_out: false,
            charset: 0,
            fixed_pitch: false,
            family: "Arial".to_string(),
        }
    }
}

impl Font {
    /// Clockwise rotation in degrees applied to text drawn with this font.
    pub fn rotation(&self) -> f64 {
        -f64::from(self.escapement) / 10.0
    }

    /// Pixel size used by backends: the magnitude of `height`.
    pub fn size(&self) -> f64 {
        f64::from(self.height.unsigned_abs().max(1))
    }

    pub fn is_bold(&self) -> bool {
        self.weight >= 600
    }
}

/// Background mix mode for hatches, dashed pens and text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BackgroundMode {
    Transparent,
    #[default]
    Opaque,
}

/// How source pixels are combined with the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompositionMode {
    Source,
    #[default]
    SourceOver,
    SourceIn,
    SourceOut,
    Destination,
    DestinationOut,
    Clear,
    Xor,
}

const ROP2_TABLE: [CompositionMode; 17] = [
    CompositionMode::Source,
    CompositionMode::Clear,
    CompositionMode::SourceOut,
    CompositionMode::SourceOut,
    CompositionMode::DestinationOut,
    CompositionMode::DestinationOut,
    CompositionMode::DestinationOut,
    CompositionMode::Xor,
    CompositionMode::Source,
    CompositionMode::SourceIn,
    CompositionMode::SourceIn,
    CompositionMode::Destination,
    CompositionMode::Destination,
    CompositionMode::Source,
    CompositionMode::Source,
    CompositionMode::SourceOver,
    CompositionMode::Source,
];

const ROP3_TABLE: [(u32, CompositionMode); 15] = [
    (rop3::SRCCOPY, CompositionMode::Source),
    (rop3::SRCPAINT, CompositionMode::SourceOver),
    (rop3::SRCAND, CompositionMode::SourceIn),
    (rop3::SRCINVERT, CompositionMode::Xor),
    (rop3::SRCERASE, CompositionMode::DestinationOut),
    (rop3::NOTSRCCOPY, CompositionMode::DestinationOut),
    (rop3::NOTSRCERASE, CompositionMode::SourceOut),
    (rop3::MERGECOPY, CompositionMode::Source),
    (rop3::MERGEPAINT, CompositionMode::Destination),
    (rop3::PATCOPY, CompositionMode::Source),
    (rop3::PATPAINT, CompositionMode::Source),
    (rop3::PATINVERT, CompositionMode::Source),
    (rop3::DSTINVERT, CompositionMode::DestinationOut),
    (rop3::BLACKNESS, CompositionMode::Clear),
    (rop3::WHITENESS, CompositionMode::Source),
];

impl CompositionMode {
    /// Map a SetROP2 binary raster operation.
    pub fn from_rop2(rop: u16) -> Self {
        ROP2_TABLE
            .get(usize::from(rop))
            .copied()
            .unwrap_or(CompositionMode::Source)
    }

    /// Map a ternary raster operation from a blit record.
    pub fn from_rop3(rop: u32) -> Self {
        ROP3_TABLE
            .iter()
            .find(|(code, _)| *code == rop)
            .map(|(_, mode)| *mode)
            .unwrap_or(CompositionMode::SourceOver)
    }

    /// A binary raster operation producing this mode when read back.
    pub fn to_rop2(self) -> u16 {
        match self {
            Self::Source => 13,
            Self::SourceOver => 15,
            Self::SourceIn => 9,
            Self::SourceOut => 2,
            Self::Destination => 11,
            Self::DestinationOut => 4,
            Self::Clear => 1,
            Self::Xor => 7,
        }
    }
}

bitflags! {
    /// Text alignment flags (TA_*)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TextAlign: u16 {
        const UPDATE_CP = 0x0001;
        const RIGHT = 0x0002;
        const CENTER = 0x0006;
        const BOTTOM = 0x0008;
        const BASELINE = 0x0018;
        const RTL_READING = 0x0100;
    }
}

/// Horizontal anchor of a text run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HorizontalAlign {
    Left,
    Center,
    Right,
}

/// Vertical anchor of a text run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalAlign {
    Top,
    Baseline,
    Bottom,
}

impl TextAlign {
    pub fn horizontal(self) -> HorizontalAlign {
        match self.bits() & 0x0006 {
            0x0006 => HorizontalAlign::Center,
            0x0002 => HorizontalAlign::Right,
            _ => HorizontalAlign::Left,
        }
    }

    pub fn vertical(self) -> VerticalAlign {
        match self.bits() & 0x0018 {
            0x0018 => VerticalAlign::Baseline,
            0x0008 => VerticalAlign::Bottom,
            _ => VerticalAlign::Top,
        }
    }

    /// Whether text is placed at, and advances, the current position.
    pub fn updates_current_position(self) -> bool {
        self.contains(Self::UPDATE_CP)
    }
}

bitflags! {
    /// ExtTextOut options (ETO_*)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ExtTextOutOptions: u16 {
        const OPAQUE = 0x0002;
        const CLIPPED = 0x0004;
        const GLYPH_INDEX = 0x0010;
        const RTL_READING = 0x0080;
        const PDY = 0x2000;
    }
}

impl ExtTextOutOptions {
    /// Whether the record carries a rectangle after the options word.
    pub fn has_rect(self) -> bool {
        self.intersects(Self::OPAQUE | Self::CLIPPED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colorref_roundtrip() {
        let c = Color::from_colorref(0x01_33_22_11);
        assert_eq!(c, Color::rgb(0x11, 0x22, 0x33));
        assert_eq!(c.to_colorref(), 0x00_33_22_11);
    }

    #[test]
    fn test_pen_invalid_style_is_solid() {
        let pen = Pen::from_wmf(9, 3, 0x0000FF);
        assert_eq!(pen.style, PenStyle::Solid);
        assert_eq!(pen.width, 3);
        assert_eq!(pen.color, Color::rgb(255, 0, 0));
        assert!(Pen::from_wmf(5, 1, 0).is_null());
    }

    #[test]
    fn test_brush_styles() {
        assert!(Brush::from_wmf(1, 0, 0).is_null());
        assert_eq!(
            Brush::from_wmf(2, 0, 4).style,
            BrushStyle::Hatched(HatchStyle::Cross)
        );
        assert_eq!(Brush::from_wmf(2, 0, 6).style, BrushStyle::Solid);
        assert_eq!(Brush::from_wmf(3, 0, 0).style, BrushStyle::Solid);
        assert_eq!(Brush::from_wmf(42, 0, 0).style, BrushStyle::Solid);
    }

    #[test]
    fn test_rop2_table() {
        assert_eq!(CompositionMode::from_rop2(7), CompositionMode::Xor);
        assert_eq!(CompositionMode::from_rop2(13), CompositionMode::Source);
        assert_eq!(CompositionMode::from_rop2(17), CompositionMode::Source);
        for mode in [
            CompositionMode::Source,
            CompositionMode::SourceOver,
            CompositionMode::SourceIn,
            CompositionMode::SourceOut,
            CompositionMode::Destination,
            CompositionMode::DestinationOut,
            CompositionMode::Clear,
            CompositionMode::Xor,
        ] {
            assert_eq!(CompositionMode::from_rop2(mode.to_rop2()), mode);
        }
    }

    #[test]
    fn test_rop3_table() {
        assert_eq!(
            CompositionMode::from_rop3(rop3::SRCCOPY),
            CompositionMode::Source
        );
        assert_eq!(
            CompositionMode::from_rop3(rop3::BLACKNESS),
            CompositionMode::Clear
        );
        assert_eq!(
            CompositionMode::from_rop3(0x1234_5678),
            CompositionMode::SourceOver
        );
    }

    #[test]
    fn test_text_align() {
        let a = TextAlign::from_bits_retain(0x0006 | 0x0018);
        assert_eq!(a.horizontal(), HorizontalAlign::Center);
        assert_eq!(a.vertical(), VerticalAlign::Baseline);
        let b = TextAlign::from_bits_retain(0x0003);
        assert_eq!(b.horizontal(), HorizontalAlign::Right);
        assert!(b.updates_current_position());
        assert_eq!(TextAlign::empty().vertical(), VerticalAlign::Top);
    }

    #[test]
    fn test_font_rotation() {
        let font = Font {
            escapement: 900,
            ..Font::default()
        };
        assert_eq!(font.rotation(), -90.0);
    }
}
