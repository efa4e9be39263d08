//! WMF magic numbers, record functions and GDI enumerations.
//!
//! Record function values are the full 16-bit words as they appear on disk.
//! The low byte selects the operation; the high byte encodes the parameter
//! count and is ignored by the dispatcher.

/// Key at the start of an Aldus placeable metafile.
pub const PLACEABLE_KEY: u32 = 0x9AC6_CDD7;

/// " EMF" signature of an enhanced metafile header record.
pub const ENHMETA_SIGNATURE: u32 = 0x464D_4520;

/// Byte offset of the signature inside the EMR_HEADER record.
pub const ENHMETA_SIGNATURE_OFFSET: usize = 40;

/// Size of the placeable header in bytes.
pub const PLACEABLE_HEADER_SIZE: usize = 22;

/// Size of the standard (META_HEADER) header in bytes.
pub const STANDARD_HEADER_SIZE: usize = 18;

/// Header size in words stored in every valid standard header.
pub const STANDARD_HEADER_WORDS: u16 = 9;

/// Words taken by the size and function fields of a record.
pub const RECORD_HEADER_WORDS: u32 = 3;

/// Units per inch assumed when the file carries no placeable header.
pub const DEFAULT_DPI: u16 = 1000;

/// Number of entries in the normalized function table.
pub const FUNCTION_TABLE_LEN: usize = 112;

/// WMF record function codes
#[allow(dead_code)]
pub mod record {
    // Control
    pub const EOF: u16 = 0x0000;
    pub const ESCAPE: u16 = 0x0626;
    pub const SET_MAPPER_FLAGS: u16 = 0x0231;

    // State
    pub const SAVE_DC: u16 = 0x001E;
    pub const RESTORE_DC: u16 = 0x0127;
    pub const SET_BK_COLOR: u16 = 0x0201;
    pub const SET_BK_MODE: u16 = 0x0102;
    pub const SET_MAP_MODE: u16 = 0x0103;
    pub const SET_ROP2: u16 = 0x0104;
    pub const SET_REL_ABS: u16 = 0x0105;
    pub const SET_POLY_FILL_MODE: u16 = 0x0106;
    pub const SET_STRETCH_BLT_MODE: u16 = 0x0107;
    pub const SET_TEXT_CHAR_EXTRA: u16 = 0x0108;
    pub const SET_TEXT_COLOR: u16 = 0x0209;
    pub const SET_TEXT_JUSTIFICATION: u16 = 0x020A;
    pub const SET_TEXT_ALIGN: u16 = 0x012E;

    // Window and viewport
    pub const SET_WINDOW_ORG: u16 = 0x020B;
    pub const SET_WINDOW_EXT: u16 = 0x020C;
    pub const SET_VIEWPORT_ORG: u16 = 0x020D;
    pub const SET_VIEWPORT_EXT: u16 = 0x020E;
    pub const OFFSET_WINDOW_ORG: u16 = 0x020F;
    pub const SCALE_WINDOW_EXT: u16 = 0x0410;
    pub const OFFSET_VIEWPORT_ORG: u16 = 0x0211;
    pub const SCALE_VIEWPORT_EXT: u16 = 0x0412;

    // Drawing
    pub const LINE_TO: u16 = 0x0213;
    pub const MOVE_TO: u16 = 0x0214;
    pub const SET_PIXEL: u16 = 0x041F;
    pub const POLYGON: u16 = 0x0324;
    pub const POLYLINE: u16 = 0x0325;
    pub const POLY_POLYGON: u16 = 0x0538;
    pub const RECTANGLE: u16 = 0x041B;
    pub const ROUND_RECT: u16 = 0x061C;
    pub const ELLIPSE: u16 = 0x0418;
    pub const ARC: u16 = 0x0817;
    pub const PIE: u16 = 0x081A;
    pub const CHORD: u16 = 0x0830;

    // Text
    pub const TEXT_OUT: u16 = 0x0521;
    pub const EXT_TEXT_OUT: u16 = 0x0A32;

    // Objects
    pub const SELECT_OBJECT: u16 = 0x012D;
    pub const DELETE_OBJECT: u16 = 0x01F0;
    pub const CREATE_PALETTE: u16 = 0x00F7;
    pub const CREATE_BRUSH: u16 = 0x00F8;
    pub const CREATE_PATTERN_BRUSH: u16 = 0x01F9;
    pub const CREATE_PEN_INDIRECT: u16 = 0x02FA;
    pub const CREATE_FONT_INDIRECT: u16 = 0x02FB;
    pub const CREATE_BRUSH_INDIRECT: u16 = 0x02FC;
    pub const CREATE_BITMAP_INDIRECT: u16 = 0x02FD;
    pub const CREATE_BITMAP: u16 = 0x06FE;
    pub const CREATE_REGION: u16 = 0x06FF;
    pub const DIB_CREATE_PATTERN_BRUSH: u16 = 0x0142;

    // Bitmaps
    pub const PAT_BLT: u16 = 0x061D;
    pub const DIB_BIT_BLT: u16 = 0x0940;
    pub const DIB_STRETCH_BLT: u16 = 0x0B41;
    pub const STRETCH_DIB: u16 = 0x0F43;

    // Clipping
    pub const EXCLUDE_CLIP_RECT: u16 = 0x0415;
    pub const INTERSECT_CLIP_RECT: u16 = 0x0416;
}

/// Pen style constants
#[allow(dead_code)]
pub mod pen {
    pub const PS_SOLID: u16 = 0;
    pub const PS_DASH: u16 = 1;
    pub const PS_DOT: u16 = 2;
    pub const PS_DASHDOT: u16 = 3;
    pub const PS_DASHDOTDOT: u16 = 4;
    pub const PS_NULL: u16 = 5;
    pub const PS_INSIDEFRAME: u16 = 6;
}

/// Brush style constants
#[allow(dead_code)]
pub mod brush {
    pub const BS_SOLID: u16 = 0;
    pub const BS_NULL: u16 = 1;
    pub const BS_HATCHED: u16 = 2;
    pub const BS_PATTERN: u16 = 3;
    pub const BS_DIBPATTERNPT: u16 = 6;
    pub const BS_DIBPATTERN8X8: u16 = 8;

    pub const HS_HORIZONTAL: u16 = 0;
    pub const HS_VERTICAL: u16 = 1;
    pub const HS_FDIAGONAL: u16 = 2;
    pub const HS_BDIAGONAL: u16 = 3;
    pub const HS_CROSS: u16 = 4;
    pub const HS_DIAGCROSS: u16 = 5;
}

/// Background modes
pub mod bk_mode {
    pub const TRANSPARENT: u16 = 1;
    pub const OPAQUE: u16 = 2;
}

/// Polygon fill modes
pub mod fill_mode {
    pub const ALTERNATE: u16 = 1;
    pub const WINDING: u16 = 2;
}

/// DIB color table interpretation for StretchDIB
pub mod color_usage {
    pub const DIB_RGB_COLORS: u16 = 0;
}

/// Ternary raster operations
#[allow(dead_code)]
pub mod rop3 {
    pub const SRCCOPY: u32 = 0x00CC_0020;
    pub const SRCPAINT: u32 = 0x00EE_0086;
    pub const SRCAND: u32 = 0x0088_00C6;
    pub const SRCINVERT: u32 = 0x0066_0046;
    pub const SRCERASE: u32 = 0x0044_0328;
    pub const NOTSRCCOPY: u32 = 0x0033_0008;
    pub const NOTSRCERASE: u32 = 0x0011_00A6;
    pub const MERGECOPY: u32 = 0x00C0_00CA;
    pub const MERGEPAINT: u32 = 0x00BB_0226;
    pub const PATCOPY: u32 = 0x00F0_0021;
    pub const PATPAINT: u32 = 0x00FB_0A09;
    pub const PATINVERT: u32 = 0x005A_0049;
    pub const DSTINVERT: u32 = 0x0055_0009;
    pub const BLACKNESS: u32 = 0x0000_0042;
    pub const WHITENESS: u32 = 0x00FF_0062;
}

/// Binary raster operations (SetROP2)
#[allow(dead_code)]
pub mod rop2 {
    pub const R2_BLACK: u16 = 1;
    pub const R2_XORPEN: u16 = 7;
    pub const R2_NOP: u16 = 11;
    pub const R2_COPYPEN: u16 = 13;
    pub const R2_WHITE: u16 = 16;
}
