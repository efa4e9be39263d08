// Dispatch table indexed by normalized record function
//
// Entries with a name but no handler are documented functions without a
// meaningful drawing effect; they are accepted and ignored. Entries with no
// handler at all are holes in the function numbering and abort playback.

use crate::common::error::Result;
use crate::wmf::record::Record;
use crate::wmf::target::RenderTarget;

use super::InterpreterContext;
use super::handlers as h;

/// Signature shared by all record handlers.
pub type Handler =
    fn(&mut InterpreterContext<'_>, &mut dyn RenderTarget, &Record<'_>) -> Result<()>;

/// One slot of [`FUNCTIONS`].
#[derive(Clone, Copy)]
pub struct FunctionEntry {
    pub name: &'static str,
    pub handler: Option<Handler>,
}

impl std::fmt::Debug for FunctionEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionEntry")
            .field("name", &self.name)
            .field("handled", &self.handler.is_some())
            .finish()
    }
}

const fn on(name: &'static str, handler: Handler) -> FunctionEntry {
    FunctionEntry {
        name,
        handler: Some(handler),
    }
}

const fn ignored(name: &'static str) -> FunctionEntry {
    FunctionEntry {
        name,
        handler: Some(h::ignore),
    }
}

const NONE: FunctionEntry = FunctionEntry {
    name: "none",
    handler: None,
};

/// Handlers for the 112 normalized function numbers.
pub static FUNCTIONS: [FunctionEntry; 112] = [
    on("end", h::end),                                   // 0x00
    on("setBkColor", h::set_bk_color),                   // 0x01
    on("setBkMode", h::set_bk_mode),                     // 0x02
    ignored("setMapMode"),                               // 0x03
    on("setRop", h::set_rop),                            // 0x04
    ignored("setRelAbs"),                                // 0x05
    on("setPolyFillMode", h::set_poly_fill_mode),        // 0x06
    ignored("setStretchBltMode"),                        // 0x07
    ignored("setTextCharExtra"),                         // 0x08
    on("setTextColor", h::set_text_color),               // 0x09
    ignored("setTextJustification"),                     // 0x0A
    on("setWindowOrg", h::set_window_org),               // 0x0B
    on("setWindowExt", h::set_window_ext),               // 0x0C
    on("setViewportOrg", h::set_viewport_org),           // 0x0D
    on("setViewportExt", h::set_viewport_ext),           // 0x0E
    on("offsetWindowOrg", h::offset_window_org),         // 0x0F
    on("scaleWindowExt", h::scale_window_ext),           // 0x10
    on("offsetViewportOrg", h::offset_viewport_org),     // 0x11
    on("scaleViewportExt", h::scale_viewport_ext),       // 0x12
    on("lineTo", h::line_to),                            // 0x13
    on("moveTo", h::move_to),                            // 0x14
    on("excludeClipRect", h::exclude_clip_rect),         // 0x15
    on("intersectClipRect", h::intersect_clip_rect),     // 0x16
    on("arc", h::arc),                                   // 0x17
    on("ellipse", h::ellipse),                           // 0x18
    ignored("floodfill"),                                // 0x19
    on("pie", h::pie),                                   // 0x1A
    on("rectangle", h::rectangle),                       // 0x1B
    on("roundRect", h::round_rect),                      // 0x1C
    on("patBlt", h::pat_blt),                            // 0x1D
    on("saveDC", h::save_dc),                            // 0x1E
    on("setPixel", h::set_pixel),                        // 0x1F
    ignored("offsetClipRegion"),                         // 0x20
    on("textOut", h::text_out),                          // 0x21
    ignored("bitBlt"),                                   // 0x22
    ignored("stretchBlt"),                               // 0x23
    on("polygon", h::polygon),                           // 0x24
    on("polyline", h::polyline),                         // 0x25
    ignored("escape"),                                   // 0x26
    on("restoreDC", h::restore_dc),                      // 0x27
    ignored("fillRegion"),                               // 0x28
    ignored("frameRegion"),                              // 0x29
    ignored("invertRegion"),                             // 0x2A
    ignored("paintRegion"),                              // 0x2B
    ignored("selectClipRegion"),                         // 0x2C
    on("selectObject", h::select_object),                // 0x2D
    on("setTextAlign", h::set_text_align),               // 0x2E
    NONE,                                                // 0x2F
    on("chord", h::chord),                               // 0x30
    ignored("setMapperFlags"),                           // 0x31
    on("extTextOut", h::ext_text_out),                   // 0x32
    ignored("setDibToDev"),                              // 0x33
    ignored("selectPalette"),                            // 0x34
    ignored("realizePalette"),                           // 0x35
    ignored("animatePalette"),                           // 0x36
    ignored("setPalEntries"),                            // 0x37
    on("polyPolygon", h::poly_polygon),                  // 0x38
    ignored("resizePalette"),                            // 0x39
    NONE,                                                // 0x3A
    NONE,                                                // 0x3B
    NONE,                                                // 0x3C
    NONE,                                                // 0x3D
    NONE,                                                // 0x3E
    ignored("unimplemented"),                            // 0x3F
    on("dibBitBlt", h::dib_bit_blt),                     // 0x40
    on("dibStretchBlt", h::dib_stretch_blt),             // 0x41
    on("dibCreatePatternBrush", h::dib_create_pattern_brush), // 0x42
    on("stretchDib", h::stretch_dib),                    // 0x43
    NONE,                                                // 0x44
    NONE,                                                // 0x45
    NONE,                                                // 0x46
    NONE,                                                // 0x47
    ignored("extFloodFill"),                             // 0x48
    ignored("setLayout"),                                // 0x49
    ignored("unimplemented"),                            // 0x4A
    ignored("unimplemented"),                            // 0x4B
    ignored("resetDC"),                                  // 0x4C
    ignored("startDoc"),                                 // 0x4D
    ignored("unimplemented"),                            // 0x4E
    ignored("startPage"),                                // 0x4F
    ignored("endPage"),                                  // 0x50
    ignored("unimplemented"),                            // 0x51
    ignored("unimplemented"),                            // 0x52
    ignored("unimplemented"),                            // 0x53
    ignored("unimplemented"),                            // 0x54
    ignored("unimplemented"),                            // 0x55
    ignored("unimplemented"),                            // 0x56
    ignored("unimplemented"),                            // 0x57
    ignored("unimplemented"),                            // 0x58
    ignored("unimplemented"),                            // 0x59
    ignored("unimplemented"),                            // 0x5A
    ignored("unimplemented"),                            // 0x5B
    ignored("unimplemented"),                            // 0x5C
    ignored("unimplemented"),                            // 0x5D
    ignored("endDoc"),                                   // 0x5E
    ignored("unimplemented"),                            // 0x5F
    on("deleteObject", h::delete_object),                // 0xF0
    NONE,                                                // 0xF1
    NONE,                                                // 0xF2
    NONE,                                                // 0xF3
    NONE,                                                // 0xF4
    NONE,                                                // 0xF5
    NONE,                                                // 0xF6
    on("createPalette", h::create_palette),              // 0xF7
    on("createBrush", h::create_brush),                  // 0xF8
    on("createPatternBrush", h::create_pattern_brush),   // 0xF9
    on("createPenIndirect", h::create_pen_indirect),     // 0xFA
    on("createFontIndirect", h::create_font_indirect),   // 0xFB
    on("createBrushIndirect", h::create_brush_indirect), // 0xFC
    on("createBitmapIndirect", h::create_bitmap_indirect), // 0xFD
    on("createBitmap", h::create_bitmap),                // 0xFE
    on("createRegion", h::create_region),                // 0xFF
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wmf::constants::record;
    use crate::wmf::record::function_index;

    fn entry(function: u16) -> &'static FunctionEntry {
        &FUNCTIONS[function_index(function).unwrap()]
    }

    #[test]
    fn test_names_line_up_with_functions() {
        assert_eq!(entry(record::EOF).name, "end");
        assert_eq!(entry(record::SET_WINDOW_ORG).name, "setWindowOrg");
        assert_eq!(entry(record::POLY_POLYGON).name, "polyPolygon");
        assert_eq!(entry(record::STRETCH_DIB).name, "stretchDib");
        assert_eq!(entry(record::DELETE_OBJECT).name, "deleteObject");
        assert_eq!(entry(record::CREATE_PEN_INDIRECT).name, "createPenIndirect");
        assert_eq!(entry(record::CREATE_REGION).name, "createRegion");
        assert_eq!(entry(record::PAT_BLT).name, "patBlt");
        assert_eq!(entry(record::SCALE_VIEWPORT_EXT).name, "scaleViewportExt");
    }

    #[test]
    fn test_holes_have_no_handler() {
        assert!(FUNCTIONS[0x2F].handler.is_none());
        assert!(FUNCTIONS[0x44].handler.is_none());
        assert!(FUNCTIONS[97].handler.is_none());
        assert_eq!(FUNCTIONS.iter().filter(|e| e.handler.is_none()).count(), 16);
    }
}
