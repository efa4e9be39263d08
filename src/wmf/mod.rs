// Windows Metafile (WMF) interpreter and encoder
//
// A WMF file is a recorded sequence of 16-bit GDI calls: an optional
// placeable header, the META_HEADER, then length-prefixed records until an
// end record. `Metafile` validates the header and replays the records into
// any `RenderTarget`; `MetafileWriter` produces such files.
//
// References:
// - [MS-WMF]: Windows Metafile Format Specification
// - https://learn.microsoft.com/en-us/openspecs/windows_protocols/ms-wmf/

pub mod constants;
pub mod dib;
pub mod geometry;
pub mod handles;
pub mod header;
pub mod objects;
pub mod player;
pub mod record;
pub mod target;
pub mod transform;
pub mod writer;

pub use header::{HeaderDefect, HeaderKind, MetafileHeader};
pub use player::{AbortReason, PlayOptions, PlayReport, PlayState};
pub use target::{Recorder, RenderTarget, TextRun};
pub use transform::CoordinateMode;
pub use writer::MetafileWriter;

#[cfg(feature = "paint")]
pub use target::PaintTarget;

#[cfg(feature = "svg")]
pub use target::SvgTarget;

use std::path::Path;

use crate::common::error::{Error, Result};
use geometry::Rect;

/// A loaded metafile ready for playback.
///
/// # Example
///
/// ```no_run
/// use wmfkit::wmf::{Metafile, Recorder};
///
/// let metafile = Metafile::open("drawing.wmf")?;
/// let mut recorder = Recorder::new();
/// let report = metafile.play(&mut recorder)?;
/// println!("{} records, {} calls", report.records, recorder.calls().len());
/// # Ok::<(), wmfkit::common::error::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Metafile {
    data: Vec<u8>,
    header: MetafileHeader,
    options: PlayOptions,
}

impl Metafile {
    /// Take ownership of `data` and validate its header.
    ///
    /// Fails with [`Error::CorruptHeader`] when the header is missing or
    /// unusable, including enhanced metafiles.
    pub fn load(data: impl Into<Vec<u8>>) -> Result<Self> {
        let data = data.into();
        let header = MetafileHeader::parse(&data)?;
        if let Some(defect) = header.defect {
            return Err(Error::CorruptHeader(defect.to_string()));
        }
        Ok(Self {
            data,
            header,
            options: PlayOptions::default(),
        })
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load(std::fs::read(path)?)
    }

    pub fn header(&self) -> &MetafileHeader {
        &self.header
    }

    pub fn bounding_rect(&self) -> Rect {
        self.header.bounding_rect
    }

    /// Logical units per inch: the placeable `inch` field, else 1000.
    pub fn default_dpi(&self) -> u16 {
        self.header.dpi
    }

    pub fn is_placeable(&self) -> bool {
        self.header.is_placeable()
    }

    pub fn is_standard(&self) -> bool {
        self.header.is_standard()
    }

    pub fn is_enhanced(&self) -> bool {
        self.header.is_enhanced()
    }

    pub fn is_valid(&self) -> bool {
        self.header.is_valid()
    }

    /// Stop playback after `max_records` records and trace the last ones.
    /// `None` plays to the end.
    pub fn set_debug(&mut self, max_records: Option<usize>) {
        self.options.max_records = max_records;
    }

    pub fn set_coordinate_mode(&mut self, mode: CoordinateMode) {
        self.options.coordinate_mode = mode;
    }

    pub fn options(&self) -> &PlayOptions {
        &self.options
    }

    /// Replay into `target` and return the raw report, whatever the outcome.
    pub fn play_report(&self, target: &mut dyn RenderTarget) -> PlayReport {
        player::play(&self.header, &self.data, target, &self.options)
    }

    /// Replay into `target`.
    ///
    /// A corrupt record stream, an unsupported function or a refusing target
    /// is an error; reaching the end record or the debug step limit is not.
    pub fn play(&self, target: &mut dyn RenderTarget) -> Result<PlayReport> {
        let report = self.play_report(target);
        match report.state {
            PlayState::Aborted(AbortReason::CorruptStream { offset }) => {
                Err(Error::CorruptStream { offset })
            },
            PlayState::Aborted(AbortReason::UnsupportedOpcode { function, offset }) => {
                Err(Error::UnsupportedOpcode { function, offset })
            },
            PlayState::Aborted(AbortReason::TargetRefused) => {
                Err(Error::InvalidState("render target refused playback".into()))
            },
            PlayState::Aborted(AbortReason::InvalidHeader) => {
                Err(Error::CorruptHeader("metafile header is not valid".into()))
            },
            _ => Ok(report),
        }
    }
}

/// Options for raster conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterOptions {
    /// Output width (None = derive from height or the bounding box)
    pub width: Option<u32>,
    /// Output height (None = derive from width or the bounding box)
    pub height: Option<u32>,
    /// Fill before drawing; `None` leaves the surface transparent
    pub background: Option<objects::Color>,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            background: Some(objects::Color::WHITE),
        }
    }
}

impl RasterOptions {
    /// Largest side used when neither dimension is given.
    const MAX_SIDE: u32 = 4096;

    /// Output size, keeping the aspect ratio of `bounds` when only one side
    /// is given.
    pub fn dimensions(&self, bounds: Rect) -> (u32, u32) {
        let src_w = bounds.width.unsigned_abs().max(1);
        let src_h = bounds.height.unsigned_abs().max(1);
        let (w, h) = match (self.width, self.height) {
            (Some(w), Some(h)) => (w, h),
            (Some(w), None) => (w, (f64::from(w) * f64::from(src_h) / f64::from(src_w)) as u32),
            (None, Some(h)) => ((f64::from(h) * f64::from(src_w) / f64::from(src_h)) as u32, h),
            (None, None) if src_w.max(src_h) > Self::MAX_SIDE => {
                let scale = f64::from(Self::MAX_SIDE) / f64::from(src_w.max(src_h));
                (
                    (f64::from(src_w) * scale) as u32,
                    (f64::from(src_h) * scale) as u32,
                )
            },
            (None, None) => (src_w, src_h),
        };
        (w.max(1), h.max(1))
    }
}

/// Render WMF data to PNG.
///
/// # Example
/// ```no_run
/// use wmfkit::wmf::{RasterOptions, convert_wmf_to_png};
///
/// let wmf_data = std::fs::read("image.wmf")?;
/// let options = RasterOptions { width: Some(800), ..Default::default() };
/// let png = convert_wmf_to_png(&wmf_data, &options)?;
/// std::fs::write("output.png", png)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[cfg(feature = "paint")]
pub fn convert_wmf_to_png(wmf_data: &[u8], options: &RasterOptions) -> Result<Vec<u8>> {
    let metafile = Metafile::load(wmf_data)?;
    let (width, height) = options.dimensions(metafile.bounding_rect());
    let mut target = PaintTarget::new(width, height).with_background(options.background);
    metafile.play(&mut target)?;
    target.encode_png()
}

/// Convert WMF data to a minimal SVG document.
///
/// # Example
/// ```no_run
/// use wmfkit::wmf::convert_wmf_to_svg;
///
/// let wmf_data = std::fs::read("image.wmf")?;
/// let svg = convert_wmf_to_svg(&wmf_data)?;
/// std::fs::write("output.svg", svg)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[cfg(feature = "svg")]
pub fn convert_wmf_to_svg(wmf_data: &[u8]) -> Result<String> {
    let metafile = Metafile::load(wmf_data)?;
    let mut target = SvgTarget::new();
    metafile.play(&mut target)?;
    Ok(target.into_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wmf::geometry::Point;
    use crate::wmf::objects::{Brush, Color, Pen, PenStyle};
    use crate::wmf::target::Call;
    use proptest::prelude::*;

    fn sample() -> Vec<u8> {
        let mut w = MetafileWriter::new();
        w.set_default_dpi(96);
        w.begin();
        w.set_bounding_rect(Rect::new(0, 0, 100, 100));
        w.set_pen(&Pen::new(PenStyle::Null, 0, Color::BLACK));
        w.set_brush(&Brush::solid(Color::rgb(255, 0, 0)));
        w.draw_rect(Rect::new(0, 0, 50, 50));
        w.set_pen(&Pen::new(PenStyle::Solid, 1, Color::BLACK));
        w.move_to(Point::new(0, 0));
        w.line_to(Point::new(100, 100));
        w.end().unwrap()
    }

    #[test]
    fn test_load_rejects_bad_checksum() {
        let mut data = sample();
        data[20] ^= 0x01;
        assert!(matches!(Metafile::load(data), Err(Error::CorruptHeader(_))));
    }

    #[test]
    fn test_load_rejects_short_buffer() {
        assert!(Metafile::load(vec![0u8; 3]).is_err());
    }

    #[test]
    fn test_play_is_repeatable() {
        let metafile = Metafile::load(sample()).unwrap();
        let mut first = Recorder::new();
        let mut second = Recorder::new();
        let a = metafile.play(&mut first).unwrap();
        let b = metafile.play(&mut second).unwrap();
        assert_eq!(a, b);
        assert_eq!(first.calls(), second.calls());
        assert_eq!(first.calls().first(), Some(&Call::Begin(Rect::new(0, 0, 100, 100))));
        assert_eq!(first.calls().last(), Some(&Call::End));
    }

    #[test]
    fn test_step_limit_is_not_an_error() {
        let mut metafile = Metafile::load(sample()).unwrap();
        metafile.set_debug(Some(3));
        let report = metafile.play(&mut Recorder::new()).unwrap();
        assert_eq!(report.state, PlayState::Aborted(AbortReason::StepLimit));
        assert_eq!(report.records, 3);
    }

    #[test]
    fn test_refusing_target_is_an_error() {
        let metafile = Metafile::load(sample()).unwrap();
        let mut target = Recorder::refusing();
        assert!(matches!(metafile.play(&mut target), Err(Error::InvalidState(_))));
        assert!(target.calls().iter().all(|c| !matches!(c, Call::End)));
    }

    #[test]
    fn test_open_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, &sample()).unwrap();
        let metafile = Metafile::open(file.path()).unwrap();
        assert!(metafile.is_placeable());
        assert!(!metafile.is_standard());
        assert!(!metafile.is_enhanced());
        assert_eq!(metafile.default_dpi(), 96);
    }

    #[test]
    fn test_raster_dimensions() {
        let bounds = Rect::new(0, 0, 200, 100);
        let opts = |width, height| RasterOptions {
            width,
            height,
            background: None,
        };
        assert_eq!(opts(Some(400), None).dimensions(bounds), (400, 200));
        assert_eq!(opts(None, Some(50)).dimensions(bounds), (100, 50));
        assert_eq!(opts(None, None).dimensions(bounds), (200, 100));
        assert_eq!(opts(None, None).dimensions(Rect::new(0, 0, 8192, 100)), (4096, 50));
    }

    #[cfg(feature = "paint")]
    #[test]
    fn test_convert_to_png() {
        let png = convert_wmf_to_png(&sample(), &RasterOptions::default()).unwrap();
        let image = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(image.dimensions(), (100, 100));
        assert_eq!(image.get_pixel(10, 40).0, [255, 0, 0, 255]);
        assert_eq!(image.get_pixel(80, 20).0, [255, 255, 255, 255]);
    }

    #[cfg(feature = "svg")]
    #[test]
    fn test_convert_to_svg() {
        let svg = convert_wmf_to_svg(&sample()).unwrap();
        assert!(svg.contains(r##"fill="#ff0000""##));
        assert!(svg.contains("<line"));
        assert!(svg.ends_with("</svg>"));
    }

    proptest! {
        #[test]
        fn prop_header_parse_is_idempotent(data in proptest::collection::vec(any::<u8>(), 0..256)) {
            let a = MetafileHeader::parse(&data);
            let b = MetafileHeader::parse(&data);
            prop_assert_eq!(a.ok(), b.ok());
        }

        #[test]
        fn prop_checksum_bit_flip_rejected(bit in 0u32..16) {
            let mut data = sample();
            data[20 + (bit / 8) as usize] ^= 1 << (bit % 8);
            prop_assert!(Metafile::load(data).is_err());
        }
    }
}
