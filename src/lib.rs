//! wmfkit - Windows Metafile (WMF) interpreter and encoder
//!
//! This library plays back 16-bit Windows Metafiles into pluggable render
//! targets and writes new metafiles from drawing calls.
//!
//! # Features
//!
//! - **Header validation**: Placeable, standard and enhanced headers are told
//!   apart, and placeable checksums are verified
//! - **Record playback**: Every record is dispatched through a sorted function
//!   table to a [`wmf::RenderTarget`]
//! - **Object handle table**: Pens, brushes, fonts, palettes and regions are
//!   tracked exactly as GDI numbers them
//! - **Backends**: A raster target built on `tiny-skia` (feature `paint`), an
//!   SVG writer (feature `svg`) and a call [`wmf::Recorder`] for tests
//! - **Encoder**: [`wmf::MetafileWriter`] emits placeable metafiles that the
//!   player reads back
//!
//! # Example - Rendering a WMF to PNG
//!
//! ```no_run
//! use wmfkit::wmf::{RasterOptions, convert_wmf_to_png};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let data = std::fs::read("drawing.wmf")?;
//! let png = convert_wmf_to_png(&data, &RasterOptions::default())?;
//! std::fs::write("drawing.png", png)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Inspecting the drawing calls
//!
//! ```no_run
//! use wmfkit::wmf::{Metafile, Recorder};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let metafile = Metafile::open("drawing.wmf")?;
//! println!("bounds: {:?} at {} dpi", metafile.bounding_rect(), metafile.default_dpi());
//!
//! let mut recorder = Recorder::new();
//! let report = metafile.play(&mut recorder)?;
//! for call in recorder.calls() {
//!     println!("{call:?}");
//! }
//! println!("{} records, {} skipped", report.records, report.skipped_records);
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Writing a metafile
//!
//! ```no_run
//! use wmfkit::wmf::MetafileWriter;
//! use wmfkit::wmf::geometry::Rect;
//! use wmfkit::wmf::objects::{Brush, Color};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut writer = MetafileWriter::new();
//! writer.begin();
//! writer.set_brush(&Brush::solid(Color::rgb(0, 128, 255)));
//! writer.draw_ellipse(Rect::new(0, 0, 200, 100));
//! writer.save("ellipse.wmf")?;
//! # Ok(())
//! # }
//! ```

/// Common types and utilities shared by the reader and the writer
///
/// This module provides the crate error type and the little-endian binary
/// helpers used by record decoding.
pub mod common;

/// Windows Metafile playback, rendering backends and encoding
pub mod wmf;

pub use common::{Error, Result};
pub use wmf::{Metafile, MetafileWriter, Recorder, RenderTarget};
