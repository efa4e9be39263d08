//! Common types and utilities shared by the metafile reader and writer.

// Submodule declarations
pub mod binary;
pub mod error;

// Re-exports for convenience
pub use error::{Error, Result};
