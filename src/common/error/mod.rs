//! Unified error types for wmfkit.
//!
//! Lower-level errors (byte readers, the `image` crate) are folded into
//! [`Error`] through the `From` impls in [`conversions`].

// Submodule declarations
pub mod conversions;
pub mod types;

// Re-exports
pub use types::{Error, Result};
