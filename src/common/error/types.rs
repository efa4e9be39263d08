//! Unified error types for wmfkit.
//!
//! Every fallible operation in the crate reports through this enum so that
//! header validation, playback and encoding present one consistent API.
use thiserror::Error;

/// Main error type for wmfkit operations.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Header did not match any known metafile shape, or failed its checksum
    #[error("Corrupt header: {0}")]
    CorruptHeader(String),

    /// A record declared a zero (or impossible) size, or the stream ran out
    #[error("Corrupt record stream at offset {offset}")]
    CorruptStream { offset: usize },

    /// Well-formed record whose function is outside the supported set
    #[error("Unsupported opcode 0x{function:04X} at offset {offset}")]
    UnsupportedOpcode { function: u16, offset: usize },

    /// Object table is full
    #[error("Object table overflow (capacity {capacity})")]
    HandleOverflow { capacity: usize },

    /// Handle refers to an empty or out-of-range slot
    #[error("Dangling object handle {handle}")]
    DanglingHandle { handle: u16 },

    /// Record payload is shorter than its parameters require
    #[error("Truncated record: {0}")]
    TruncatedRecord(String),

    /// Embedded device-independent bitmap could not be decoded
    #[error("Invalid bitmap: {0}")]
    InvalidBitmap(String),

    /// Image encoding or decoding failed
    #[error("Image error: {0}")]
    Image(String),

    /// Operation called in the wrong encoder state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether playback may continue after this error.
    ///
    /// Handlers return these for malformed optional data; the dispatcher
    /// logs them and moves on to the next record.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::DanglingHandle { .. }
                | Error::TruncatedRecord(_)
                | Error::InvalidBitmap(_)
                | Error::Image(_)
                | Error::HandleOverflow { .. }
        )
    }
}

/// Result type for wmfkit operations.
pub type Result<T> = std::result::Result<T, Error>;
