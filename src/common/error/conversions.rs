//! Error conversion implementations.
//!
//! This module contains From trait implementations to convert from internal
//! and third-party error types to the unified Error type.

use super::types::Error;
use crate::common::binary::BinaryError;

impl From<BinaryError> for Error {
    fn from(err: BinaryError) -> Self {
        match err {
            BinaryError::InsufficientData { .. } => Error::TruncatedRecord(err.to_string()),
            BinaryError::ParseError(msg) => Error::Other(msg),
        }
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(e) => Error::Io(e),
            image::ImageError::Decoding(e) => Error::InvalidBitmap(e.to_string()),
            other => Error::Image(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_error_becomes_truncated_record() {
        let err: Error = BinaryError::InsufficientData {
            expected: 4,
            available: 2,
        }
        .into();
        assert!(matches!(err, Error::TruncatedRecord(_)));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_stream_errors_are_fatal() {
        assert!(!Error::CorruptStream { offset: 18 }.is_recoverable());
        assert!(
            !Error::UnsupportedOpcode {
                function: 0x0001,
                offset: 18
            }
            .is_recoverable()
        );
    }
}
