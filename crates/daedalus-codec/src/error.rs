//! Codec error types.

use thiserror::Error;

/// Result type alias using [`CodecError`].
pub type CodecResult<T> = Result<T, CodecError>;

/// The error type for encode and decode operations.
#[derive(Error, Debug)]
pub enum CodecError {
    /// Decoding a request body failed.
    #[error("decode failed: {reason}")]
    Decode {
        /// Why decoding failed.
        reason: String,
    },

    /// Encoding a response payload failed.
    #[error("encode failed: {reason}")]
    Encode {
        /// Why encoding failed.
        reason: String,
    },

    /// Reading or writing the underlying stream failed.
    #[error("codec i/o failed")]
    Io(#[from] std::io::Error),
}

impl CodecError {
    /// Creates a decode error with a reason.
    #[must_use]
    pub fn decode(reason: impl Into<String>) -> Self {
        Self::Decode {
            reason: reason.into(),
        }
    }

    /// Creates an encode error with a reason.
    #[must_use]
    pub fn encode(reason: impl Into<String>) -> Self {
        Self::Encode {
            reason: reason.into(),
        }
    }
}
