//! Error types for Daedalus dispatch.
//!
//! This module provides [`DispatchError`], the error type used throughout
//! the framework, and [`ErrorEnvelope`], its JSON wire representation.
//!
//! Every failure surfaced to a client goes through the same envelope so
//! error responses stay machine-readable regardless of where the failure
//! originated. The envelope serializes as:
//!
//! ```json
//! {"code":"not_found","status":404,"detail":"/bottles/42"}
//! ```
//!
//! followed by a single newline.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using [`DispatchError`].
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Body emitted when envelope serialization itself fails.
const FALLBACK_BODY: &[u8] = b"{\"code\":\"internal\",\"status\":500,\"detail\":\"error encoding failed\"}";

/// The error type for request dispatch.
///
/// Each variant maps to a stable machine-readable code and an HTTP status,
/// so any error can be rendered as a uniform JSON response.
///
/// # Example
///
/// ```rust
/// use daedalus_core::DispatchError;
/// use http::StatusCode;
///
/// let err = DispatchError::not_found("/bottles/42");
/// assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
/// assert_eq!(err.code(), "not_found");
/// ```
#[derive(Error, Debug)]
pub enum DispatchError {
    /// No handler is registered for the request path.
    #[error("no handler registered for {path}")]
    NotFound {
        /// The request path that failed to match.
        path: String,
    },

    /// The request body exceeded the configured length limit.
    #[error("body length exceeds {limit} bytes")]
    RequestTooLarge {
        /// The limit that was exceeded, in bytes.
        limit: u64,
    },

    /// The request body could not be decoded into a payload.
    #[error("invalid payload: {reason}")]
    InvalidPayload {
        /// Why decoding failed.
        reason: String,
    },

    /// An unexpected failure while serving the request.
    #[error("{message}")]
    Internal {
        /// Human-readable error message.
        message: String,
        /// The underlying error (not exposed to clients).
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl DispatchError {
    /// Creates a not-found error for the given request path.
    #[must_use]
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Creates a request-too-large error for the given byte limit.
    #[must_use]
    pub const fn request_too_large(limit: u64) -> Self {
        Self::RequestTooLarge { limit }
    }

    /// Creates an invalid payload error with a reason.
    #[must_use]
    pub fn invalid_payload(reason: impl Into<String>) -> Self {
        Self::InvalidPayload {
            reason: reason.into(),
        }
    }

    /// Creates an internal error with a message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an internal error wrapping an underlying cause.
    #[must_use]
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::RequestTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::InvalidPayload { .. } => StatusCode::BAD_REQUEST,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the stable machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::RequestTooLarge { .. } => "request_too_large",
            Self::InvalidPayload { .. } => "invalid_payload",
            Self::Internal { .. } => "internal",
        }
    }

    /// Returns the human-readable detail carried by the envelope.
    ///
    /// For not-found errors this is the bare request path. Internal errors
    /// expose their message but never the wrapped source.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::NotFound { path } => path.clone(),
            Self::Internal { message, .. } => message.clone(),
            Self::RequestTooLarge { .. } | Self::InvalidPayload { .. } => self.to_string(),
        }
    }

    /// Returns `true` if the error maps to a 4xx status.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::RequestTooLarge { .. } | Self::InvalidPayload { .. }
        )
    }

    /// Builds the wire envelope for this error.
    #[must_use]
    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            code: self.code().to_owned(),
            status: self.status_code().as_u16(),
            detail: self.detail(),
        }
    }
}

impl From<anyhow::Error> for DispatchError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for DispatchError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidPayload {
            reason: err.to_string(),
        }
    }
}

/// JSON wire representation of a dispatch failure.
///
/// Field order is part of the wire contract: `code`, then `status`, then
/// `detail`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Stable machine-readable error code.
    pub code: String,
    /// HTTP status carried by the response.
    pub status: u16,
    /// Human-readable explanation.
    pub detail: String,
}

impl ErrorEnvelope {
    /// Renders the envelope as a newline-terminated JSON body.
    #[must_use]
    pub fn to_body(&self) -> Vec<u8> {
        let mut body = serde_json::to_vec(self).unwrap_or_else(|_| FALLBACK_BODY.to_vec());
        body.push(b'\n');
        body
    }
}
