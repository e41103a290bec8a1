//! Uniform JSON error responses.
//!
//! Every failure a client sees goes through [`respond_error`], so error
//! bodies are identical whether they come from routing, body reading,
//! decoding, a handler, or a panic.

use http::header::{HeaderValue, CONTENT_TYPE};
use http::StatusCode;

use daedalus_core::{DispatchError, ErrorEnvelope, ResponseWriter};

/// Writes a JSON error envelope to the response.
///
/// The body is the serialized [`ErrorEnvelope`] followed by a newline.
/// The `Content-Type` is fixed to `application/json`; error responses do
/// not go through encoder negotiation.
pub fn respond_error(writer: &ResponseWriter, status: StatusCode, code: &str, detail: &str) {
    let envelope = ErrorEnvelope {
        code: code.to_owned(),
        status: status.as_u16(),
        detail: detail.to_owned(),
    };
    writer.set_status(status);
    writer.insert_header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    writer.write(&envelope.to_body());
}

/// Writes a [`DispatchError`] to the response using its own status, code,
/// and detail.
pub fn respond_dispatch_error(writer: &ResponseWriter, err: &DispatchError) {
    respond_error(writer, err.status_code(), err.code(), &err.detail());
}
