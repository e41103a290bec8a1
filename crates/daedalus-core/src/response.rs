//! Buffered response state.
//!
//! Handlers, middleware, and the transport adapter all hold clones of one
//! [`ResponseWriter`], so the status and body a handler records are the
//! same ones logging middleware observes and the transport finally sends.

use bytes::{Bytes, BytesMut};
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Response, StatusCode};
use http_body_util::Full;
use parking_lot::Mutex;
use std::sync::Arc;

/// Response state accumulated over one dispatch.
#[derive(Debug, Default)]
pub struct ResponseData {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: BytesMut,
}

impl ResponseData {
    /// The recorded status, if any handler set one.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Headers recorded so far.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Body bytes buffered so far.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Whether a status was set or any body bytes were written.
    #[must_use]
    pub fn written(&self) -> bool {
        self.status.is_some() || !self.body.is_empty()
    }
}

/// Cloneable handle to the response buffer for one request.
///
/// Every clone refers to the same underlying [`ResponseData`]. Once the
/// dispatch completes, [`ResponseWriter::into_response`] drains the buffer
/// into an HTTP response; a dispatch that never wrote anything becomes an
/// empty `200 OK`.
#[derive(Debug, Clone, Default)]
pub struct ResponseWriter {
    data: Arc<Mutex<ResponseData>>,
}

impl ResponseWriter {
    /// Creates a writer with empty response state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the response status, replacing any earlier value.
    pub fn set_status(&self, status: StatusCode) {
        self.data.lock().status = Some(status);
    }

    /// Returns the recorded status, if any.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.data.lock().status
    }

    /// Sets a response header, replacing previous values of the same name.
    pub fn insert_header(&self, name: HeaderName, value: HeaderValue) {
        self.data.lock().headers.insert(name, value);
    }

    /// Returns a copy of the named response header, if set.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<HeaderValue> {
        self.data.lock().headers.get(name).cloned()
    }

    /// Appends bytes to the response body.
    pub fn write(&self, bytes: &[u8]) {
        self.data.lock().body.extend_from_slice(bytes);
    }

    /// Whether a status was set or any body bytes were written.
    #[must_use]
    pub fn written(&self) -> bool {
        self.data.lock().written()
    }

    /// Number of body bytes buffered so far.
    #[must_use]
    pub fn body_len(&self) -> usize {
        self.data.lock().body.len()
    }

    /// Copies the body buffered so far.
    #[must_use]
    pub fn body_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(&self.data.lock().body)
    }

    /// Runs `f` against the accumulated response state.
    pub fn inspect<T>(&self, f: impl FnOnce(&ResponseData) -> T) -> T {
        f(&self.data.lock())
    }

    /// Drains the buffered state into an HTTP response.
    ///
    /// Remaining clones of this writer observe an empty buffer afterwards.
    #[must_use]
    pub fn into_response(self) -> Response<Full<Bytes>> {
        let mut data = self.data.lock();
        let status = data.status.take().unwrap_or(StatusCode::OK);
        let headers = std::mem::take(&mut data.headers);
        let body = std::mem::take(&mut data.body).freeze();
        drop(data);

        let mut response = Response::new(Full::new(body));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        response
    }
}
