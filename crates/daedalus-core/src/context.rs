//! Per-request dispatch context.
//!
//! A [`Context`] is created for every dispatched request and flows through
//! the middleware chain to the handler. It is a cheaply cloneable handle:
//! clones share the same request data, decoded payload, parameters, and
//! response buffer.

use http::{HeaderMap, Method, Uri};
use serde_json::Value;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::cancel::{CancelListener, CancelSignal};
use crate::params::Params;
use crate::response::ResponseWriter;

/// Header consulted for an inbound request identifier.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Unique identifier for a dispatched request.
///
/// Request ids are UUIDv7, so they sort by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Generates a new time-ordered request id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a request id from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parses a request id from header text, if it is a well-formed UUID.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Uuid::parse_str(value).ok().map(Self)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<RequestId> for Uuid {
    fn from(id: RequestId) -> Self {
        id.0
    }
}

/// Per-request state shared by middleware and handlers.
///
/// The payload and parameters are write-once: the dispatcher populates them
/// before the middleware chain runs, and later writes are rejected rather
/// than silently clobbering what earlier stages observed.
///
/// # Example
///
/// ```rust
/// use daedalus_core::{Context, Params};
///
/// let ctx = Context::mock();
///
/// let mut params = Params::new();
/// params.set("id", "42");
/// assert!(ctx.set_params(params));
///
/// assert_eq!(ctx.param("id"), Some("42"));
/// ```
#[derive(Debug, Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

#[derive(Debug)]
struct ContextInner {
    request_id: RequestId,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    params: OnceLock<Params>,
    payload: OnceLock<Value>,
    response: ResponseWriter,
    cancel: CancelSignal,
    started_at: Instant,
}

impl Context {
    /// Creates a context for one request.
    ///
    /// If the request carries a well-formed [`REQUEST_ID_HEADER`], its value
    /// becomes the request id; otherwise a fresh id is generated.
    #[must_use]
    pub fn new(
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        response: ResponseWriter,
        cancel: CancelSignal,
    ) -> Self {
        let request_id = headers
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(RequestId::parse)
            .unwrap_or_default();

        Self {
            inner: Arc::new(ContextInner {
                request_id,
                method,
                uri,
                headers,
                params: OnceLock::new(),
                payload: OnceLock::new(),
                response,
                cancel,
                started_at: Instant::now(),
            }),
        }
    }

    /// Creates a context for a `GET /` request with fresh state.
    ///
    /// Intended for tests and examples.
    #[must_use]
    pub fn mock() -> Self {
        Self::new(
            Method::GET,
            Uri::from_static("/"),
            HeaderMap::new(),
            ResponseWriter::new(),
            CancelSignal::new(),
        )
    }

    /// The unique id for this request.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.inner.request_id
    }

    /// The request method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.inner.method
    }

    /// The full request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.inner.uri
    }

    /// The request path.
    #[must_use]
    pub fn path(&self) -> &str {
        self.inner.uri.path()
    }

    /// All request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.inner.headers
    }

    /// Returns the named request header as text, if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner
            .headers
            .get(name)
            .and_then(|value| value.to_str().ok())
    }

    /// The merged query and route parameters.
    ///
    /// Empty until the dispatcher stores them via [`Context::set_params`].
    #[must_use]
    pub fn params(&self) -> &Params {
        self.inner.params.get().unwrap_or_else(|| empty_params())
    }

    /// Returns the first value of the named parameter.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params().get(name)
    }

    /// Stores the request parameters.
    ///
    /// Only the first call succeeds; returns `false` if parameters were
    /// already set.
    pub fn set_params(&self, params: Params) -> bool {
        self.inner.params.set(params).is_ok()
    }

    /// The decoded request payload, if a decoder produced one.
    #[must_use]
    pub fn payload(&self) -> Option<&Value> {
        self.inner.payload.get()
    }

    /// Stores the decoded payload.
    ///
    /// Only the first call succeeds; returns `false` if a payload was
    /// already set.
    pub fn set_payload(&self, payload: Value) -> bool {
        self.inner.payload.set(payload).is_ok()
    }

    /// The response buffer for this request.
    #[must_use]
    pub fn response(&self) -> &ResponseWriter {
        &self.inner.response
    }

    /// Returns `true` if the service has triggered cancellation.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    /// Returns a future that completes when the service cancels requests.
    #[must_use]
    pub fn cancelled(&self) -> CancelListener {
        self.inner.cancel.listen()
    }

    /// Time elapsed since the context was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.inner.started_at.elapsed()
    }
}

fn empty_params() -> &'static Params {
    static EMPTY: OnceLock<Params> = OnceLock::new();
    EMPTY.get_or_init(Params::new)
}
