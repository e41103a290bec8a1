//! Request multiplexer.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use http::{Method, Request};
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};

use daedalus_core::{BoxFuture, Params, ResponseWriter};

/// Boxed error produced by request body streams.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Type-erased request body.
pub type RequestBody = BoxBody<Bytes, BoxError>;

/// A registered route handler.
///
/// A mux handler owns the complete dispatch for one route: reading the
/// body, running the middleware chain, and writing the response. Build
/// them with [`Controller::mux_handler`].
///
/// [`Controller::mux_handler`]: crate::Controller::mux_handler
pub type MuxHandler = Arc<
    dyn Fn(ResponseWriter, Request<RequestBody>, Params) -> BoxFuture<'static, ()> + Send + Sync,
>;

/// Builds a [`RequestBody`] from in-memory bytes.
#[must_use]
pub fn body_from_bytes(bytes: impl Into<Bytes>) -> RequestBody {
    Full::new(bytes.into())
        .map_err(|never| match never {})
        .boxed()
}

/// Routes requests to registered [`MuxHandler`]s.
pub trait Mux: Send + Sync {
    /// Registers `handler` for a method and path pattern.
    ///
    /// # Panics
    ///
    /// Implementations may panic when `pattern` is malformed or conflicts
    /// with an existing registration.
    fn handle(&mut self, method: Method, pattern: &str, handler: MuxHandler);

    /// Looks up the handler and path captures for a request line.
    fn lookup(&self, method: &Method, path: &str) -> Option<(MuxHandler, Params)>;
}

/// Default [`Mux`] backed by one radix router per method.
///
/// Patterns use `{name}` captures, e.g. `/bottles/{id}`.
#[derive(Default)]
pub struct RouterMux {
    routes: HashMap<Method, matchit::Router<MuxHandler>>,
}

impl RouterMux {
    /// Creates an empty mux.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Mux for RouterMux {
    fn handle(&mut self, method: Method, pattern: &str, handler: MuxHandler) {
        self.routes
            .entry(method)
            .or_default()
            .insert(pattern, handler)
            .unwrap_or_else(|err| panic!("invalid route `{pattern}`: {err}"));
    }

    fn lookup(&self, method: &Method, path: &str) -> Option<(MuxHandler, Params)> {
        let matched = self.routes.get(method)?.at(path).ok()?;
        let mut params = Params::new();
        for (name, value) in matched.params.iter() {
            params.set(name, value);
        }
        Some((Arc::clone(matched.value), params))
    }
}
