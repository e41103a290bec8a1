//! Handler and middleware function types.
//!
//! Handlers are the unit of dispatch: an async function from a [`Context`]
//! to a dispatch outcome. Middleware are handler transformers; applying one
//! to a handler yields a new handler that runs extra work around it.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::context::Context;
use crate::error::DispatchError;

/// Owned boxed future used across handler boundaries.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// An async request handler.
///
/// A handler writes its response through the context's [`ResponseWriter`]
/// and returns `Ok(())`, or returns a [`DispatchError`] for the dispatcher
/// to render as a JSON error response.
///
/// [`ResponseWriter`]: crate::response::ResponseWriter
pub type Handler =
    Arc<dyn Fn(Context) -> BoxFuture<'static, Result<(), DispatchError>> + Send + Sync>;

/// A middleware wraps one handler into another.
///
/// The returned handler decides if and when the wrapped one runs, so a
/// middleware can observe the request, mutate the response, short-circuit,
/// or recover from the inner handler's error.
pub type Middleware = Arc<dyn Fn(Handler) -> Handler + Send + Sync>;

/// Wraps an async closure into a [`Handler`].
///
/// # Example
///
/// ```rust
/// use daedalus_core::{handler_fn, Context};
///
/// let handler = handler_fn(|ctx: Context| async move {
///     ctx.response().write(b"hello");
///     Ok(())
/// });
/// ```
pub fn handler_fn<F, Fut>(f: F) -> Handler
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), DispatchError>> + Send + 'static,
{
    Arc::new(move |ctx| Box::pin(f(ctx)))
}

/// Returns a handler that accepts the request and writes nothing.
///
/// Dispatching through it yields an empty `200 OK` unless middleware write
/// to the response.
#[must_use]
pub fn noop_handler() -> Handler {
    handler_fn(|_ctx| async { Ok(()) })
}
