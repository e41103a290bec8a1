//! Middleware composition.

use std::future::Future;
use std::sync::Arc;

use daedalus_core::{handler_fn, Context, DispatchError, Handler, Middleware};

/// Composes middleware around a terminal handler.
///
/// The first middleware in the slice becomes the outermost layer: it runs
/// first on the way in and last on the way out.
///
/// # Example
///
/// ```rust
/// use daedalus_core::noop_handler;
/// use daedalus_middleware::compose;
///
/// let chain = compose(&[], noop_handler());
/// ```
#[must_use]
pub fn compose(middleware: &[Middleware], terminal: Handler) -> Handler {
    let mut handler = terminal;
    for layer in middleware.iter().rev() {
        handler = layer(handler);
    }
    handler
}

/// Wraps a closure into a [`Middleware`].
pub fn middleware_fn<F>(f: F) -> Middleware
where
    F: Fn(Handler) -> Handler + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Lifts a handler-shaped function into a [`Middleware`].
///
/// The function runs before the wrapped handler. If it returns an error the
/// wrapped handler is skipped and the error propagates, so inner layers
/// never observe the request.
pub fn from_handler<F, Fut>(f: F) -> Middleware
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), DispatchError>> + Send + 'static,
{
    let pre = handler_fn(f);
    Arc::new(move |next: Handler| {
        let pre = Arc::clone(&pre);
        let wrapped: Handler = Arc::new(move |ctx: Context| {
            let pre = Arc::clone(&pre);
            let next = Arc::clone(&next);
            Box::pin(async move {
                pre(ctx.clone()).await?;
                next(ctx).await
            })
        });
        wrapped
    })
}
