//! Ready-made middleware.

use std::sync::Arc;

use http::header::{HeaderName, HeaderValue};

use daedalus_core::{Context, Handler, Middleware, REQUEST_ID_HEADER};

/// Middleware that echoes the request id on the response.
///
/// The id is the one carried by the context: inherited from the inbound
/// `x-request-id` header when well formed, freshly generated otherwise.
#[must_use]
pub fn request_id() -> Middleware {
    Arc::new(|next: Handler| {
        let wrapped: Handler = Arc::new(move |ctx: Context| {
            let next = Arc::clone(&next);
            Box::pin(async move {
                let id = ctx.request_id().to_string();
                if let Ok(value) = HeaderValue::from_str(&id) {
                    ctx.response()
                        .insert_header(HeaderName::from_static(REQUEST_ID_HEADER), value);
                }
                next(ctx).await
            })
        });
        wrapped
    })
}

/// Middleware that logs one line per dispatched request.
///
/// Emits a `tracing` debug event when the request enters the chain and an
/// info or warn event when it leaves, carrying the method, path, response
/// status, and elapsed time.
#[must_use]
pub fn log_request() -> Middleware {
    Arc::new(|next: Handler| {
        let wrapped: Handler = Arc::new(move |ctx: Context| {
            let next = Arc::clone(&next);
            Box::pin(async move {
                let method = ctx.method().clone();
                let path = ctx.path().to_owned();
                let request_id = ctx.request_id();

                tracing::debug!(
                    request_id = %request_id,
                    http.method = %method,
                    http.path = %path,
                    "request started"
                );

                let result = next(ctx.clone()).await;

                let status = ctx
                    .response()
                    .status()
                    .map_or(200, |status| status.as_u16());
                let duration_ms = u64::try_from(ctx.elapsed().as_millis()).unwrap_or(u64::MAX);

                match &result {
                    Ok(()) => tracing::info!(
                        request_id = %request_id,
                        http.method = %method,
                        http.path = %path,
                        http.status_code = status,
                        duration_ms,
                        "request completed"
                    ),
                    Err(err) => tracing::warn!(
                        request_id = %request_id,
                        http.method = %method,
                        http.path = %path,
                        http.status_code = status,
                        duration_ms,
                        error = %err,
                        "request failed"
                    ),
                }

                result
            })
        });
        wrapped
    })
}
