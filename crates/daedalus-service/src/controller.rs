//! Controllers group actions and build their dispatch handlers.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use bytes::Bytes;
use futures_util::FutureExt;
use http::{Request, StatusCode};
use http_body_util::{BodyExt, LengthLimitError, Limited};

use daedalus_core::{
    handler_fn, noop_handler, Context, DispatchError, Handler, Params, ResponseWriter,
};
use daedalus_middleware::compose;

use crate::mux::{MuxHandler, RequestBody};
use crate::responder::{respond_dispatch_error, respond_error};
use crate::service::{Service, Unmarshaler};

/// A named group of actions on a service.
///
/// Controllers do not own routes; they build [`MuxHandler`]s that the
/// caller registers on the mux. Building a handler finalizes the service's
/// middleware chain, so all handlers share one immutable chain no matter
/// how many controllers build them.
#[derive(Clone)]
pub struct Controller {
    service: Service,
    name: String,
}

impl Controller {
    pub(crate) fn new(service: Service, name: impl Into<String>) -> Self {
        Self {
            service,
            name: name.into(),
        }
    }

    /// The controller name, used in dispatch logs.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The service this controller belongs to.
    #[must_use]
    pub const fn service(&self) -> &Service {
        &self.service
    }

    /// Builds the dispatch handler for one action.
    ///
    /// The returned handler reads and caps the request body, runs the
    /// unmarshaler if one is given, then drives the request through the
    /// finalized middleware chain around `handler`. An unmarshal failure
    /// swaps the terminal handler for an error responder but still runs
    /// the chain. Panics and uncaught errors become uniform JSON error
    /// responses unless the handler already wrote one.
    pub fn mux_handler(
        &self,
        action: impl Into<String>,
        handler: Option<Handler>,
        unmarshaler: Option<Unmarshaler>,
    ) -> MuxHandler {
        let chain = self.service.finalize();
        let middleware = chain.middleware.clone();
        let wrapped = compose(&middleware, handler.unwrap_or_else(noop_handler));

        let service = self.service.clone();
        let controller = self.name.clone();
        let action = action.into();

        Arc::new(move |writer: ResponseWriter, request: Request<RequestBody>, params: Params| {
            let service = service.clone();
            let controller = controller.clone();
            let action = action.clone();
            let wrapped = Arc::clone(&wrapped);
            let middleware = middleware.clone();
            let unmarshaler = unmarshaler.clone();

            Box::pin(async move {
                let (parts, body) = request.into_parts();
                let ctx = Context::new(
                    parts.method,
                    parts.uri,
                    parts.headers,
                    writer.clone(),
                    service.cancel_signal(),
                );
                ctx.set_params(params);

                let prepared = match unmarshaler {
                    Some(unmarshaler) => {
                        prepare_payload(&service, &ctx, body, &unmarshaler).await
                    }
                    None => Ok(()),
                };

                let entry = match prepared {
                    Ok(()) => wrapped,
                    Err(err) => compose(&middleware, respond_error_handler(err)),
                };

                match AssertUnwindSafe(entry(ctx.clone())).catch_unwind().await {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => {
                        let detail = err.to_string();
                        service.log_error(
                            "uncaught error",
                            &[
                                ("ctrl", controller.as_str()),
                                ("action", action.as_str()),
                                ("err", detail.as_str()),
                            ],
                        );
                        if !writer.written() {
                            respond_dispatch_error(&writer, &err);
                        }
                    }
                    Err(panic) => {
                        let detail = panic_message(panic.as_ref());
                        service.log_error(
                            "handler panic",
                            &[
                                ("ctrl", controller.as_str()),
                                ("action", action.as_str()),
                                ("err", detail),
                            ],
                        );
                        if !writer.written() {
                            respond_error(
                                &writer,
                                StatusCode::INTERNAL_SERVER_ERROR,
                                "internal",
                                detail,
                            );
                        }
                    }
                }
            })
        })
    }
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("service", &self.service.name())
            .field("name", &self.name)
            .finish()
    }
}

/// Reads the request body under the service's length cap and hands it to
/// the unmarshaler. Empty bodies skip the unmarshaler entirely.
async fn prepare_payload(
    service: &Service,
    ctx: &Context,
    body: RequestBody,
    unmarshaler: &Unmarshaler,
) -> Result<(), DispatchError> {
    let limit = service.max_request_body_length();
    let cap = if limit == 0 {
        usize::MAX
    } else {
        usize::try_from(limit).unwrap_or(usize::MAX)
    };

    let collected = Limited::new(body, cap).boxed().collect().await.map_err(|err| {
        if err.downcast_ref::<LengthLimitError>().is_some() {
            DispatchError::request_too_large(limit)
        } else {
            DispatchError::internal(format!("failed to read request body: {err}"))
        }
    })?;

    let bytes = collected.to_bytes();
    if bytes.is_empty() {
        return Ok(());
    }
    unmarshaler(ctx.clone(), service.clone(), bytes).await
}

/// Terminal handler that answers with the given error.
fn respond_error_handler(err: DispatchError) -> Handler {
    let err = Arc::new(err);
    handler_fn(move |ctx: Context| {
        let err = Arc::clone(&err);
        async move {
            respond_dispatch_error(ctx.response(), &err);
            Ok(())
        }
    })
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "handler panicked"
    }
}
