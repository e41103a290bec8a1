//! The dispatch service.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use bytes::Bytes;
use http::header::{ACCEPT, CONTENT_TYPE};
use http::{HeaderValue, Method, Request, Response, StatusCode};
use http_body_util::Full;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;

use daedalus_codec::{CodecRegistry, Decoder, Encoder};
use daedalus_core::{
    handler_fn, BoxFuture, CancelSignal, Context, DispatchError, Handler, Middleware, Params,
    ResponseWriter,
};
use daedalus_middleware::compose;

use crate::config::ServiceConfig;
use crate::controller::Controller;
use crate::logging::{LogAdapter, NoopLogger, TracingLogger};
use crate::mux::{Mux, MuxHandler, RequestBody, RouterMux};
use crate::responder::respond_dispatch_error;

/// Decodes a request body into the context's payload slot.
///
/// Unmarshalers run after the body has been read and length-checked but
/// before the middleware chain. When one fails, the route's terminal
/// handler is replaced by an error responder and the chain still runs, so
/// middleware observe the failed request.
pub type Unmarshaler = Arc<
    dyn Fn(Context, Service, Bytes) -> BoxFuture<'static, Result<(), DispatchError>> + Send + Sync,
>;

/// Snapshot of dispatch activity counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchStats {
    /// Total requests accepted for dispatch.
    pub dispatched: u64,
    /// Requests currently inside the dispatcher.
    pub in_flight: u64,
}

pub(crate) struct FinalizedChain {
    pub(crate) middleware: Vec<Middleware>,
    pub(crate) not_found: Handler,
}

/// The request-dispatch service.
///
/// A `Service` owns the mux, the codec registry, the middleware chain, and
/// the settings dispatch consults. It is a cheap handle; clones share all
/// state.
///
/// Middleware and codec registration stay open until the first handler is
/// built. Building a handler finalizes the middleware chain exactly once;
/// after that, registration panics rather than silently applying to some
/// routes and not others.
///
/// # Example
///
/// ```rust
/// use daedalus_codec::JsonCodec;
/// use daedalus_service::Service;
/// use std::sync::Arc;
///
/// let service = Service::new("bottles");
/// service.register_decoder(Arc::new(JsonCodec::new()), &["application/json"]);
/// service.register_encoder(Arc::new(JsonCodec::new()), &["application/json"]);
/// ```
#[derive(Clone)]
pub struct Service {
    inner: Arc<ServiceInner>,
}

struct ServiceInner {
    name: String,
    config: RwLock<ServiceConfig>,
    mux: RwLock<Box<dyn Mux>>,
    codecs: RwLock<CodecRegistry>,
    pending: Mutex<Vec<Middleware>>,
    finalized: OnceLock<FinalizedChain>,
    logger: RwLock<Arc<dyn LogAdapter>>,
    cancel: CancelSignal,
    dispatched: AtomicU64,
    in_flight: AtomicU64,
}

impl Service {
    /// Creates a service with default configuration.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, ServiceConfig::default())
    }

    /// Creates a service with the given configuration.
    #[must_use]
    pub fn with_config(name: impl Into<String>, config: ServiceConfig) -> Self {
        let name = name.into();
        let logger = TracingLogger::new(name.clone());
        Self {
            inner: Arc::new(ServiceInner {
                name,
                config: RwLock::new(config),
                mux: RwLock::new(Box::new(RouterMux::new())),
                codecs: RwLock::new(CodecRegistry::new()),
                pending: Mutex::new(Vec::new()),
                finalized: OnceLock::new(),
                logger: RwLock::new(Arc::new(logger)),
                cancel: CancelSignal::new(),
                dispatched: AtomicU64::new(0),
                in_flight: AtomicU64::new(0),
            }),
        }
    }

    /// The service name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Snapshot of the current configuration.
    #[must_use]
    pub fn config(&self) -> ServiceConfig {
        self.inner.config.read().clone()
    }

    /// Current request body length cap in bytes. Zero means uncapped.
    #[must_use]
    pub fn max_request_body_length(&self) -> u64 {
        self.inner.config.read().max_request_body_length()
    }

    /// Caps request body length in bytes. Zero disables the cap.
    ///
    /// The cap is read per dispatch, so it also applies to handlers built
    /// before the call.
    pub fn set_max_request_body_length(&self, limit: u64) {
        self.inner.config.write().set_max_request_body_length(limit);
    }

    /// Sets the default media type for content negotiation.
    pub fn set_default_content_type(&self, content_type: impl Into<String>) {
        self.inner
            .config
            .write()
            .set_default_content_type(content_type.into());
    }

    /// Registers a decoder for the given media type patterns.
    ///
    /// # Panics
    ///
    /// Panics if called after the middleware chain finalized.
    pub fn register_decoder(&self, decoder: Arc<dyn Decoder>, patterns: &[&str]) {
        self.assert_not_finalized("decoder registered");
        self.inner
            .codecs
            .write()
            .register_decoder(decoder, patterns);
    }

    /// Registers an encoder for the given media type patterns.
    ///
    /// # Panics
    ///
    /// Panics if called after the middleware chain finalized.
    pub fn register_encoder(&self, encoder: Arc<dyn Encoder>, patterns: &[&str]) {
        self.assert_not_finalized("encoder registered");
        self.inner
            .codecs
            .write()
            .register_encoder(encoder, patterns);
    }

    /// Appends a middleware to the chain.
    ///
    /// The first middleware registered becomes the outermost layer.
    ///
    /// # Panics
    ///
    /// Panics if called after the middleware chain finalized.
    pub fn use_middleware(&self, middleware: Middleware) {
        self.assert_not_finalized("middleware registered");
        self.inner.pending.lock().push(middleware);
    }

    /// Replaces the log adapter. `None` silences service logging.
    pub fn set_logger(&self, logger: Option<Arc<dyn LogAdapter>>) {
        *self.inner.logger.write() = logger.unwrap_or_else(|| Arc::new(NoopLogger));
    }

    /// Creates a controller bound to this service.
    #[must_use]
    pub fn controller(&self, name: impl Into<String>) -> Controller {
        Controller::new(self.clone(), name)
    }

    /// Registers a built handler under a method and path pattern.
    ///
    /// # Panics
    ///
    /// Panics if the pattern is malformed or conflicts with an existing
    /// route.
    pub fn route(&self, method: Method, pattern: &str, handler: MuxHandler) {
        self.inner.mux.write().handle(method, pattern, handler);
    }

    /// Swaps the mux implementation, dropping existing routes.
    pub fn set_mux(&self, mux: Box<dyn Mux>) {
        *self.inner.mux.write() = mux;
    }

    /// Requests cooperative cancellation of in-flight work.
    ///
    /// Handlers observe this through [`Context::is_cancelled`] and
    /// [`Context::cancelled`].
    pub fn cancel_all(&self) {
        self.inner.cancel.cancel();
    }

    /// The signal shared with every request context.
    #[must_use]
    pub fn cancel_signal(&self) -> CancelSignal {
        self.inner.cancel.clone()
    }

    /// Snapshot of dispatch counters.
    #[must_use]
    pub fn stats(&self) -> DispatchStats {
        DispatchStats {
            dispatched: self.inner.dispatched.load(Ordering::Relaxed),
            in_flight: self.inner.in_flight.load(Ordering::Relaxed),
        }
    }

    /// Logs an informational event through the configured adapter.
    pub fn log_info(&self, message: &str, keyvals: &[(&str, &str)]) {
        let logger = Arc::clone(&*self.inner.logger.read());
        logger.info(message, keyvals);
    }

    /// Logs an error event through the configured adapter.
    pub fn log_error(&self, message: &str, keyvals: &[(&str, &str)]) {
        let logger = Arc::clone(&*self.inner.logger.read());
        logger.error(message, keyvals);
    }

    /// Decodes `body` with the codec matched to the request `Content-Type`.
    ///
    /// Returns `Ok(None)` when no codec matches; the body is then ignored
    /// and dispatch proceeds without a payload.
    pub fn decode_request(
        &self,
        ctx: &Context,
        body: &[u8],
    ) -> Result<Option<Value>, DispatchError> {
        let content_type = ctx.header(CONTENT_TYPE.as_str());
        let default_pattern = self.inner.config.read().default_content_type().to_owned();
        let decoder = self
            .inner
            .codecs
            .read()
            .resolve_decoder(content_type, &default_pattern);

        let Some(decoder) = decoder else {
            return Ok(None);
        };

        let mut payload = Value::Null;
        let mut reader = body;
        decoder
            .decode(&mut reader, &mut payload)
            .map_err(|err| DispatchError::invalid_payload(err.to_string()))?;
        Ok(Some(payload))
    }

    /// Encodes `payload` with the codec negotiated from the `Accept`
    /// header and appends it to the response body.
    ///
    /// When negotiation matches nothing, the payload is rendered as JSON
    /// under the service's default media type.
    pub fn encode_response(&self, ctx: &Context, payload: &Value) -> Result<(), DispatchError> {
        let accept = ctx.header(ACCEPT.as_str());
        let default_pattern = self.inner.config.read().default_content_type().to_owned();
        let resolved = self
            .inner
            .codecs
            .read()
            .resolve_encoder(accept, &default_pattern);

        let (body, content_type) = match resolved {
            Some(resolved) => {
                let mut body = Vec::new();
                resolved.encoder.encode(&mut body, payload).map_err(|err| {
                    DispatchError::internal(format!("response encoding failed: {err}"))
                })?;
                (body, resolved.content_type)
            }
            None => {
                let body = serde_json::to_vec(payload).map_err(|err| {
                    DispatchError::internal(format!("response encoding failed: {err}"))
                })?;
                (body, default_pattern)
            }
        };

        let writer = ctx.response();
        match HeaderValue::from_str(&content_type) {
            Ok(value) => writer.insert_header(CONTENT_TYPE, value),
            Err(_) => {
                writer.insert_header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            }
        }
        writer.write(&body);
        Ok(())
    }

    /// Sets the response status and encodes `payload` as its body.
    pub fn send(
        &self,
        ctx: &Context,
        status: StatusCode,
        payload: &Value,
    ) -> Result<(), DispatchError> {
        ctx.response().set_status(status);
        self.encode_response(ctx, payload)
    }

    /// Dispatches one request through the mux.
    ///
    /// Requests matching no route run the finalized middleware chain
    /// around the not-found responder; if no handler was ever built, the
    /// bare responder runs.
    pub async fn serve(&self, writer: ResponseWriter, request: Request<RequestBody>) {
        self.inner.dispatched.fetch_add(1, Ordering::Relaxed);
        self.inner.in_flight.fetch_add(1, Ordering::Relaxed);

        let matched = {
            let mux = self.inner.mux.read();
            mux.lookup(request.method(), request.uri().path())
        };

        match matched {
            Some((handler, captures)) => {
                let mut params = parse_query(request.uri().query());
                for (name, value) in captures.iter() {
                    params.set(name, value);
                }
                handler(writer, request, params).await;
            }
            None => {
                let (parts, _body) = request.into_parts();
                let ctx = Context::new(
                    parts.method,
                    parts.uri,
                    parts.headers,
                    writer.clone(),
                    self.cancel_signal(),
                );
                ctx.set_params(parse_query(ctx.uri().query()));

                let handler = self.not_found_handler();
                if let Err(err) = handler(ctx).await {
                    let detail = err.to_string();
                    self.log_error("uncaught error", &[("err", detail.as_str())]);
                    if !writer.written() {
                        respond_dispatch_error(&writer, &err);
                    }
                }
            }
        }

        self.inner.in_flight.fetch_sub(1, Ordering::Relaxed);
    }

    /// Dispatches a request and returns the response it produced.
    pub async fn handle(&self, request: Request<RequestBody>) -> Response<Full<Bytes>> {
        let writer = ResponseWriter::new();
        self.serve(writer.clone(), request).await;
        writer.into_response()
    }

    /// Finalizes the middleware chain, composing it exactly once.
    pub(crate) fn finalize(&self) -> &FinalizedChain {
        self.inner.finalized.get_or_init(|| {
            let middleware = std::mem::take(&mut *self.inner.pending.lock());
            let not_found = compose(&middleware, not_found_terminal());
            FinalizedChain {
                middleware,
                not_found,
            }
        })
    }

    fn not_found_handler(&self) -> Handler {
        self.inner
            .finalized
            .get()
            .map_or_else(not_found_terminal, |chain| Arc::clone(&chain.not_found))
    }

    fn assert_not_finalized(&self, operation: &str) {
        assert!(
            self.inner.finalized.get().is_none(),
            "{operation} after the middleware chain was finalized"
        );
    }
}

impl std::fmt::Debug for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Service")
            .field("name", &self.inner.name)
            .field("finalized", &self.inner.finalized.get().is_some())
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

/// Unmarshaler that decodes the body through the codec registry into the
/// context's payload.
#[must_use]
pub fn payload_unmarshaler() -> Unmarshaler {
    Arc::new(|ctx: Context, service: Service, body: Bytes| {
        Box::pin(async move {
            if let Some(payload) = service.decode_request(&ctx, &body)? {
                ctx.set_payload(payload);
            }
            Ok(())
        })
    })
}

fn not_found_terminal() -> Handler {
    handler_fn(|ctx: Context| async move {
        let err = DispatchError::not_found(ctx.path());
        respond_dispatch_error(ctx.response(), &err);
        Ok(())
    })
}

/// Parses query-string pairs into parameters.
pub(crate) fn parse_query(query: Option<&str>) -> Params {
    let mut params = Params::new();
    let Some(query) = query else {
        return params;
    };
    for pair in query.split('&') {
        if pair.is_empty() {
            continue;
        }
        let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
        params.add(decode_component(name), decode_component(value));
    }
    params
}

/// Percent-decodes one query component, treating `+` as space.
fn decode_component(component: &str) -> String {
    let spaced = component.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}
