//! End-to-end dispatch integration tests.
//!
//! These tests drive full requests through [`Service::handle`] and verify
//! the dispatch contract:
//!
//! 1. Routing - path captures and query parameters reach the handler
//! 2. Middleware - chain finalizes once and wraps every route in order
//! 3. Payloads - bodies decode through negotiated codecs into the context
//! 4. Limits - the body cap answers 413 before the unmarshaler runs
//! 5. Errors - uncaught errors, panics, and misses share one JSON envelope

use std::sync::Arc;

use bytes::Bytes;
use http::{HeaderValue, Method, Request, Response, StatusCode};
use http_body_util::{BodyExt, Full};
use parking_lot::Mutex;
use serde_json::{json, Value};

use daedalus_codec::JsonCodec;
use daedalus_core::{handler_fn, Context, DispatchError, Handler, Middleware};
use daedalus_middleware::request_id;
use daedalus_service::{body_from_bytes, payload_unmarshaler, LogAdapter, RequestBody, Service};

/// Creates a request with an empty body.
fn make_request(method: Method, uri: &str) -> Request<RequestBody> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(body_from_bytes(Bytes::new()))
        .unwrap()
}

/// Creates a request carrying a JSON body.
fn make_json_request(method: Method, uri: &str, body: &'static str) -> Request<RequestBody> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body_from_bytes(body))
        .unwrap()
}

/// Creates a request carrying a body under an arbitrary media type.
fn make_typed_request(
    method: Method,
    uri: &str,
    content_type: &str,
    body: &'static str,
) -> Request<RequestBody> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", content_type)
        .body(body_from_bytes(body))
        .unwrap()
}

/// Collects a dispatched response into its status and body text.
async fn response_text(response: Response<Full<Bytes>>) -> (StatusCode, String) {
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

/// Creates a service with JSON codecs registered both ways.
fn json_service(name: &str) -> Service {
    let service = Service::new(name);
    service.register_decoder(Arc::new(JsonCodec::new()), &["application/json"]);
    service.register_encoder(Arc::new(JsonCodec::new()), &["application/json"]);
    service
}

/// Middleware that records entry and exit under the given label.
fn tracking(log: Arc<Mutex<Vec<String>>>, label: &'static str) -> Middleware {
    Arc::new(move |next: Handler| {
        let log = Arc::clone(&log);
        let wrapped: Handler = Arc::new(move |ctx: Context| {
            let log = Arc::clone(&log);
            let next = Arc::clone(&next);
            Box::pin(async move {
                log.lock().push(format!("{label}-pre"));
                let result = next(ctx).await;
                log.lock().push(format!("{label}-post"));
                result
            })
        });
        wrapped
    })
}

/// Log adapter that records every event for later assertions.
#[derive(Default)]
struct RecordingLogger {
    events: Mutex<Vec<String>>,
}

impl LogAdapter for RecordingLogger {
    fn info(&self, message: &str, _keyvals: &[(&str, &str)]) {
        self.events.lock().push(format!("info:{message}"));
    }

    fn error(&self, message: &str, _keyvals: &[(&str, &str)]) {
        self.events.lock().push(format!("error:{message}"));
    }
}

// ============================================================================
// Routing Tests
// ============================================================================

#[tokio::test]
async fn test_route_delivers_captures_and_query_params() {
    let service = json_service("bottles");
    let controller = service.controller("BottleController");

    let handler = handler_fn(|ctx: Context| async move {
        assert_eq!(ctx.param("id"), Some("42"));
        assert_eq!(ctx.param("sort"), Some("asc"));
        ctx.response().set_status(StatusCode::OK);
        ctx.response().write(b"response");
        Ok(())
    });
    let mux_handler = controller.mux_handler("show", Some(handler), Some(payload_unmarshaler()));
    service.route(Method::GET, "/bottles/{id}", mux_handler);

    let response = service
        .handle(make_request(Method::GET, "/bottles/42?sort=asc"))
        .await;

    let (status, body) = response_text(response).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "response");
}

#[tokio::test]
async fn test_path_capture_overrides_query_param() {
    let service = json_service("bottles");
    let controller = service.controller("BottleController");

    let handler = handler_fn(|ctx: Context| async move {
        ctx.response().write(ctx.param("id").unwrap_or("").as_bytes());
        Ok(())
    });
    let mux_handler = controller.mux_handler("show", Some(handler), None);
    service.route(Method::GET, "/bottles/{id}", mux_handler);

    let response = service
        .handle(make_request(Method::GET, "/bottles/42?id=99"))
        .await;

    let (status, body) = response_text(response).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "42");
}

#[tokio::test]
async fn test_unrouted_path_answers_not_found_envelope() {
    let service = json_service("bottles");

    let response = service.handle(make_request(Method::GET, "/foo")).await;

    let (status, body) = response_text(response).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "{\"code\":\"not_found\",\"status\":404,\"detail\":\"/foo\"}\n");
}

#[tokio::test]
async fn test_wrong_method_answers_not_found() {
    let service = json_service("bottles");
    let controller = service.controller("BottleController");

    let mux_handler = controller.mux_handler("show", None, None);
    service.route(Method::GET, "/bottles/{id}", mux_handler);

    let response = service.handle(make_request(Method::POST, "/bottles/42")).await;

    let (status, body) = response_text(response).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let envelope: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(envelope["code"], "not_found");
    assert_eq!(envelope["detail"], "/bottles/42");
}

// ============================================================================
// Middleware Tests
// ============================================================================

#[tokio::test]
async fn test_middleware_wraps_handler_in_registration_order() {
    let log = Arc::new(Mutex::new(Vec::new()));

    let service = json_service("bottles");
    service.use_middleware(tracking(Arc::clone(&log), "first"));
    service.use_middleware(tracking(Arc::clone(&log), "second"));

    let controller = service.controller("BottleController");
    let log_in_handler = Arc::clone(&log);
    let handler = handler_fn(move |ctx: Context| {
        let log = Arc::clone(&log_in_handler);
        async move {
            log.lock().push("handler".to_owned());
            ctx.response().set_status(StatusCode::OK);
            Ok(())
        }
    });
    let mux_handler = controller.mux_handler("list", Some(handler), None);
    service.route(Method::GET, "/bottles", mux_handler);

    let response = service.handle(make_request(Method::GET, "/bottles")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let entries = log.lock();
    let order: Vec<&str> = entries.iter().map(String::as_str).collect();
    assert_eq!(
        order,
        ["first-pre", "second-pre", "handler", "second-post", "first-post"]
    );
}

#[tokio::test]
async fn test_middleware_runs_once_per_request_across_builds() {
    let log = Arc::new(Mutex::new(Vec::new()));

    let service = json_service("bottles");
    service.use_middleware(tracking(Arc::clone(&log), "chain"));

    let controller = service.controller("BottleController");
    let first = controller.mux_handler("list", Some(handler_fn(|_ctx| async { Ok(()) })), None);
    let second = controller.mux_handler("show", Some(handler_fn(|_ctx| async { Ok(()) })), None);
    service.route(Method::GET, "/bottles", first);
    service.route(Method::GET, "/bottles/{id}", second);

    let response = service.handle(make_request(Method::GET, "/bottles")).await;
    assert_eq!(response.status(), StatusCode::OK);

    // Two handler builds must not stack the chain twice.
    let entries = log.lock();
    let order: Vec<&str> = entries.iter().map(String::as_str).collect();
    assert_eq!(order, ["chain-pre", "chain-post"]);
}

#[tokio::test]
async fn test_not_found_runs_finalized_middleware() {
    let log = Arc::new(Mutex::new(Vec::new()));

    let service = json_service("bottles");
    service.use_middleware(tracking(Arc::clone(&log), "chain"));

    // Building any handler finalizes the chain around the miss responder.
    let controller = service.controller("BottleController");
    let mux_handler = controller.mux_handler("list", None, None);
    service.route(Method::GET, "/bottles", mux_handler);

    let response = service.handle(make_request(Method::GET, "/foo")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let entries = log.lock();
    let order: Vec<&str> = entries.iter().map(String::as_str).collect();
    assert_eq!(order, ["chain-pre", "chain-post"]);
}

#[tokio::test]
async fn test_request_id_middleware_echoes_inbound_header() {
    let service = json_service("bottles");
    service.use_middleware(request_id());

    let controller = service.controller("BottleController");
    let mux_handler = controller.mux_handler("list", None, None);
    service.route(Method::GET, "/bottles", mux_handler);

    let request = Request::builder()
        .method(Method::GET)
        .uri("/bottles")
        .header("x-request-id", "550e8400-e29b-41d4-a716-446655440000")
        .body(body_from_bytes(Bytes::new()))
        .unwrap();
    let response = service.handle(request).await;

    assert_eq!(
        response.headers().get("x-request-id"),
        Some(&HeaderValue::from_static(
            "550e8400-e29b-41d4-a716-446655440000"
        ))
    );
}

#[test]
#[should_panic(expected = "middleware registered after the middleware chain was finalized")]
fn test_middleware_registration_after_handler_build_panics() {
    let service = Service::new("bottles");
    let controller = service.controller("BottleController");
    let _handler = controller.mux_handler("list", None, None);

    service.use_middleware(Arc::new(|next: Handler| next));
}

// ============================================================================
// Payload Tests
// ============================================================================

#[tokio::test]
async fn test_json_body_decodes_into_payload() {
    let service = json_service("bottles");
    let controller = service.controller("BottleController");

    let handler = handler_fn(|ctx: Context| async move {
        assert_eq!(ctx.payload(), Some(&json!({"hello": "world"})));
        ctx.response().set_status(StatusCode::OK);
        Ok(())
    });
    let mux_handler = controller.mux_handler("create", Some(handler), Some(payload_unmarshaler()));
    service.route(Method::POST, "/bottles", mux_handler);

    let response = service
        .handle(make_json_request(Method::POST, "/bottles", r#"{"hello":"world"}"#))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_missing_content_type_decodes_with_default() {
    let service = json_service("bottles");
    let controller = service.controller("BottleController");

    let handler = handler_fn(|ctx: Context| async move {
        assert_eq!(ctx.payload(), Some(&json!({"hello": "world"})));
        Ok(())
    });
    let mux_handler = controller.mux_handler("create", Some(handler), Some(payload_unmarshaler()));
    service.route(Method::POST, "/bottles", mux_handler);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/bottles")
        .body(body_from_bytes(r#"{"hello":"world"}"#))
        .unwrap();
    let response = service.handle(request).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_wildcard_decoder_catches_unknown_media_type() {
    let service = Service::new("bottles");
    service.register_decoder(Arc::new(JsonCodec::new()), &["*/*"]);

    let controller = service.controller("BottleController");
    let handler = handler_fn(|ctx: Context| async move {
        assert_eq!(ctx.payload(), Some(&json!({"hello": "world"})));
        Ok(())
    });
    let mux_handler = controller.mux_handler("create", Some(handler), Some(payload_unmarshaler()));
    service.route(Method::POST, "/bottles", mux_handler);

    let response = service
        .handle(make_typed_request(
            Method::POST,
            "/bottles",
            "application/octet-stream",
            r#"{"hello":"world"}"#,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unmatched_media_type_skips_decoding_silently() {
    let service = json_service("bottles");
    let controller = service.controller("BottleController");

    let handler = handler_fn(|ctx: Context| async move {
        // No codec claimed the body, so no payload was set.
        assert!(ctx.payload().is_none());
        ctx.response().set_status(StatusCode::OK);
        Ok(())
    });
    let mux_handler = controller.mux_handler("create", Some(handler), Some(payload_unmarshaler()));
    service.route(Method::POST, "/bottles", mux_handler);

    let response = service
        .handle(make_typed_request(
            Method::POST,
            "/bottles",
            "application/octet-stream",
            "opaque bytes",
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_malformed_body_answers_bad_request_through_chain() {
    let log = Arc::new(Mutex::new(Vec::new()));

    let service = json_service("bottles");
    service.use_middleware(tracking(Arc::clone(&log), "chain"));

    let controller = service.controller("BottleController");
    let log_in_handler = Arc::clone(&log);
    let handler = handler_fn(move |_ctx: Context| {
        let log = Arc::clone(&log_in_handler);
        async move {
            log.lock().push("handler".to_owned());
            Ok(())
        }
    });
    let mux_handler = controller.mux_handler("create", Some(handler), Some(payload_unmarshaler()));
    service.route(Method::POST, "/bottles", mux_handler);

    let response = service
        .handle(make_json_request(Method::POST, "/bottles", "{oops"))
        .await;

    let (status, body) = response_text(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let envelope: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(envelope["code"], "invalid_payload");
    assert_eq!(envelope["status"], 400);

    // The chain still ran around the error responder; the action did not.
    let entries = log.lock();
    let order: Vec<&str> = entries.iter().map(String::as_str).collect();
    assert_eq!(order, ["chain-pre", "chain-post"]);
}

// ============================================================================
// Body Limit Tests
// ============================================================================

#[tokio::test]
async fn test_body_over_limit_answers_payload_too_large() {
    let service = json_service("bottles");
    service.set_max_request_body_length(4);

    let controller = service.controller("BottleController");
    let mux_handler = controller.mux_handler(
        "create",
        Some(handler_fn(|_ctx| async { Ok(()) })),
        Some(payload_unmarshaler()),
    );
    service.route(Method::POST, "/bottles", mux_handler);

    let response = service
        .handle(make_json_request(Method::POST, "/bottles", "\"234\""))
        .await;

    let (status, body) = response_text(response).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(
        body,
        "{\"code\":\"request_too_large\",\"status\":413,\"detail\":\"body length exceeds 4 bytes\"}\n"
    );
}

#[tokio::test]
async fn test_body_at_limit_passes() {
    let service = json_service("bottles");
    service.set_max_request_body_length(5);

    let controller = service.controller("BottleController");
    let handler = handler_fn(|ctx: Context| async move {
        assert_eq!(ctx.payload(), Some(&json!("234")));
        Ok(())
    });
    let mux_handler = controller.mux_handler("create", Some(handler), Some(payload_unmarshaler()));
    service.route(Method::POST, "/bottles", mux_handler);

    let response = service
        .handle(make_json_request(Method::POST, "/bottles", "\"234\""))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_limit_ignored_without_unmarshaler() {
    let service = json_service("bottles");
    service.set_max_request_body_length(4);

    let controller = service.controller("BottleController");
    let handler = handler_fn(|ctx: Context| async move {
        ctx.response().set_status(StatusCode::OK);
        Ok(())
    });
    // No unmarshaler, so the body is never read and never measured.
    let mux_handler = controller.mux_handler("create", Some(handler), None);
    service.route(Method::POST, "/bottles", mux_handler);

    let response = service
        .handle(make_json_request(
            Method::POST,
            "/bottles",
            r#"{"way":"over the four byte limit"}"#,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_limit_applies_to_handlers_built_before_the_change() {
    let service = json_service("bottles");

    let controller = service.controller("BottleController");
    let mux_handler = controller.mux_handler(
        "create",
        Some(handler_fn(|_ctx| async { Ok(()) })),
        Some(payload_unmarshaler()),
    );
    service.route(Method::POST, "/bottles", mux_handler);

    // The cap is read per dispatch, not captured at build time.
    service.set_max_request_body_length(4);

    let response = service
        .handle(make_json_request(Method::POST, "/bottles", "\"234\""))
        .await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

// ============================================================================
// Error Handling Tests
// ============================================================================

#[tokio::test]
async fn test_uncaught_error_answers_envelope_and_logs() {
    let logger = Arc::new(RecordingLogger::default());

    let service = json_service("bottles");
    let adapter: Arc<dyn LogAdapter> = logger.clone();
    service.set_logger(Some(adapter));

    let controller = service.controller("BottleController");
    let handler = handler_fn(|_ctx: Context| async move {
        Err(DispatchError::internal("boom"))
    });
    let mux_handler = controller.mux_handler("list", Some(handler), None);
    service.route(Method::GET, "/bottles", mux_handler);

    let response = service.handle(make_request(Method::GET, "/bottles")).await;

    let (status, body) = response_text(response).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "{\"code\":\"internal\",\"status\":500,\"detail\":\"boom\"}\n");

    let events = logger.events.lock();
    let names: Vec<&str> = events.iter().map(String::as_str).collect();
    assert_eq!(names, ["error:uncaught error"]);
}

#[tokio::test]
async fn test_silenced_logger_still_answers_envelope() {
    let service = json_service("bottles");
    service.set_logger(None);

    let controller = service.controller("BottleController");
    let handler = handler_fn(|_ctx: Context| async move {
        Err(DispatchError::internal("boom"))
    });
    let mux_handler = controller.mux_handler("list", Some(handler), None);
    service.route(Method::GET, "/bottles", mux_handler);

    let response = service.handle(make_request(Method::GET, "/bottles")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_client_error_keeps_its_own_status() {
    let service = json_service("bottles");

    let controller = service.controller("BottleController");
    let handler = handler_fn(|_ctx: Context| async move {
        Err(DispatchError::invalid_payload("missing field `name`"))
    });
    let mux_handler = controller.mux_handler("create", Some(handler), None);
    service.route(Method::POST, "/bottles", mux_handler);

    let response = service.handle(make_request(Method::POST, "/bottles")).await;

    let (status, body) = response_text(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let envelope: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(envelope["code"], "invalid_payload");
    assert_eq!(envelope["detail"], "invalid payload: missing field `name`");
}

#[tokio::test]
async fn test_error_after_partial_write_leaves_response_alone() {
    let service = json_service("bottles");

    let controller = service.controller("BottleController");
    let handler = handler_fn(|ctx: Context| async move {
        ctx.response().set_status(StatusCode::OK);
        ctx.response().write(b"partial");
        Err(DispatchError::internal("too late"))
    });
    let mux_handler = controller.mux_handler("list", Some(handler), None);
    service.route(Method::GET, "/bottles", mux_handler);

    let response = service.handle(make_request(Method::GET, "/bottles")).await;

    // The handler already wrote, so no envelope is appended.
    let (status, body) = response_text(response).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "partial");
}

#[tokio::test]
async fn test_handler_panic_answers_internal_envelope() {
    let logger = Arc::new(RecordingLogger::default());

    let service = json_service("bottles");
    let adapter: Arc<dyn LogAdapter> = logger.clone();
    service.set_logger(Some(adapter));

    let controller = service.controller("BottleController");
    let handler = handler_fn(|_ctx: Context| async move { panic!("bottle exploded") });
    let mux_handler = controller.mux_handler("list", Some(handler), None);
    service.route(Method::GET, "/bottles", mux_handler);

    let response = service.handle(make_request(Method::GET, "/bottles")).await;

    let (status, body) = response_text(response).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let envelope: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(envelope["code"], "internal");
    assert_eq!(envelope["detail"], "bottle exploded");

    let events = logger.events.lock();
    let names: Vec<&str> = events.iter().map(String::as_str).collect();
    assert_eq!(names, ["error:handler panic"]);
}

// ============================================================================
// Response Encoding Tests
// ============================================================================

#[tokio::test]
async fn test_send_negotiates_and_encodes() {
    let service = json_service("bottles");

    let controller = service.controller("BottleController");
    let service_in_handler = service.clone();
    let handler = handler_fn(move |ctx: Context| {
        let service = service_in_handler.clone();
        async move {
            service.send(&ctx, StatusCode::OK, &json!({"id": 42, "name": "cabernet"}))?;
            Ok(())
        }
    });
    let mux_handler = controller.mux_handler("show", Some(handler), None);
    service.route(Method::GET, "/bottles/{id}", mux_handler);

    let request = Request::builder()
        .method(Method::GET)
        .uri("/bottles/42")
        .header("accept", "application/json")
        .body(body_from_bytes(Bytes::new()))
        .unwrap();
    let response = service.handle(request).await;

    assert_eq!(
        response.headers().get("content-type"),
        Some(&HeaderValue::from_static("application/json"))
    );
    let (status, body) = response_text(response).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "{\"id\":42,\"name\":\"cabernet\"}");
}

// ============================================================================
// Lifecycle Tests
// ============================================================================

#[tokio::test]
async fn test_cancel_all_is_visible_to_handlers() {
    let service = json_service("bottles");

    let controller = service.controller("BottleController");
    let handler = handler_fn(|ctx: Context| async move {
        let state = if ctx.is_cancelled() { "cancelled" } else { "live" };
        ctx.response().write(state.as_bytes());
        Ok(())
    });
    let mux_handler = controller.mux_handler("list", Some(handler), None);
    service.route(Method::GET, "/bottles", mux_handler);

    service.cancel_all();
    let response = service.handle(make_request(Method::GET, "/bottles")).await;

    let (_, body) = response_text(response).await;
    assert_eq!(body, "cancelled");
}

#[tokio::test]
async fn test_stats_count_dispatches() {
    let service = json_service("bottles");
    let controller = service.controller("BottleController");
    let mux_handler = controller.mux_handler("list", None, None);
    service.route(Method::GET, "/bottles", mux_handler);

    service.handle(make_request(Method::GET, "/bottles")).await;
    service.handle(make_request(Method::GET, "/nope")).await;

    let stats = service.stats();
    assert_eq!(stats.dispatched, 2);
    assert_eq!(stats.in_flight, 0);
}
