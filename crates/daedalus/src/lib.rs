//! # Daedalus
//!
//! **Design-first HTTP request dispatch framework**
//!
//! Daedalus is the runtime half of a design-first API toolchain: generated
//! controllers and user-written handlers plug into a dispatch core that
//! provides:
//!
//! - **Content Negotiation** – Request and response codecs resolved per
//!   media type, with wildcard fallbacks
//! - **Ordered Middleware** – One chain, finalized when the first handler
//!   is built, wrapping every route and the not-found responder
//! - **Per-Request Context** – Request id, parameters, decoded payload,
//!   response writer, and a cooperative cancellation signal in one handle
//! - **Uniform Errors** – Every failure path renders the same JSON error
//!   envelope
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use daedalus::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let service = Service::new("bottles");
//!     service.register_decoder(Arc::new(JsonCodec::new()), &["application/json"]);
//!     service.register_encoder(Arc::new(JsonCodec::new()), &["application/json"]);
//!     service.use_middleware(request_id());
//!
//!     let controller = service.controller("BottleController");
//!     let show = handler_fn(|ctx| async move {
//!         ctx.response().write(b"cabernet");
//!         Ok(())
//!     });
//!     let handler = controller.mux_handler("show", Some(show), Some(payload_unmarshaler()));
//!     service.route(http::Method::GET, "/bottles/{id}", handler);
//!
//!     // Mount DispatchService::new(service) on a hyper connection loop.
//! }
//! ```
//!
//! ## Architecture
//!
//! Dispatch follows a fixed path from transport to handler:
//!
//! ```text
//! Request → Mux lookup → Context build → Body cap → Unmarshal → Middleware → Handler
//!                                                                               ↓
//! Response ←──────────── Error Responder (on miss, error, or panic) ←──────────┘
//! ```

#![doc(html_root_url = "https://docs.rs/daedalus/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use daedalus_core as core;

// Re-export codec types
pub use daedalus_codec as codec;

// Re-export middleware types
pub use daedalus_middleware as middleware;

// Re-export service types
pub use daedalus_service as service;

// Re-export telemetry types
pub use daedalus_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust,ignore
/// use daedalus::prelude::*;
/// ```
pub mod prelude {
    pub use daedalus_core::{
        handler_fn, Context, DispatchError, DispatchResult, ErrorEnvelope, Handler, Middleware,
        Params, RequestId, ResponseWriter,
    };

    // Re-export codec types
    pub use daedalus_codec::{CodecRegistry, Decoder, Encoder, JsonCodec};

    // Re-export ready-made middleware
    pub use daedalus_middleware::{log_request, request_id};

    // Re-export dispatch types
    pub use daedalus_service::{
        payload_unmarshaler, Controller, DispatchService, LogAdapter, Mux, MuxHandler, RouterMux,
        Service, ServiceConfig, Unmarshaler,
    };

    // Re-export logging setup
    pub use daedalus_telemetry::{init_logging, LogConfig};
}
