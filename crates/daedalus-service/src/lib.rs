//! Request dispatch runtime for the Daedalus framework.
//!
//! This crate turns generated controllers and user handlers into servable
//! HTTP endpoints:
//!
//! - [`Service`] owns the mux, the codec registry, the middleware chain,
//!   and dispatch-wide settings such as the request body cap.
//! - [`Controller`] builds [`MuxHandler`]s that read and decode the body,
//!   then run the finalized middleware chain around the action handler.
//! - [`RouterMux`] maps method and path patterns to built handlers and
//!   extracts path captures.
//! - [`respond_error`] renders the uniform JSON error envelope every
//!   failure path shares.
//! - [`DispatchService`] mounts a service on a hyper connection loop.
//!
//! The first handler built finalizes the middleware chain. Later
//! registration of middleware or codecs panics instead of leaving some
//! routes wrapped differently than others.
//!
//! # Example
//!
//! ```rust
//! use daedalus_codec::JsonCodec;
//! use daedalus_core::handler_fn;
//! use daedalus_service::{payload_unmarshaler, Service};
//! use http::{Method, StatusCode};
//! use std::sync::Arc;
//!
//! let service = Service::new("bottles");
//! service.register_decoder(Arc::new(JsonCodec::new()), &["application/json"]);
//! service.register_encoder(Arc::new(JsonCodec::new()), &["application/json"]);
//!
//! let controller = service.controller("BottleController");
//! let show = handler_fn(|ctx| async move {
//!     ctx.response().set_status(StatusCode::OK);
//!     ctx.response().write(b"cabernet");
//!     Ok(())
//! });
//! let handler = controller.mux_handler("show", Some(show), Some(payload_unmarshaler()));
//! service.route(Method::GET, "/bottles/{id}", handler);
//! ```

#![doc(html_root_url = "https://docs.rs/daedalus-service/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod controller;
pub mod logging;
pub mod mux;
pub mod responder;
pub mod service;
pub mod transport;

pub use config::{
    ServiceConfig, ServiceConfigBuilder, DEFAULT_CONTENT_TYPE, DEFAULT_MAX_REQUEST_BODY_LENGTH,
};
pub use controller::Controller;
pub use logging::{LogAdapter, NoopLogger, TracingLogger};
pub use mux::{body_from_bytes, BoxError, Mux, MuxHandler, RequestBody, RouterMux};
pub use responder::{respond_dispatch_error, respond_error};
pub use service::{payload_unmarshaler, DispatchStats, Service, Unmarshaler};
pub use transport::DispatchService;
