//! Core dispatch primitives for the Daedalus framework.
//!
//! This crate defines the types every other Daedalus crate builds on:
//!
//! - [`Context`]: per-request state shared by middleware and handlers
//! - [`Handler`] and [`Middleware`]: the async dispatch function types
//! - [`Params`]: ordered multimap of query and route parameters
//! - [`ResponseWriter`]: the buffered response handle handlers write to
//! - [`DispatchError`] and [`ErrorEnvelope`]: the error taxonomy and its
//!   JSON wire format
//! - [`CancelSignal`]: cooperative cancellation shared across requests
//!
//! # Example
//!
//! ```rust
//! use daedalus_core::{handler_fn, Context};
//! use http::StatusCode;
//!
//! let handler = handler_fn(|ctx: Context| async move {
//!     ctx.response().set_status(StatusCode::OK);
//!     ctx.response().write(b"hello");
//!     Ok(())
//! });
//!
//! let ctx = Context::mock();
//! tokio_test::block_on(handler(ctx.clone())).unwrap();
//! assert_eq!(ctx.response().status(), Some(StatusCode::OK));
//! ```

#![doc(html_root_url = "https://docs.rs/daedalus-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod cancel;
pub mod context;
pub mod error;
pub mod handler;
pub mod params;
pub mod response;

pub use cancel::{CancelListener, CancelSignal};
pub use context::{Context, RequestId, REQUEST_ID_HEADER};
pub use error::{DispatchError, DispatchResult, ErrorEnvelope};
pub use handler::{handler_fn, noop_handler, BoxFuture, Handler, Middleware};
pub use params::Params;
pub use response::{ResponseData, ResponseWriter};
