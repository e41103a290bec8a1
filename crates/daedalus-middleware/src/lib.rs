//! Middleware composition and built-in middleware for the Daedalus
//! framework.
//!
//! A middleware is a function from [`Handler`] to [`Handler`]; composing a
//! list of them around a terminal handler yields the onion every request
//! travels through. [`compose`] builds that onion, [`from_handler`] lifts
//! plain handler-shaped functions into middleware, and [`builtin`] holds
//! ready-made layers for request ids and request logging.
//!
//! # Example
//!
//! ```rust
//! use daedalus_core::{handler_fn, noop_handler, Context};
//! use daedalus_middleware::{compose, from_handler};
//!
//! let auth = from_handler(|_ctx: Context| async { Ok(()) });
//! let chain = compose(&[auth], noop_handler());
//!
//! tokio_test::block_on(chain(Context::mock())).unwrap();
//! ```
//!
//! [`Handler`]: daedalus_core::Handler

#![doc(html_root_url = "https://docs.rs/daedalus-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod builtin;
pub mod chain;

pub use builtin::{log_request, request_id};
pub use chain::{compose, from_handler, middleware_fn};
