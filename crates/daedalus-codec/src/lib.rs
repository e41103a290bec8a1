//! Content negotiation and codec registry for the Daedalus framework.
//!
//! A [`CodecRegistry`] maps media type patterns to [`Decoder`] and
//! [`Encoder`] implementations. The dispatcher consults it twice per
//! request: once against the `Content-Type` header to pick a request body
//! decoder, and once against the `Accept` header to pick a response
//! encoder.
//!
//! Matching is deliberately small: patterns are media types with their
//! parameters stripped, compared case-insensitively, with a single
//! wildcard pattern `*/*` as fallback. Quality factors in `Accept` are
//! ignored; entries are tried in the order the client listed them.
//!
//! # Example
//!
//! ```rust
//! use daedalus_codec::{CodecRegistry, JsonCodec, WILDCARD};
//! use std::sync::Arc;
//!
//! let mut registry = CodecRegistry::new();
//! registry.register_decoder(Arc::new(JsonCodec::new()), &["application/json"]);
//!
//! let decoder = registry.resolve_decoder(Some("application/json; charset=utf-8"), "application/json");
//! assert!(decoder.is_some());
//!
//! let none = registry.resolve_decoder(Some("application/octet-stream"), "application/json");
//! assert!(none.is_none());
//! ```

#![doc(html_root_url = "https://docs.rs/daedalus-codec/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod json;
pub mod registry;

pub use error::{CodecError, CodecResult};
pub use json::JsonCodec;
pub use registry::{CodecRegistry, Decoder, Encoder, ResolvedEncoder, WILDCARD};
