//! Logging setup for Daedalus services.
//!
//! This crate wires the tracing-subscriber ecosystem for the dispatch
//! runtime:
//!
//! - **Logging**: structured JSON output in production, pretty output in
//!   development, both behind an env-filter.
//! - **Field names**: the canonical field-name constants the dispatch
//!   middleware emits, so downstream log pipelines can rely on them.
//!
//! Per-service log routing (silencing one service, capturing its events
//! in tests) lives on the `Service` itself through its log adapter; this
//! crate only installs the process-wide subscriber those adapters feed.
//!
//! # Example
//!
//! ```rust,ignore
//! use daedalus_telemetry::{init_logging, LogConfig};
//!
//! fn main() {
//!     init_logging(&LogConfig::production()).expect("Failed to init logging");
//!
//!     // Dispatch logs now flow to stdout as JSON...
//! }
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
