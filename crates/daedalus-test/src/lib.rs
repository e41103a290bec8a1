//! # Daedalus Test
//!
//! Test utilities for the Daedalus framework, providing in-memory dispatch
//! testing without requiring actual network connections or port binding.
//!
//! ## Key Features
//!
//! - **In-Memory Testing**: No real network connections or port binding
//! - **Request Builder**: Fluent API for building test requests
//! - **Response Assertions**: Helper methods for validating responses,
//!   including the dispatcher's JSON error envelope
//! - **JSON Support**: Automatic serialization/deserialization of JSON bodies
//! - **Full Dispatch**: Requests go through routing, the complete middleware
//!   chain, and content negotiation
//!
//! ## Example
//!
//! ```ignore
//! use daedalus_test::TestClient;
//! use serde_json::json;
//!
//! #[tokio::test]
//! async fn test_show_bottle() {
//!     // Create a test client from your service
//!     let client = TestClient::new(service);
//!
//!     // Make a request
//!     let response = client
//!         .get("/bottles/42")
//!         .accept("application/json")
//!         .send()
//!         .await;
//!
//!     // Assert response
//!     assert_eq!(response.status_code(), 200);
//!
//!     let bottle: Bottle = response.json().unwrap();
//!     assert_eq!(bottle.id, "42");
//! }
//!
//! #[tokio::test]
//! async fn test_create_bottle() {
//!     let client = TestClient::new(service);
//!
//!     let response = client
//!         .post("/bottles")
//!         .json(&json!({
//!             "name": "Cabernet",
//!             "vintage": 2012
//!         }))
//!         .send()
//!         .await;
//!
//!     assert_eq!(response.status_code(), 201);
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/daedalus-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod request;
mod response;

pub use client::{TestClient, TestClientRequest};
pub use error::TestError;
pub use request::{TestRequest, TestRequestBuilder};
pub use response::TestResponse;
