//! Common test infrastructure
//!
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{TestServer, TestClient, LISTENER_LAT, LISTENER_LNG};
//! use reqwest::StatusCode;
//!
//! #[tokio::test]
//! async fn test_ask() {
//!     let server = TestServer::spawn().await;
//!     let client = TestClient::new(server.base_url.clone());
//!
//!     let response = client.ask_text("hello", LISTENER_LAT, LISTENER_LNG).await;
//!     assert_eq!(response.status(), StatusCode::OK);
//! }
//! ```

mod client;
mod constants;
mod fixtures;
mod server;

// Public API - this is what tests import
pub use client::TestClient;
pub use constants::*;
pub use fixtures::{seed_drop, DropSeed};
pub use server::TestServer;
