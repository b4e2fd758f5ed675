//! Music Map server library
//!
//! Location-based music drops and the AI DJ that talks about them. The
//! modules are exposed for the binary and for the end-to-end tests.

pub mod config;
pub mod conversation;
pub mod credentials;
pub mod dj;
pub mod drop_store;
pub mod llm;
pub mod nearby;
pub mod server;
pub mod services;
pub mod speech;
pub mod sqlite_persistence;
pub mod timeout;
pub mod voice;

// Re-export commonly used types for convenience
pub use config::{AppConfig, CliConfig, Mode};
pub use server::{run_server, RequestsLoggingLevel, ServerConfig};
pub use services::Services;
