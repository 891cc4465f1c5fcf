//! # Boot Notes Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - Configuration loading (files and `BOOTNOTES_*` environment variables)
//! - HTTP and in-process implementations of the `ApiClient` port
//! - Logging setup
//! - Wiring of retry executors and request services from configuration
//!
//! ## Architecture
//! - Implements traits defined in `bootnotes-core`
//! - Depends on `bootnotes-common`, `bootnotes-domain` and `bootnotes-core`
//! - Contains all "impure" code (I/O, environment, global subscribers)

pub mod config;
pub mod echo;
pub mod errors;
pub mod http;
pub mod observability;
pub mod wiring;

// Re-export commonly used items
pub use echo::EchoApiClient;
pub use http::HttpApiClient;
pub use observability::init_logging;
pub use wiring::{build_client, build_executor, build_guarded_service, build_policy};
