//! # Boot Notes App
//!
//! Application layer: wires configuration, the API client and both request
//! services together, and runs batches of requests through them.
//!
//! ## Architecture
//! - Depends on `domain`, `core`, and `infra`; the resilience primitives
//!   from `common` are reached through `core` and `infra` only
//! - [`AppContext`] is the dependency container built once at startup
//! - [`batch`] fans requests out concurrently and summarises the results

pub mod batch;
pub mod context;

// Re-export for convenience
pub use batch::{run_guarded_batch, run_programmatic_batch, BatchSummary, RequestReport};
pub use context::AppContext;
