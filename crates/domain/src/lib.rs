//! # Boot Notes Domain
//!
//! Plain data types shared by every boot notes crate.
//!
//! This crate contains:
//! - Configuration structures (resilience, client, logging)
//! - Domain error types and Result definitions
//! - Response value types and domain constants
//!
//! ## Architecture
//! - No dependencies on other boot notes crates
//! - Only external dependencies allowed
//! - Pure data structures, no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
