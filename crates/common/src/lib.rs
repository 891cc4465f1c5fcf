//! Shared building blocks for the boot notes crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: error types and classification
//! - `runtime`: async resilience primitives (retry, admission control)
//! - `observability`: tracing (pulled in by `runtime`)

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod error;

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod resilience;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "foundation")]
pub use error::{CommonError, CommonResult, ErrorClassification, ErrorSeverity};
#[cfg(feature = "runtime")]
pub use resilience::{
    AdmissionPermit, AdmissionStrategy, AttemptRecord, Backoff, ConcurrencyLimiter,
    ErrorClassifier, Guarded, HasErrorKind, Jitter, RetryError, RetryExecutor, RetryOutcome,
    RetryPolicy, RetryPolicyBuilder, RetryResult,
};
