//! Retry and admission control for guarded operations
//!
//! This module runs a unit of work under two shared, long-lived pieces of
//! state:
//! - **[`RetryPolicy`]**: bounded attempts, exponential backoff and an
//!   allow-list of retryable errors. Immutable once built.
//! - **[`ConcurrencyLimiter`]**: a counting semaphore bounding how many
//!   executions are in flight at once.
//!
//! [`RetryExecutor`] owns both. One admission permit is held for the whole
//! retry sequence of a call, not per attempt, and is released on every exit
//! path (success, terminal failure, cancellation, or the caller dropping the
//! future).
//!
//! ```text
//! ADMITTED -> ATTEMPTING -> SUCCEEDED
//!                        -> RETRY_SCHEDULED -> ATTEMPTING
//!                        -> EXHAUSTED
//!                        -> REJECTED_NONRETRYABLE
//!          (every terminal state) -> RELEASED
//! ```
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//!
//! use bootnotes_common::resilience::{ConcurrencyLimiter, RetryExecutor, RetryPolicy};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let policy = RetryPolicy::<std::io::Error>::builder()
//!     .max_attempts(4)
//!     .initial_delay(Duration::from_millis(200))
//!     .multiplier(2.0)
//!     .retry_on("timed_out", |e: &std::io::Error| e.kind() == std::io::ErrorKind::TimedOut)
//!     .build()?;
//! let executor = RetryExecutor::new(policy, ConcurrencyLimiter::new(15)?);
//!
//! let body = executor
//!     .execute(|key: Option<String>| async move { Ok(format!("Body for key: {key:?}")) }, None)
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod attempt;
pub mod backoff;
pub mod constants;
pub mod error;
pub mod executor;
pub mod limiter;
pub mod policy;

pub use attempt::{AttemptOutcome, AttemptRecord, RetryOutcome};
pub use backoff::{Backoff, Jitter};
pub use error::{RetryError, RetryResult};
pub use executor::{Guarded, RetryExecutor};
pub use limiter::{
    AdmissionError, AdmissionPermit, AdmissionStrategy, ConcurrencyLimiter, LimiterMetrics,
};
pub use policy::{ErrorClassifier, HasErrorKind, RetryDecision, RetryPolicy, RetryPolicyBuilder};
