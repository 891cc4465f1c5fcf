//! Application constants
//!
//! Defaults mirror the request-processing demo: fifteen concurrent
//! executions, four retries after the first attempt, a one second initial
//! delay doubling on every retry.

/// Total attempts including the first one
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Delay before the first retry
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 1_000;

/// Backoff growth factor
pub const DEFAULT_MULTIPLIER: f64 = 2.0;

/// Maximum in-flight executions of a guarded operation
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 15;

/// Per-request timeout of the outbound API client
pub const DEFAULT_CLIENT_TIMEOUT_MS: u64 = 10_000;

/// Default upstream base URL for the API client
pub const DEFAULT_CLIENT_BASE_URL: &str = "http://localhost:8080/api";

/// Default log directive when `RUST_LOG` is unset
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Prefix for every environment variable read by the config loader
pub const ENV_PREFIX: &str = "BOOTNOTES_";

/// Total attempts of the fixed-delay request service
pub const PROGRAMMATIC_MAX_ATTEMPTS: u32 = 5;

/// Fixed delay between attempts of the fixed-delay request service
pub const PROGRAMMATIC_DELAY_MS: u64 = 200;
