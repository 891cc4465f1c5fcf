// Defaults for retry policies built without explicit settings
use std::time::Duration;

/// Default total number of attempts (initial attempt plus two retries)
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default delay before the first retry
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(1);

/// Default backoff growth factor (fixed delay)
pub const DEFAULT_MULTIPLIER: f64 = 1.0;

/// Minimum allowed max_attempts value
pub const MIN_MAX_ATTEMPTS: u32 = 1;

/// Minimum allowed backoff multiplier
pub const MIN_MULTIPLIER: f64 = 1.0;
