//! Backoff schedule between retry attempts
//!
//! The delay after the attempt with 0-based index `n` fails is
//! `initial_delay * multiplier^n`, capped at `max_delay`, with optional
//! jitter applied last. The first retry therefore waits exactly
//! `initial_delay` when jitter is disabled.

use std::time::Duration;

use rand::Rng;

use super::constants::{DEFAULT_INITIAL_DELAY, DEFAULT_MULTIPLIER};

/// Jitter type for adding randomness to retry delays
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Jitter {
    /// No jitter
    #[default]
    None,
    /// Full jitter: 0 to calculated_delay
    Full,
    /// Equal jitter: calculated_delay/2 to calculated_delay
    Equal,
}

impl Jitter {
    /// Apply jitter to the calculated delay
    pub fn apply(self, delay: Duration) -> Duration {
        match self {
            Jitter::None => delay,
            Jitter::Full => Duration::from_nanos(random_up_to(duration_nanos(delay))),
            Jitter::Equal => {
                let half = duration_nanos(delay) / 2;
                Duration::from_nanos(half.saturating_add(random_up_to(half)))
            }
        }
    }
}

fn duration_nanos(delay: Duration) -> u64 {
    u64::try_from(delay.as_nanos()).unwrap_or(u64::MAX)
}

fn random_up_to(max: u64) -> u64 {
    if max == 0 {
        return 0;
    }
    rand::thread_rng().gen_range(0..=max)
}

/// Exponential backoff schedule
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Growth factor applied per retry (>= 1.0)
    pub multiplier: f64,
    /// Upper bound on any single delay, before jitter
    pub max_delay: Option<Duration>,
    pub jitter: Jitter,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            initial_delay: DEFAULT_INITIAL_DELAY,
            multiplier: DEFAULT_MULTIPLIER,
            max_delay: None,
            jitter: Jitter::None,
        }
    }
}

impl Backoff {
    /// Constant delay between attempts
    pub fn fixed(delay: Duration) -> Self {
        Self { initial_delay: delay, multiplier: 1.0, ..Self::default() }
    }

    /// Delay growing by `multiplier` after every failed attempt
    pub fn exponential(initial_delay: Duration, multiplier: f64) -> Self {
        Self { initial_delay, multiplier, ..Self::default() }
    }

    /// Delay after the attempt with 0-based index `attempt` failed, without
    /// jitter.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let cap = self.max_delay.unwrap_or(Duration::MAX);
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let nanos = (self.initial_delay.as_nanos() as f64 * self.multiplier.powi(exponent)).round();

        if !nanos.is_finite() || nanos >= u64::MAX as f64 {
            return cap;
        }
        Duration::from_nanos(nanos as u64).min(cap)
    }

    /// Delay after the attempt with 0-based index `attempt` failed, with
    /// jitter applied.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.jitter.apply(self.base_delay(attempt))
    }

    /// Sum of the un-jittered delays spent before `attempts` total attempts
    /// have been made. This is the minimum time a fully exhausted sequence
    /// spends waiting.
    pub fn total_base_delay(&self, attempts: u32) -> Duration {
        (0..attempts.saturating_sub(1))
            .map(|attempt| self.base_delay(attempt))
            .fold(Duration::ZERO, Duration::saturating_add)
    }
}
