//! Per-attempt records and the outcome of a full retry sequence

use std::time::Duration;

use super::error::RetryResult;

/// Result of a single attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Succeeded,
    Failed {
        /// Rendered error message
        error: String,
        /// Whether the policy classified the error as retryable
        retryable: bool,
    },
}

/// Transient record of one invocation of the guarded operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptRecord {
    /// 0-based attempt index
    pub index: u32,
    /// Backoff waited before this attempt started (zero for the first)
    pub delay_before: Duration,
    pub outcome: AttemptOutcome,
}

impl AttemptRecord {
    pub(crate) fn succeeded(index: u32, delay_before: Duration) -> Self {
        Self { index, delay_before, outcome: AttemptOutcome::Succeeded }
    }

    pub(crate) fn failed(
        index: u32,
        delay_before: Duration,
        error: String,
        retryable: bool,
    ) -> Self {
        Self { index, delay_before, outcome: AttemptOutcome::Failed { error, retryable } }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == AttemptOutcome::Succeeded
    }
}

/// Outcome of a retry execution including result and per-attempt records
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    pub result: RetryResult<T, E>,
    pub records: Vec<AttemptRecord>,
    /// Sum of backoff delays actually waited
    pub total_delay: Duration,
    /// Wall time from the call until the terminal state, admission included
    pub elapsed: Duration,
}

impl<T, E> RetryOutcome<T, E> {
    /// Consume the outcome and return only the result.
    pub fn into_result(self) -> RetryResult<T, E> {
        self.result
    }

    /// Number of times the operation was invoked
    pub fn attempt_count(&self) -> u32 {
        u32::try_from(self.records.len()).unwrap_or(u32::MAX)
    }

    /// Backoff delays in the order they were waited
    pub fn delays(&self) -> Vec<Duration> {
        self.records.iter().skip(1).map(|record| record.delay_before).collect()
    }
}
