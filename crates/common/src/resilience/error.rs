//! Terminal failures of a guarded execution

use std::time::Duration;

use thiserror::Error;

use super::limiter::AdmissionError;
use crate::error::{ErrorClassification, ErrorSeverity};

/// Errors surfaced by [`RetryExecutor`](super::RetryExecutor)
///
/// Every variant is terminal; a retryable failure with attempts remaining is
/// handled inside the executor and never surfaces.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// The operation failed with an error outside the retryable set
    #[error("Operation failed with non-retryable error after {attempts} attempt(s): {source}")]
    NonRetryable { source: E, attempts: u32 },

    /// Every permitted attempt failed with a retryable error
    #[error("All retry attempts exhausted after {attempts} tries: {source}")]
    Exhausted { source: E, attempts: u32 },

    /// The concurrency limit was saturated under the reject strategy
    #[error("Admission rejected: concurrency limit of {limit} reached")]
    AdmissionRejected { limit: usize },

    /// No slot freed within the configured admission timeout
    #[error("Admission timed out after {timeout:?}")]
    AdmissionTimedOut { timeout: Duration },

    /// The caller cancelled while waiting for admission or during backoff
    #[error("Cancelled after {attempts} attempt(s)")]
    Cancelled { attempts: u32 },
}

/// Result type for guarded executions
pub type RetryResult<T, E> = Result<T, RetryError<E>>;

impl<E> RetryError<E> {
    /// Number of times the operation was invoked
    pub fn attempts(&self) -> u32 {
        match self {
            Self::NonRetryable { attempts, .. }
            | Self::Exhausted { attempts, .. }
            | Self::Cancelled { attempts } => *attempts,
            Self::AdmissionRejected { .. } | Self::AdmissionTimedOut { .. } => 0,
        }
    }

    /// The last error returned by the operation, if it ran at all
    pub fn source_error(&self) -> Option<&E> {
        match self {
            Self::NonRetryable { source, .. } | Self::Exhausted { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Unwrap the last operation error, if any
    pub fn into_source(self) -> Option<E> {
        match self {
            Self::NonRetryable { source, .. } | Self::Exhausted { source, .. } => Some(source),
            _ => None,
        }
    }

    /// True when the operation was never admitted
    pub fn is_admission_failure(&self) -> bool {
        matches!(self, Self::AdmissionRejected { .. } | Self::AdmissionTimedOut { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

impl<E> From<AdmissionError> for RetryError<E> {
    fn from(error: AdmissionError) -> Self {
        match error {
            AdmissionError::Rejected { limit } => Self::AdmissionRejected { limit },
            AdmissionError::TimedOut { timeout } => Self::AdmissionTimedOut { timeout },
        }
    }
}

impl<E: ErrorClassification> ErrorClassification for RetryError<E> {
    fn is_retryable(&self) -> bool {
        match self {
            // Already exhausted or permanently failed
            Self::NonRetryable { .. } | Self::Exhausted { .. } | Self::Cancelled { .. } => false,
            // Capacity may free up
            Self::AdmissionRejected { .. } | Self::AdmissionTimedOut { .. } => true,
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NonRetryable { source, .. } | Self::Exhausted { source, .. } => {
                source.severity()
            }
            Self::AdmissionRejected { .. } | Self::AdmissionTimedOut { .. } => {
                ErrorSeverity::Warning
            }
            Self::Cancelled { .. } => ErrorSeverity::Info,
        }
    }

    fn is_critical(&self) -> bool {
        self.source_error().is_some_and(ErrorClassification::is_critical)
    }
}
