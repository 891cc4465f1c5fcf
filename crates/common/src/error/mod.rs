//! Common error types and classification
//!
//! Two pieces live here:
//!
//! 1. **`CommonError`**: errors raised by the shared building blocks
//!    themselves (currently invalid configuration).
//! 2. **`ErrorClassification`**: a standard interface for describing an
//!    error by its characteristics (retryability, severity, criticality).
//!
//! Module-specific errors compose with `CommonError` instead of duplicating
//! its variants:
//!
//! ```rust,ignore
//! #[derive(Debug, Error)]
//! pub enum ClientError {
//!     #[error("upstream returned {0}")]
//!     Status(u16),
//!
//!     #[error(transparent)]
//!     Common(#[from] CommonError),
//! }
//! ```
//!
//! ## ErrorSeverity Levels
//!
//! | Level | Use Case |
//! |-------|----------|
//! | **Info** | Expected conditions (cancellation, not found) |
//! | **Warning** | Degraded but operational (timeouts, saturation) |
//! | **Error** | Failure requiring attention (bad config, backend errors) |
//! | **Critical** | Invariant violations |

use std::fmt;

use thiserror::Error;

/// Standard result type using CommonError
pub type CommonResult<T> = Result<T, CommonError>;

/// Errors raised by the shared building blocks
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommonError {
    /// Invalid or missing configuration
    #[error("Configuration error in field '{field}': {message}")]
    Config { field: String, message: String },
}

impl CommonError {
    /// Create a configuration error for a specific field
    pub fn config<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self::Config { field: field.into(), message: message.into() }
    }
}

/// Standard interface for classifying errors
///
/// Retry policies use [`is_retryable`](Self::is_retryable) to decide whether
/// a failure is transient; logging uses [`severity`](Self::severity) to pick
/// an event level.
pub trait ErrorClassification {
    /// Check if this error is retryable
    ///
    /// Retryable errors are transient issues that may succeed if attempted
    /// again, such as gateway timeouts or a saturated concurrency limit.
    fn is_retryable(&self) -> bool;

    /// Get the error severity level
    fn severity(&self) -> ErrorSeverity;

    /// Check if this is a critical error requiring immediate attention
    fn is_critical(&self) -> bool {
        self.severity() == ErrorSeverity::Critical
    }
}

/// Error severity levels for monitoring and alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    /// Informational, typically for debugging
    Info,
    /// Warning, should be monitored but not critical
    Warning,
    /// Error, requires attention
    Error,
    /// Critical, requires immediate attention
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_error_display() {
        let err = CommonError::config("max_attempts", "must be at least 1");
        assert_eq!(err.to_string(), "Configuration error in field 'max_attempts': must be at least 1");
    }

    #[test]
    fn test_severity_ordering_and_display() {
        assert!(ErrorSeverity::Info < ErrorSeverity::Warning);
        assert!(ErrorSeverity::Error < ErrorSeverity::Critical);
        assert_eq!(ErrorSeverity::Warning.to_string(), "WARNING");
    }
}
