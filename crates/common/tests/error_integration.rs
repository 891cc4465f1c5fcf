//! Integration tests for `bootnotes_common::error`.
//!
//! These suites validate classification and module error delegation so that
//! retry policies and status mapping see consistent failure semantics.

use bootnotes_common::error::{CommonError, CommonResult, ErrorClassification, ErrorSeverity};
use thiserror::Error;

#[derive(Debug, Error)]
enum ClientError {
    #[error("upstream returned status {0}")]
    Status(u16),

    #[error(transparent)]
    Common(#[from] CommonError),
}

impl ErrorClassification for ClientError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Status(504))
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Status(code) if *code >= 500 => ErrorSeverity::Error,
            Self::Status(_) => ErrorSeverity::Warning,
            Self::Common(_) => ErrorSeverity::Critical,
        }
    }
}

fn connect(limit: usize) -> Result<&'static str, ClientError> {
    let checked: CommonResult<()> = if limit == 0 {
        Err(CommonError::config("concurrency_limit", "must be at least 1"))
    } else {
        Ok(())
    };
    checked?;
    Ok("Body for key: abc")
}

/// Validates that module errors wrapping `CommonError` through `#[from]`
/// keep its display text and carry their own classification.
#[test]
fn module_errors_wrap_common_error() {
    assert_eq!(connect(15).unwrap(), "Body for key: abc");

    let err = connect(0).unwrap_err();
    assert!(matches!(err, ClientError::Common(CommonError::Config { .. })));
    assert!(!err.is_retryable());
    assert!(err.is_critical());
    assert_eq!(
        err.to_string(),
        "Configuration error in field 'concurrency_limit': must be at least 1"
    );
}

/// Validates the default `is_critical` derived from severity.
#[test]
fn module_error_classification_defaults() {
    assert!(ClientError::Status(504).is_retryable());
    assert!(!ClientError::Status(400).is_retryable());
    assert_eq!(ClientError::Status(400).severity(), ErrorSeverity::Warning);
    assert_eq!(ClientError::Status(502).severity(), ErrorSeverity::Error);
    assert!(!ClientError::Status(502).is_critical());
}

/// Validates severity ordering so callers can filter on a minimum level.
#[test]
fn severity_levels_are_ordered_for_filtering() {
    let mut levels = vec![
        ErrorSeverity::Critical,
        ErrorSeverity::Info,
        ErrorSeverity::Error,
        ErrorSeverity::Warning,
    ];
    levels.sort();
    assert_eq!(
        levels,
        vec![ErrorSeverity::Info, ErrorSeverity::Warning, ErrorSeverity::Error, ErrorSeverity::Critical]
    );

    let rendered: Vec<String> = levels.iter().map(ToString::to_string).collect();
    assert_eq!(rendered, vec!["INFO", "WARNING", "ERROR", "CRITICAL"]);
}

/// Validates that configuration errors name the offending field.
#[test]
fn config_errors_name_the_field() {
    let err = CommonError::config("multiplier", "must be a finite number >= 1.0, got 0.5");
    match &err {
        CommonError::Config { field, message } => {
            assert_eq!(field, "multiplier");
            assert!(message.contains("0.5"));
        }
    }
    assert_eq!(err.clone(), err);
}
