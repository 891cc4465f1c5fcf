//! Errors raised by API clients and request services

use std::fmt;

use bootnotes_common::error::{ErrorClassification, ErrorSeverity};
use bootnotes_common::resilience::{HasErrorKind, RetryError};
use bootnotes_domain::BootNotesError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure category reported by an [`ApiClient`](super::ApiClient)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorKind {
    /// Upstream did not answer in time (504, 408 or a client-side timeout)
    GatewayTimeout,
    /// Upstream rejected the request as malformed
    BadRequest,
    /// Upstream has nothing for the key
    NotFound,
    /// Any other upstream or transport failure
    Upstream,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::GatewayTimeout => "gateway timeout",
            Self::BadRequest => "bad request",
            Self::NotFound => "not found",
            Self::Upstream => "upstream failure",
        };
        f.write_str(label)
    }
}

/// Error returned by a single API call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ApiClientError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl ApiClientError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    pub fn gateway_timeout(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::GatewayTimeout, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::BadRequest, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::NotFound, message)
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Upstream, message)
    }
}

impl HasErrorKind for ApiClientError {
    type Kind = ApiErrorKind;

    fn kind(&self) -> ApiErrorKind {
        self.kind
    }
}

impl ErrorClassification for ApiClientError {
    fn is_retryable(&self) -> bool {
        matches!(self.kind, ApiErrorKind::GatewayTimeout | ApiErrorKind::Upstream)
    }

    fn severity(&self) -> ErrorSeverity {
        match self.kind {
            ApiErrorKind::NotFound => ErrorSeverity::Info,
            ApiErrorKind::GatewayTimeout | ApiErrorKind::BadRequest => ErrorSeverity::Warning,
            ApiErrorKind::Upstream => ErrorSeverity::Error,
        }
    }
}

impl From<ApiClientError> for BootNotesError {
    fn from(err: ApiClientError) -> Self {
        match err.kind {
            ApiErrorKind::BadRequest | ApiErrorKind::NotFound => Self::InvalidInput(err.to_string()),
            ApiErrorKind::GatewayTimeout | ApiErrorKind::Upstream => Self::Network(err.to_string()),
        }
    }
}

/// Terminal failure of a guarded request
///
/// Failures of the client itself surface unchanged as [`RequestError::Client`];
/// the remaining variants mean the client was never called or the caller gave
/// up.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error(transparent)]
    Client(#[from] ApiClientError),

    #[error("Request not admitted: {0}")]
    Unavailable(String),

    #[error("Request cancelled after {attempts} attempt(s)")]
    Cancelled { attempts: u32 },
}

impl From<RetryError<ApiClientError>> for RequestError {
    fn from(err: RetryError<ApiClientError>) -> Self {
        match err {
            RetryError::NonRetryable { source, .. } | RetryError::Exhausted { source, .. } => {
                Self::Client(source)
            }
            RetryError::Cancelled { attempts } => Self::Cancelled { attempts },
            other @ (RetryError::AdmissionRejected { .. }
            | RetryError::AdmissionTimedOut { .. }) => Self::Unavailable(other.to_string()),
        }
    }
}

impl ErrorClassification for RequestError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Client(err) => err.is_retryable(),
            Self::Unavailable(_) => true,
            Self::Cancelled { .. } => false,
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Client(err) => err.severity(),
            Self::Unavailable(_) => ErrorSeverity::Warning,
            Self::Cancelled { .. } => ErrorSeverity::Info,
        }
    }
}

impl From<RequestError> for BootNotesError {
    fn from(err: RequestError) -> Self {
        match err {
            RequestError::Client(inner) => inner.into(),
            RequestError::Unavailable(message) => Self::Network(message),
            RequestError::Cancelled { .. } => Self::Internal(err.to_string()),
        }
    }
}
