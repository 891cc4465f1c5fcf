//! Mapping of request failures to transport status codes
//!
//! | Failure | HTTP | gRPC |
//! |---------|------|------|
//! | gateway timeout | 504 | `DEADLINE_EXCEEDED` |
//! | bad request | 400 | `INVALID_ARGUMENT` |
//! | not found | 404 | `NOT_FOUND` |
//! | other upstream failure | 502 | `UNAVAILABLE` |
//! | not admitted (limit reached or timed out) | 503 | `RESOURCE_EXHAUSTED` |
//! | cancelled by the caller | 499 | `CANCELLED` |

use std::fmt;

use bootnotes_common::resilience::RetryError;
use serde::Serialize;

use super::error::{ApiClientError, ApiErrorKind, RequestError};

/// gRPC status code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GrpcCode {
    Ok,
    Cancelled,
    InvalidArgument,
    DeadlineExceeded,
    NotFound,
    ResourceExhausted,
    Unavailable,
}

impl GrpcCode {
    /// Numeric code on the wire
    pub fn code(self) -> i32 {
        match self {
            Self::Ok => 0,
            Self::Cancelled => 1,
            Self::InvalidArgument => 3,
            Self::DeadlineExceeded => 4,
            Self::NotFound => 5,
            Self::ResourceExhausted => 8,
            Self::Unavailable => 14,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Cancelled => "CANCELLED",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::DeadlineExceeded => "DEADLINE_EXCEEDED",
            Self::NotFound => "NOT_FOUND",
            Self::ResourceExhausted => "RESOURCE_EXHAUSTED",
            Self::Unavailable => "UNAVAILABLE",
        }
    }
}

impl fmt::Display for GrpcCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status reported to callers of a request service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TransportStatus {
    pub http: u16,
    pub grpc: GrpcCode,
}

impl TransportStatus {
    pub const OK: Self = Self { http: 200, grpc: GrpcCode::Ok };
    pub const BAD_REQUEST: Self = Self { http: 400, grpc: GrpcCode::InvalidArgument };
    pub const NOT_FOUND: Self = Self { http: 404, grpc: GrpcCode::NotFound };
    /// Non-standard 499 "client closed request"
    pub const CLIENT_CLOSED_REQUEST: Self = Self { http: 499, grpc: GrpcCode::Cancelled };
    pub const BAD_GATEWAY: Self = Self { http: 502, grpc: GrpcCode::Unavailable };
    pub const SERVICE_UNAVAILABLE: Self = Self { http: 503, grpc: GrpcCode::ResourceExhausted };
    pub const GATEWAY_TIMEOUT: Self = Self { http: 504, grpc: GrpcCode::DeadlineExceeded };

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.http)
    }
}

impl fmt::Display for TransportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.http, self.grpc)
    }
}

impl From<ApiErrorKind> for TransportStatus {
    fn from(kind: ApiErrorKind) -> Self {
        match kind {
            ApiErrorKind::GatewayTimeout => Self::GATEWAY_TIMEOUT,
            ApiErrorKind::BadRequest => Self::BAD_REQUEST,
            ApiErrorKind::NotFound => Self::NOT_FOUND,
            ApiErrorKind::Upstream => Self::BAD_GATEWAY,
        }
    }
}

impl From<&ApiClientError> for TransportStatus {
    fn from(err: &ApiClientError) -> Self {
        err.kind.into()
    }
}

impl From<&RequestError> for TransportStatus {
    fn from(err: &RequestError) -> Self {
        match err {
            RequestError::Client(inner) => inner.into(),
            RequestError::Unavailable(_) => Self::SERVICE_UNAVAILABLE,
            RequestError::Cancelled { .. } => Self::CLIENT_CLOSED_REQUEST,
        }
    }
}

impl From<&RetryError<ApiClientError>> for TransportStatus {
    fn from(err: &RetryError<ApiClientError>) -> Self {
        match err {
            RetryError::NonRetryable { source, .. } | RetryError::Exhausted { source, .. } => {
                source.into()
            }
            RetryError::AdmissionRejected { .. } | RetryError::AdmissionTimedOut { .. } => {
                Self::SERVICE_UNAVAILABLE
            }
            RetryError::Cancelled { .. } => Self::CLIENT_CLOSED_REQUEST,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_client_error_mapping() {
        let cases = [
            (ApiClientError::gateway_timeout("t"), 504, GrpcCode::DeadlineExceeded),
            (ApiClientError::bad_request("b"), 400, GrpcCode::InvalidArgument),
            (ApiClientError::not_found("n"), 404, GrpcCode::NotFound),
            (ApiClientError::upstream("u"), 502, GrpcCode::Unavailable),
        ];
        for (err, http, grpc) in cases {
            let status = TransportStatus::from(&err);
            assert_eq!(status.http, http);
            assert_eq!(status.grpc, grpc);
            assert!(!status.is_success());
        }
    }

    #[test]
    fn test_retry_error_mapping() {
        let exhausted =
            RetryError::Exhausted { source: ApiClientError::gateway_timeout("t"), attempts: 5 };
        assert_eq!(TransportStatus::from(&exhausted), TransportStatus::GATEWAY_TIMEOUT);

        let timed_out =
            RetryError::<ApiClientError>::AdmissionTimedOut { timeout: Duration::from_secs(1) };
        assert_eq!(TransportStatus::from(&timed_out), TransportStatus::SERVICE_UNAVAILABLE);

        let cancelled = RetryError::<ApiClientError>::Cancelled { attempts: 1 };
        assert_eq!(TransportStatus::from(&cancelled).grpc, GrpcCode::Cancelled);
    }

    #[test]
    fn test_request_error_mapping() {
        let err = RequestError::Unavailable("limit".into());
        assert_eq!(TransportStatus::from(&err).grpc, GrpcCode::ResourceExhausted);
        assert_eq!(TransportStatus::from(&RequestError::Cancelled { attempts: 0 }).http, 499);
    }

    #[test]
    fn test_display_and_codes() {
        assert_eq!(TransportStatus::GATEWAY_TIMEOUT.to_string(), "504 DEADLINE_EXCEEDED");
        assert_eq!(GrpcCode::ResourceExhausted.code(), 8);
        assert!(TransportStatus::OK.is_success());
        assert_eq!(
            serde_json::to_string(&TransportStatus::BAD_REQUEST).unwrap(),
            r#"{"http":400,"grpc":"INVALID_ARGUMENT"}"#
        );
    }
}
