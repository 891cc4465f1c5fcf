//! Conversions from HTTP transport failures into API client errors.
//!
//! | Failure | Kind |
//! |---------|------|
//! | timeout, 504, 408 | `GatewayTimeout` |
//! | 404 | `NotFound` |
//! | other 4xx | `BadRequest` |
//! | connect failure, other 5xx, anything else | `Upstream` |

use bootnotes_core::{ApiClientError, ApiErrorKind};
use reqwest::{Error as HttpError, StatusCode};

/// Classify a non-success HTTP status
pub fn kind_for_status(status: StatusCode) -> ApiErrorKind {
    match status.as_u16() {
        408 | 504 => ApiErrorKind::GatewayTimeout,
        404 => ApiErrorKind::NotFound,
        400..=499 => ApiErrorKind::BadRequest,
        _ => ApiErrorKind::Upstream,
    }
}

/// Build the client error for a non-success response
pub fn error_for_status(status: StatusCode, body: &str) -> ApiClientError {
    let mut message =
        format!("HTTP {} {}", status.as_u16(), status.canonical_reason().unwrap_or("unknown status"));
    let body = body.trim();
    if !body.is_empty() {
        message.push_str(": ");
        message.push_str(body);
    }
    ApiClientError::new(kind_for_status(status), message)
}

/// Map a reqwest transport error
pub fn error_for_transport(err: &HttpError) -> ApiClientError {
    if err.is_timeout() {
        return ApiClientError::gateway_timeout("HTTP request timed out");
    }

    #[cfg(not(target_arch = "wasm32"))]
    if err.is_connect() {
        return ApiClientError::upstream("HTTP connection failure");
    }

    if let Some(status) = err.status() {
        return error_for_status(status, "");
    }

    ApiClientError::upstream(format!("HTTP request failed: {err}"))
}
