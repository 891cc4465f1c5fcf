//! Request service with a fixed-delay retry policy and no concurrency bound
//!
//! Up to 5 attempts, 200ms apart. Failures surface as the wrapping
//! [`RetryError`], so callers can tell exhaustion from a non-retryable
//! failure and reach the last client error through it.

use std::sync::Arc;
use std::time::Duration;

use bootnotes_common::error::CommonResult;
use bootnotes_common::resilience::{ConcurrencyLimiter, RetryError, RetryExecutor, RetryPolicy};
use bootnotes_domain::constants::{PROGRAMMATIC_DELAY_MS, PROGRAMMATIC_MAX_ATTEMPTS};
use bootnotes_domain::ApiResponse;
use tracing::{info, instrument, warn};

use super::error::{ApiClientError, ApiErrorKind};
use super::ports::ApiClient;
use super::status::TransportStatus;

/// Processes requests with a policy assembled in code
pub struct ProgrammaticRequestService {
    client: Arc<dyn ApiClient>,
    executor: RetryExecutor<ApiClientError>,
}

impl ProgrammaticRequestService {
    pub fn new(client: Arc<dyn ApiClient>) -> CommonResult<Self> {
        let policy = RetryPolicy::builder()
            .max_attempts(PROGRAMMATIC_MAX_ATTEMPTS)
            .initial_delay(Duration::from_millis(PROGRAMMATIC_DELAY_MS))
            .multiplier(1.0)
            .retry_on_kind(ApiErrorKind::GatewayTimeout)
            .build()?;
        let executor = RetryExecutor::new(policy, ConcurrencyLimiter::unbounded())
            .named("programmatic_request");
        Ok(Self { client, executor })
    }

    pub fn executor(&self) -> &RetryExecutor<ApiClientError> {
        &self.executor
    }

    /// Fetch the response for `key`, retrying gateway timeouts
    #[instrument(skip_all, fields(key = key.unwrap_or("null")))]
    pub async fn process_request(
        &self,
        key: Option<&str>,
    ) -> Result<ApiResponse, RetryError<ApiClientError>> {
        match self.executor.execute(|key| self.client.get_response(key), key).await {
            Ok(response) => {
                info!("Request processed");
                Ok(response)
            }
            Err(error) => {
                warn!(attempts = error.attempts(), %error, "Request failed");
                Err(error)
            }
        }
    }

    /// Fetch the response for `key`, reporting failures as a transport status
    pub async fn process_request_status(
        &self,
        key: Option<&str>,
    ) -> Result<ApiResponse, TransportStatus> {
        self.process_request(key).await.map_err(|error| TransportStatus::from(&error))
    }
}
