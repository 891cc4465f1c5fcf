//! Request service guarded by a concurrency limit and exponential backoff
//!
//! Defaults: at most 15 requests in flight, up to 5 attempts per request,
//! 1s initial delay doubling on every retry. Only gateway timeouts are
//! retried; every other client error ends the request immediately and is
//! returned unchanged.

use std::sync::Arc;
use std::time::Duration;

use bootnotes_common::error::CommonResult;
use bootnotes_common::resilience::{ConcurrencyLimiter, RetryExecutor, RetryOutcome, RetryPolicy};
use bootnotes_domain::constants::{
    DEFAULT_CONCURRENCY_LIMIT, DEFAULT_INITIAL_DELAY_MS, DEFAULT_MAX_ATTEMPTS, DEFAULT_MULTIPLIER,
};
use bootnotes_domain::ApiResponse;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use super::error::{ApiClientError, ApiErrorKind, RequestError};
use super::ports::ApiClient;
use super::status::TransportStatus;

/// Processes requests through an [`ApiClient`] under a shared limiter
pub struct GuardedRequestService {
    client: Arc<dyn ApiClient>,
    executor: RetryExecutor<ApiClientError>,
}

impl GuardedRequestService {
    /// Create the service with the default limit and policy
    pub fn new(client: Arc<dyn ApiClient>) -> CommonResult<Self> {
        let limiter = ConcurrencyLimiter::new(DEFAULT_CONCURRENCY_LIMIT)?;
        let executor =
            RetryExecutor::new(Self::default_policy()?, limiter).named("guarded_request");
        Ok(Self::with_executor(client, executor))
    }

    /// Create the service around an executor built elsewhere (e.g. from config)
    pub fn with_executor(
        client: Arc<dyn ApiClient>,
        executor: RetryExecutor<ApiClientError>,
    ) -> Self {
        Self { client, executor }
    }

    /// 5 attempts, 1s initial delay, x2, retrying gateway timeouts only
    pub fn default_policy() -> CommonResult<RetryPolicy<ApiClientError>> {
        RetryPolicy::builder()
            .max_attempts(DEFAULT_MAX_ATTEMPTS)
            .initial_delay(Duration::from_millis(DEFAULT_INITIAL_DELAY_MS))
            .multiplier(DEFAULT_MULTIPLIER)
            .retry_on_kind(ApiErrorKind::GatewayTimeout)
            .build()
    }

    pub fn executor(&self) -> &RetryExecutor<ApiClientError> {
        &self.executor
    }

    /// Fetch the response for `key`, retrying gateway timeouts
    ///
    /// On failure the client error of the last attempt is returned as is.
    #[instrument(skip_all, fields(key = key.unwrap_or("null")))]
    pub async fn process_request(&self, key: Option<&str>) -> Result<ApiResponse, RequestError> {
        let outcome =
            self.executor.execute_with_outcome(|key| self.client.get_response(key), key).await;
        log_outcome(outcome)
    }

    /// Like [`process_request`](Self::process_request), giving up when
    /// `token` is cancelled while waiting for a slot or between attempts
    #[instrument(skip_all, fields(key = key.unwrap_or("null")))]
    pub async fn process_request_with_cancellation(
        &self,
        key: Option<&str>,
        token: &CancellationToken,
    ) -> Result<ApiResponse, RequestError> {
        self.executor
            .execute_with_cancellation(|key| self.client.get_response(key), key, token)
            .await
            .map_err(|error| {
                warn!(%error, "Request abandoned");
                RequestError::from(error)
            })
    }

    /// Fetch the response for `key`, reporting failures as a transport status
    pub async fn process_request_status(
        &self,
        key: Option<&str>,
    ) -> Result<ApiResponse, TransportStatus> {
        self.process_request(key).await.map_err(|error| TransportStatus::from(&error))
    }
}

fn log_outcome(
    outcome: RetryOutcome<ApiResponse, ApiClientError>,
) -> Result<ApiResponse, RequestError> {
    let attempts = outcome.attempt_count();
    let total_delay = outcome.total_delay;
    match outcome.into_result() {
        Ok(response) => {
            info!(attempts, ?total_delay, "Request processed");
            Ok(response)
        }
        Err(error) => {
            let status = TransportStatus::from(&error);
            warn!(attempts, ?total_delay, %status, %error, "Request failed");
            Err(RequestError::from(error))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;

    use super::*;

    /// Fails with a gateway timeout `failures` times, then echoes the key
    struct FlakyClient {
        failures: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl ApiClient for FlakyClient {
        async fn get_response(&self, key: Option<&str>) -> Result<ApiResponse, ApiClientError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                return Err(ApiClientError::gateway_timeout(format!("attempt {n}")));
            }
            Ok(ApiResponse::new(format!("Body for key: {}", key.unwrap_or("null"))))
        }
    }

    #[test]
    fn test_default_policy() {
        let policy = GuardedRequestService::default_policy().unwrap();
        assert_eq!(policy.max_attempts(), 5);
        assert_eq!(policy.backoff().base_delay(0), Duration::from_secs(1));
        assert_eq!(policy.backoff().base_delay(1), Duration::from_secs(2));
        assert!(policy.is_retryable(&ApiClientError::gateway_timeout("t")));
        assert!(!policy.is_retryable(&ApiClientError::upstream("u")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_gateway_timeouts() {
        let client = Arc::new(FlakyClient { failures: 2, calls: AtomicU32::new(0) });
        let service = GuardedRequestService::new(client.clone()).unwrap();

        let response = service.process_request(Some("abc")).await.unwrap();

        assert_eq!(response.body, "Body for key: abc");
        assert_eq!(client.calls.load(Ordering::SeqCst), 3);
        assert_eq!(service.executor().limiter().limit(), 15);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_returns_last_client_error() {
        let client = Arc::new(FlakyClient { failures: u32::MAX, calls: AtomicU32::new(0) });
        let service = GuardedRequestService::new(client.clone()).unwrap();

        let err = service.process_request(None).await.unwrap_err();

        assert_eq!(err, RequestError::Client(ApiClientError::gateway_timeout("attempt 4")));
        assert_eq!(client.calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_for_exhaustion() {
        let client = Arc::new(FlakyClient { failures: u32::MAX, calls: AtomicU32::new(0) });
        let service = GuardedRequestService::new(client).unwrap();

        let status = service.process_request_status(Some("k")).await.unwrap_err();
        assert_eq!(status, TransportStatus::GATEWAY_TIMEOUT);
    }
}
