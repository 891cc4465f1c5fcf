//! Builds executors and request services from configuration
//!
//! Validation lives in [`RetryPolicyBuilder::build`] and
//! [`ConcurrencyLimiter::new`]; their errors surface here as
//! `BootNotesError::Config`.
//!
//! [`RetryPolicyBuilder::build`]: bootnotes_common::resilience::RetryPolicyBuilder::build

use std::sync::Arc;
use std::time::Duration;

use bootnotes_common::error::CommonError;
use bootnotes_common::resilience::{
    AdmissionStrategy, ConcurrencyLimiter, Jitter, RetryExecutor, RetryPolicy,
};
use bootnotes_core::{ApiClient, ApiClientError, ApiErrorKind, GuardedRequestService};
use bootnotes_domain::{
    AdmissionMode, BootNotesError, ClientBackend, ClientConfig, JitterMode, ResilienceConfig,
    Result,
};
use tracing::info;

use crate::echo::EchoApiClient;
use crate::http::HttpApiClient;

fn config_error(err: CommonError) -> BootNotesError {
    BootNotesError::Config(err.to_string())
}

pub fn jitter_for(mode: JitterMode) -> Jitter {
    match mode {
        JitterMode::None => Jitter::None,
        JitterMode::Full => Jitter::Full,
        JitterMode::Equal => Jitter::Equal,
    }
}

/// Admission strategy for a config section
///
/// `acquire_timeout_ms` only applies in `wait` mode.
pub fn admission_for(config: &ResilienceConfig) -> AdmissionStrategy {
    match (config.admission, config.acquire_timeout_ms) {
        (AdmissionMode::Reject, _) => AdmissionStrategy::Reject,
        (AdmissionMode::Wait, Some(ms)) => {
            AdmissionStrategy::WaitTimeout(Duration::from_millis(ms))
        }
        (AdmissionMode::Wait, None) => AdmissionStrategy::Wait,
    }
}

/// Retry policy for API calls: only gateway timeouts are retried
///
/// # Errors
/// Returns `BootNotesError::Config` if the attempt count, delays or
/// multiplier are out of range.
pub fn build_policy(config: &ResilienceConfig) -> Result<RetryPolicy<ApiClientError>> {
    let mut builder = RetryPolicy::builder()
        .max_attempts(config.max_attempts)
        .initial_delay(Duration::from_millis(config.initial_delay_ms))
        .multiplier(config.multiplier)
        .jitter(jitter_for(config.jitter))
        .retry_on_kind(ApiErrorKind::GatewayTimeout);
    if let Some(ms) = config.max_delay_ms {
        builder = builder.max_delay(Duration::from_millis(ms));
    }
    builder.build().map_err(config_error)
}

/// Executor with its own limiter sized by `concurrency_limit`
///
/// # Errors
/// Returns `BootNotesError::Config` for an invalid policy or a zero limit.
pub fn build_executor(
    config: &ResilienceConfig,
    name: &'static str,
) -> Result<RetryExecutor<ApiClientError>> {
    let policy = build_policy(config)?;
    let limiter = ConcurrencyLimiter::new(config.concurrency_limit).map_err(config_error)?;
    let admission = admission_for(config);

    info!(
        operation = name,
        max_attempts = config.max_attempts,
        initial_delay_ms = config.initial_delay_ms,
        multiplier = config.multiplier,
        concurrency_limit = config.concurrency_limit,
        ?admission,
        "Configured retry executor"
    );

    Ok(RetryExecutor::new(policy, limiter).with_admission(admission).named(name))
}

/// `ApiClient` selected by `backend`
///
/// # Errors
/// Returns `BootNotesError::Config` if the HTTP client cannot be built.
pub fn build_client(config: &ClientConfig) -> Result<Arc<dyn ApiClient>> {
    let client: Arc<dyn ApiClient> = match config.backend {
        ClientBackend::Echo => Arc::new(EchoApiClient::new()),
        ClientBackend::Http => Arc::new(HttpApiClient::new(config)?),
    };
    info!(backend = %config.backend, base_url = %config.base_url, "Configured API client");
    Ok(client)
}

/// Guarded request service over `client`, configured from `config`
///
/// # Errors
/// See [`build_executor`].
pub fn build_guarded_service(
    config: &ResilienceConfig,
    client: Arc<dyn ApiClient>,
) -> Result<GuardedRequestService> {
    let executor = build_executor(config, "guarded_request")?;
    Ok(GuardedRequestService::with_executor(client, executor))
}
