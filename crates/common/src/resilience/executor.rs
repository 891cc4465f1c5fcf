//! Retry executor running an operation under a policy and a limiter
//!
//! One admission permit is acquired before the first attempt and held until
//! the sequence reaches a terminal state. The permit is an RAII guard, so the
//! slot is also released when the caller drops the returned future.
//!
//! Events stay at `debug` level inside the execution span. Reporting the
//! terminal outcome is left to the caller.

use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use super::attempt::{AttemptRecord, RetryOutcome};
use super::error::{RetryError, RetryResult};
use super::limiter::{AdmissionPermit, AdmissionStrategy, ConcurrencyLimiter};
use super::policy::{RetryDecision, RetryPolicy};

/// Executes operations with retry logic inside a shared concurrency limit
///
/// Cloning is cheap; clones share the policy and the limiter.
pub struct RetryExecutor<E> {
    policy: Arc<RetryPolicy<E>>,
    limiter: ConcurrencyLimiter,
    admission: AdmissionStrategy,
    name: Cow<'static, str>,
}

impl<E> RetryExecutor<E> {
    pub fn new(policy: RetryPolicy<E>, limiter: ConcurrencyLimiter) -> Self {
        Self::from_shared(Arc::new(policy), limiter)
    }

    /// Create an executor around a policy that is already shared
    pub fn from_shared(policy: Arc<RetryPolicy<E>>, limiter: ConcurrencyLimiter) -> Self {
        Self {
            policy,
            limiter,
            admission: AdmissionStrategy::default(),
            name: Cow::Borrowed("operation"),
        }
    }

    pub fn with_admission(mut self, admission: AdmissionStrategy) -> Self {
        self.admission = admission;
        self
    }

    /// Name recorded on the tracing span of every execution
    pub fn named<N: Into<Cow<'static, str>>>(mut self, name: N) -> Self {
        self.name = name.into();
        self
    }

    pub fn policy(&self) -> &RetryPolicy<E> {
        &self.policy
    }

    pub fn limiter(&self) -> &ConcurrencyLimiter {
        &self.limiter
    }

    pub fn admission(&self) -> AdmissionStrategy {
        self.admission
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wrap `function` so every call runs under this executor
    pub fn guard<F>(&self, function: F) -> Guarded<F, E> {
        Guarded { executor: self.clone(), function }
    }
}

impl<E: fmt::Display> RetryExecutor<E> {
    /// Execute `operation`, passing `key` to every attempt
    pub async fn execute<F, Fut, K, T>(&self, operation: F, key: K) -> RetryResult<T, E>
    where
        F: FnMut(K) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        K: Clone,
    {
        self.drive(operation, key, None).await.into_result()
    }

    /// Execute an operation that takes no input
    pub async fn run<F, Fut, T>(&self, mut operation: F) -> RetryResult<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.execute(move |()| operation(), ()).await
    }

    /// Execute `operation`, giving up when `token` is cancelled while waiting
    /// for admission or between attempts
    pub async fn execute_with_cancellation<F, Fut, K, T>(
        &self,
        operation: F,
        key: K,
        token: &CancellationToken,
    ) -> RetryResult<T, E>
    where
        F: FnMut(K) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        K: Clone,
    {
        self.drive(operation, key, Some(token)).await.into_result()
    }

    /// Execute `operation` and return the per-attempt records with the result
    pub async fn execute_with_outcome<F, Fut, K, T>(
        &self,
        operation: F,
        key: K,
    ) -> RetryOutcome<T, E>
    where
        F: FnMut(K) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        K: Clone,
    {
        self.drive(operation, key, None).await
    }

    #[instrument(
        skip_all,
        fields(
            operation = %self.name,
            max_attempts = self.policy.max_attempts(),
            cancellable = cancel.is_some(),
        )
    )]
    async fn drive<F, Fut, K, T>(
        &self,
        mut operation: F,
        key: K,
        cancel: Option<&CancellationToken>,
    ) -> RetryOutcome<T, E>
    where
        F: FnMut(K) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        K: Clone,
    {
        let started = Instant::now();
        let mut records = Vec::new();
        let mut total_delay = Duration::ZERO;

        let _permit = match self.admit(cancel).await {
            Ok(permit) => permit,
            Err(error) => return finish(Err(error), records, total_delay, started),
        };

        let max_attempts = self.policy.max_attempts();
        let mut attempt: u32 = 0;
        let mut delay_before = Duration::ZERO;

        loop {
            debug!("Executing operation (attempt {}/{})", attempt + 1, max_attempts);

            let error = match operation(key.clone()).await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!("Operation succeeded after {} retries", attempt);
                    }
                    records.push(AttemptRecord::succeeded(attempt, delay_before));
                    return finish(Ok(value), records, total_delay, started);
                }
                Err(error) => error,
            };

            let attempts = attempt + 1;
            let decision = self.policy.decide(&error, attempt);
            records.push(AttemptRecord::failed(
                attempt,
                delay_before,
                error.to_string(),
                decision != RetryDecision::Stop,
            ));

            match decision {
                RetryDecision::Stop => {
                    debug!(attempts, %error, "Non-retryable error, not retrying");
                    let result = Err(RetryError::NonRetryable { source: error, attempts });
                    return finish(result, records, total_delay, started);
                }
                RetryDecision::Exhausted => {
                    debug!(attempts, %error, "All retry attempts exhausted");
                    let result = Err(RetryError::Exhausted { source: error, attempts });
                    return finish(result, records, total_delay, started);
                }
                RetryDecision::Retry(delay) => {
                    debug!(attempt = attempts, ?delay, %error, "Operation failed, retrying");
                    drop(error);

                    if !pause(delay, cancel).await {
                        debug!(attempts, "Cancelled during retry delay");
                        let result = Err(RetryError::Cancelled { attempts });
                        return finish(result, records, total_delay, started);
                    }
                    total_delay += delay;
                    delay_before = delay;
                    attempt = attempts;
                }
            }
        }
    }

    async fn admit(
        &self,
        cancel: Option<&CancellationToken>,
    ) -> Result<AdmissionPermit, RetryError<E>> {
        let admission = self.limiter.admit(self.admission);
        let result = match cancel {
            Some(token) => tokio::select! {
                biased;
                () = token.cancelled() => {
                    debug!("Cancelled while waiting for admission");
                    return Err(RetryError::Cancelled { attempts: 0 });
                }
                result = admission => result,
            },
            None => admission.await,
        };

        result.map_err(|error| {
            debug!(%error, "Admission failed");
            RetryError::from(error)
        })
    }
}

/// Sleep for `delay`; returns false when cancelled first
async fn pause(delay: Duration, cancel: Option<&CancellationToken>) -> bool {
    match cancel {
        Some(token) => tokio::select! {
            biased;
            () = token.cancelled() => false,
            () = tokio::time::sleep(delay) => true,
        },
        None => {
            tokio::time::sleep(delay).await;
            true
        }
    }
}

fn finish<T, E>(
    result: RetryResult<T, E>,
    records: Vec<AttemptRecord>,
    total_delay: Duration,
    started: Instant,
) -> RetryOutcome<T, E> {
    RetryOutcome { result, records, total_delay, elapsed: started.elapsed() }
}

impl<E> Clone for RetryExecutor<E> {
    fn clone(&self) -> Self {
        Self {
            policy: Arc::clone(&self.policy),
            limiter: self.limiter.clone(),
            admission: self.admission,
            name: self.name.clone(),
        }
    }
}

impl<E> fmt::Debug for RetryExecutor<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryExecutor")
            .field("name", &self.name)
            .field("policy", &self.policy)
            .field("limiter", &self.limiter)
            .field("admission", &self.admission)
            .finish()
    }
}

/// A function bound to an executor; see [`RetryExecutor::guard`]
pub struct Guarded<F, E> {
    executor: RetryExecutor<E>,
    function: F,
}

impl<F, E> Guarded<F, E> {
    pub fn executor(&self) -> &RetryExecutor<E> {
        &self.executor
    }
}

impl<F, E: fmt::Display> Guarded<F, E> {
    /// Invoke the wrapped function under the executor's policy and limiter
    pub async fn call<K, Fut, T>(&self, key: K) -> RetryResult<T, E>
    where
        F: Fn(K) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        K: Clone,
    {
        self.executor.execute(|key| (self.function)(key), key).await
    }
}

impl<F: Clone, E> Clone for Guarded<F, E> {
    fn clone(&self) -> Self {
        Self { executor: self.executor.clone(), function: self.function.clone() }
    }
}

impl<F, E> fmt::Debug for Guarded<F, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guarded").field("executor", &self.executor).finish_non_exhaustive()
    }
}
