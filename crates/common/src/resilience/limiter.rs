//! Concurrency limiter bounding in-flight executions
//!
//! A counting semaphore with `limit` permits. Every admitted caller holds an
//! [`AdmissionPermit`]; dropping the permit releases the slot, so release is
//! paired with admission on every exit path, including a caller dropping
//! its future while it still holds the permit.
//!
//! Waiters are admitted in FIFO order (tokio's semaphore queues them fairly).

use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

use crate::error::{CommonError, CommonResult};

/// What to do when the limiter is saturated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AdmissionStrategy {
    /// Wait until a slot frees, without a deadline
    #[default]
    Wait,
    /// Wait up to the given duration, then give up
    WaitTimeout(Duration),
    /// Fail immediately
    Reject,
}

/// Why admission failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AdmissionError {
    #[error("concurrency limit of {limit} reached")]
    Rejected { limit: usize },

    #[error("no slot freed within {timeout:?}")]
    TimedOut { timeout: Duration },
}

/// Snapshot of limiter counters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimiterMetrics {
    pub limit: usize,
    pub in_flight: usize,
    /// Highest in-flight count observed since creation or the last reset
    pub peak_in_flight: usize,
    pub admitted: u64,
    pub rejected: u64,
    pub timed_out: u64,
}

impl LimiterMetrics {
    /// Calculate the current utilization as a fraction (0.0 to 1.0)
    pub fn utilization(&self) -> f64 {
        self.in_flight as f64 / self.limit as f64
    }

    /// Fraction of admission requests that failed (rejected or timed out)
    pub fn rejection_rate(&self) -> f64 {
        let failed = self.rejected + self.timed_out;
        let total = self.admitted + failed;
        if total == 0 {
            return 0.0;
        }
        failed as f64 / total as f64
    }

    pub fn is_at_capacity(&self) -> bool {
        self.in_flight >= self.limit
    }
}

impl fmt::Display for LimiterMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Limiter: {}/{} in flight (peak {}), {} admitted, {} rejected, {} timed out",
            self.in_flight, self.limit, self.peak_in_flight, self.admitted, self.rejected,
            self.timed_out
        )
    }
}

struct LimiterState {
    limit: usize,
    semaphore: Arc<Semaphore>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    admitted: AtomicU64,
    rejected: AtomicU64,
    timed_out: AtomicU64,
}

/// Bounded counting gate shared by every caller of a guarded operation
///
/// Cloning is cheap and yields a handle to the same counters.
#[derive(Clone)]
pub struct ConcurrencyLimiter {
    state: Arc<LimiterState>,
}

impl ConcurrencyLimiter {
    /// Create a limiter admitting at most `limit` concurrent executions
    pub fn new(limit: usize) -> CommonResult<Self> {
        if limit == 0 {
            return Err(CommonError::config("concurrency_limit", "must be at least 1"));
        }
        if limit > Semaphore::MAX_PERMITS {
            return Err(CommonError::config(
                "concurrency_limit",
                format!("must not exceed {}", Semaphore::MAX_PERMITS),
            ));
        }
        Ok(Self::with_permits(limit))
    }

    /// A limiter that never saturates in practice
    pub fn unbounded() -> Self {
        Self::with_permits(Semaphore::MAX_PERMITS)
    }

    fn with_permits(limit: usize) -> Self {
        Self {
            state: Arc::new(LimiterState {
                limit,
                semaphore: Arc::new(Semaphore::new(limit)),
                in_flight: AtomicUsize::new(0),
                peak_in_flight: AtomicUsize::new(0),
                admitted: AtomicU64::new(0),
                rejected: AtomicU64::new(0),
                timed_out: AtomicU64::new(0),
            }),
        }
    }

    pub fn limit(&self) -> usize {
        self.state.limit
    }

    /// Number of permits currently held
    pub fn in_flight(&self) -> usize {
        self.state.in_flight.load(Ordering::Acquire)
    }

    /// Take a permit if one is free, without waiting
    pub fn try_acquire(&self) -> Option<AdmissionPermit> {
        match Arc::clone(&self.state.semaphore).try_acquire_owned() {
            Ok(permit) => Some(self.admitted(permit)),
            Err(_) => {
                self.state.rejected.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Wait for a permit without a deadline
    ///
    /// The semaphore is owned by the limiter and never closed, so waiting
    /// always ends with a permit.
    pub async fn acquire(&self) -> AdmissionPermit {
        let Ok(permit) = Arc::clone(&self.state.semaphore).acquire_owned().await else {
            unreachable!("limiter semaphore is never closed");
        };
        self.admitted(permit)
    }

    /// Obtain a permit according to `strategy`
    pub async fn admit(
        &self,
        strategy: AdmissionStrategy,
    ) -> Result<AdmissionPermit, AdmissionError> {
        match strategy {
            AdmissionStrategy::Wait => Ok(self.acquire().await),
            AdmissionStrategy::WaitTimeout(timeout) => {
                match tokio::time::timeout(timeout, self.acquire()).await {
                    Ok(permit) => Ok(permit),
                    Err(_) => {
                        self.state.timed_out.fetch_add(1, Ordering::Relaxed);
                        debug!(limit = self.state.limit, ?timeout, "admission timed out");
                        Err(AdmissionError::TimedOut { timeout })
                    }
                }
            }
            AdmissionStrategy::Reject => self.try_acquire().ok_or_else(|| {
                debug!(limit = self.state.limit, "admission rejected");
                AdmissionError::Rejected { limit: self.state.limit }
            }),
        }
    }

    fn admitted(&self, permit: OwnedSemaphorePermit) -> AdmissionPermit {
        let current = self.state.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        self.state.peak_in_flight.fetch_max(current, Ordering::AcqRel);
        self.state.admitted.fetch_add(1, Ordering::Relaxed);
        AdmissionPermit { state: Arc::clone(&self.state), _permit: permit }
    }

    /// Get limiter metrics
    pub fn metrics(&self) -> LimiterMetrics {
        LimiterMetrics {
            limit: self.state.limit,
            in_flight: self.in_flight(),
            peak_in_flight: self.state.peak_in_flight.load(Ordering::Acquire),
            admitted: self.state.admitted.load(Ordering::Acquire),
            rejected: self.state.rejected.load(Ordering::Acquire),
            timed_out: self.state.timed_out.load(Ordering::Acquire),
        }
    }

    /// Reset metrics counters; the in-flight count is left untouched
    pub fn reset_metrics(&self) {
        self.state.peak_in_flight.store(self.in_flight(), Ordering::Release);
        self.state.admitted.store(0, Ordering::Release);
        self.state.rejected.store(0, Ordering::Release);
        self.state.timed_out.store(0, Ordering::Release);
    }
}

impl fmt::Debug for ConcurrencyLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcurrencyLimiter")
            .field("limit", &self.state.limit)
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

/// Right to execute; releases its slot when dropped
#[must_use = "the slot is released as soon as the permit is dropped"]
pub struct AdmissionPermit {
    state: Arc<LimiterState>,
    _permit: OwnedSemaphorePermit,
}

impl Drop for AdmissionPermit {
    fn drop(&mut self) {
        // Runs before the semaphore permit field is dropped, so the counter
        // never reports more than `limit` holders.
        self.state.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

impl fmt::Debug for AdmissionPermit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdmissionPermit").field("limit", &self.state.limit).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn test_limit_validation() {
        assert!(ConcurrencyLimiter::new(0).is_err());
        assert!(ConcurrencyLimiter::new(1).is_ok());
        assert!(ConcurrencyLimiter::new(Semaphore::MAX_PERMITS + 1).is_err());
        assert_eq!(ConcurrencyLimiter::unbounded().limit(), Semaphore::MAX_PERMITS);
    }

    #[test]
    fn test_try_acquire_and_release() {
        let limiter = ConcurrencyLimiter::new(2).unwrap();

        let first = limiter.try_acquire().unwrap();
        let second = limiter.try_acquire().unwrap();
        assert_eq!(limiter.in_flight(), 2);
        assert!(limiter.try_acquire().is_none());
        assert!(limiter.metrics().is_at_capacity());

        drop(first);
        assert_eq!(limiter.in_flight(), 1);
        let third = limiter.try_acquire();
        assert!(third.is_some());

        drop(second);
        drop(third);
        let metrics = limiter.metrics();
        assert_eq!(metrics.in_flight, 0);
        assert_eq!(metrics.peak_in_flight, 2);
        assert_eq!(metrics.admitted, 3);
        assert_eq!(metrics.rejected, 1);
    }

    #[tokio::test]
    async fn test_reject_strategy_fails_fast() {
        let limiter = ConcurrencyLimiter::new(1).unwrap();
        let _held = limiter.admit(AdmissionStrategy::Reject).await.unwrap();

        let result = limiter.admit(AdmissionStrategy::Reject).await;
        assert_eq!(result.unwrap_err(), AdmissionError::Rejected { limit: 1 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_timeout_strategy() {
        let limiter = ConcurrencyLimiter::new(1).unwrap();
        let held = limiter.acquire().await;

        let timeout = Duration::from_millis(50);
        let result = limiter.admit(AdmissionStrategy::WaitTimeout(timeout)).await;
        assert_eq!(result.unwrap_err(), AdmissionError::TimedOut { timeout });
        assert_eq!(limiter.metrics().timed_out, 1);

        drop(held);
        assert!(limiter.admit(AdmissionStrategy::WaitTimeout(timeout)).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_strategy_waits_until_a_slot_frees() {
        let limiter = ConcurrencyLimiter::new(1).unwrap();
        let held = limiter.acquire().await;

        let waiter = {
            let limiter = limiter.clone();
            tokio::spawn(async move { limiter.admit(AdmissionStrategy::Wait).await })
        };
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(!waiter.is_finished());

        drop(held);
        let permit = waiter.await.unwrap().unwrap();
        assert_eq!(limiter.in_flight(), 1);
        drop(permit);

        let metrics = limiter.metrics();
        assert_eq!((metrics.admitted, metrics.rejected, metrics.timed_out), (2, 0, 0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_waiters_are_admitted_in_fifo_order() {
        let limiter = ConcurrencyLimiter::new(1).unwrap();
        let order = Arc::new(Mutex::new(Vec::new()));
        let held = limiter.try_acquire().unwrap();

        let mut handles = Vec::new();
        for id in 0..4 {
            let limiter = limiter.clone();
            let order = Arc::clone(&order);
            handles.push(tokio::spawn(async move {
                let _permit = limiter.acquire().await;
                order.lock().unwrap().push(id);
            }));
            // Let the task enqueue itself before spawning the next one
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        drop(held);
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3]);
        assert_eq!(limiter.in_flight(), 0);
    }

    #[test]
    fn test_metrics_math() {
        let metrics = LimiterMetrics {
            limit: 10,
            in_flight: 5,
            peak_in_flight: 9,
            admitted: 80,
            rejected: 15,
            timed_out: 5,
        };
        assert_eq!(metrics.utilization(), 0.5);
        assert_eq!(metrics.rejection_rate(), 0.2);
        assert!(!metrics.is_at_capacity());
        assert!(metrics.to_string().contains("5/10 in flight"));
    }

    #[test]
    fn test_reset_metrics_keeps_in_flight() {
        let limiter = ConcurrencyLimiter::new(3).unwrap();
        let _a = limiter.try_acquire().unwrap();
        let b = limiter.try_acquire().unwrap();
        drop(b);

        limiter.reset_metrics();
        let metrics = limiter.metrics();
        assert_eq!(metrics.admitted, 0);
        assert_eq!(metrics.in_flight, 1);
        assert_eq!(metrics.peak_in_flight, 1);
    }
}
