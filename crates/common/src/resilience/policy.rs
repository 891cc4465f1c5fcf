//! Retry policy: attempt budget, backoff schedule and retryable-error set
//!
//! The retryable set is a list of [`ErrorClassifier`]s. An empty set means
//! "retry on any failure"; otherwise an error is retried only when at least
//! one classifier matches it.
//!
//! Kind-based classifiers ([`ErrorClassifier::kind`]) compare error kinds
//! structurally with `PartialEq`, so matching is exact: a classifier for
//! `GatewayTimeout` never matches a different kind. Callers needing
//! hierarchical matching express it as a predicate with
//! [`RetryPolicyBuilder::retry_on`].

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::backoff::{Backoff, Jitter};
use super::constants::{DEFAULT_MAX_ATTEMPTS, MIN_MAX_ATTEMPTS, MIN_MULTIPLIER};
use crate::error::{CommonError, CommonResult, ErrorClassification};

/// Errors that expose a comparable kind tag
pub trait HasErrorKind {
    type Kind: PartialEq + fmt::Debug + Send + Sync + 'static;

    fn kind(&self) -> Self::Kind;
}

type Predicate<E> = dyn Fn(&E) -> bool + Send + Sync;

/// Named predicate deciding whether an error belongs to the retryable set
pub struct ErrorClassifier<E> {
    name: Cow<'static, str>,
    predicate: Arc<Predicate<E>>,
}

impl<E> ErrorClassifier<E> {
    /// Build a classifier from an arbitrary predicate
    pub fn new<N, P>(name: N, predicate: P) -> Self
    where
        N: Into<Cow<'static, str>>,
        P: Fn(&E) -> bool + Send + Sync + 'static,
    {
        Self { name: name.into(), predicate: Arc::new(predicate) }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn matches(&self, error: &E) -> bool {
        (self.predicate)(error)
    }
}

impl<E: HasErrorKind> ErrorClassifier<E> {
    /// Match errors whose kind equals `kind` exactly
    pub fn kind(kind: E::Kind) -> Self {
        let name = format!("{kind:?}");
        Self::new(name, move |error: &E| error.kind() == kind)
    }
}

impl<E: ErrorClassification> ErrorClassifier<E> {
    /// Match errors that report themselves as retryable
    pub fn classified() -> Self {
        Self::new("classified_retryable", |error: &E| error.is_retryable())
    }
}

impl<E> Clone for ErrorClassifier<E> {
    fn clone(&self) -> Self {
        Self { name: self.name.clone(), predicate: Arc::clone(&self.predicate) }
    }
}

impl<E> fmt::Debug for ErrorClassifier<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ErrorClassifier").field(&self.name).finish()
    }
}

/// Decision for a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait for the given delay, then try again
    Retry(Duration),
    /// The error is retryable but no attempts remain
    Exhausted,
    /// The error is outside the retryable set
    Stop,
}

/// Immutable retry configuration shared by every call of a guarded operation
pub struct RetryPolicy<E> {
    max_attempts: u32,
    backoff: Backoff,
    retryable: Vec<ErrorClassifier<E>>,
}

impl<E> RetryPolicy<E> {
    /// Create a configuration builder
    pub fn builder() -> RetryPolicyBuilder<E> {
        RetryPolicyBuilder::new()
    }

    /// Total attempts including the first one
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn backoff(&self) -> &Backoff {
        &self.backoff
    }

    pub fn classifiers(&self) -> &[ErrorClassifier<E>] {
        &self.retryable
    }

    /// Whether `error` is eligible for another attempt
    pub fn is_retryable(&self, error: &E) -> bool {
        self.retryable.is_empty() || self.retryable.iter().any(|c| c.matches(error))
    }

    /// Delay after the attempt with 0-based index `attempt` failed
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff.delay_for(attempt)
    }

    /// Decide what happens after the attempt with 0-based index `attempt`
    /// failed with `error`.
    ///
    /// Classification happens before the attempt budget is checked, so a
    /// non-retryable error always yields [`RetryDecision::Stop`].
    pub fn decide(&self, error: &E, attempt: u32) -> RetryDecision {
        if !self.is_retryable(error) {
            return RetryDecision::Stop;
        }
        if attempt.saturating_add(1) >= self.max_attempts {
            return RetryDecision::Exhausted;
        }
        RetryDecision::Retry(self.delay_for(attempt))
    }
}

impl<E> Clone for RetryPolicy<E> {
    fn clone(&self) -> Self {
        Self {
            max_attempts: self.max_attempts,
            backoff: self.backoff,
            retryable: self.retryable.clone(),
        }
    }
}

impl<E> fmt::Debug for RetryPolicy<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("backoff", &self.backoff)
            .field("retryable", &self.retryable.iter().map(ErrorClassifier::name).collect::<Vec<_>>())
            .finish()
    }
}

/// Builder for [`RetryPolicy`] with fluent API
pub struct RetryPolicyBuilder<E> {
    max_attempts: u32,
    backoff: Backoff,
    retryable: Vec<ErrorClassifier<E>>,
}

impl<E> Default for RetryPolicyBuilder<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> RetryPolicyBuilder<E> {
    pub fn new() -> Self {
        Self { max_attempts: DEFAULT_MAX_ATTEMPTS, backoff: Backoff::default(), retryable: Vec::new() }
    }

    /// Total attempts including the first one
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.backoff.initial_delay = delay;
        self
    }

    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.backoff.multiplier = multiplier;
        self
    }

    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.backoff.max_delay = Some(delay);
        self
    }

    pub fn jitter(mut self, jitter: Jitter) -> Self {
        self.backoff.jitter = jitter;
        self
    }

    pub fn backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Add a named predicate to the retryable set
    pub fn retry_on<N, P>(mut self, name: N, predicate: P) -> Self
    where
        N: Into<Cow<'static, str>>,
        P: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.retryable.push(ErrorClassifier::new(name, predicate));
        self
    }

    pub fn classifier(mut self, classifier: ErrorClassifier<E>) -> Self {
        self.retryable.push(classifier);
        self
    }

    pub fn build(self) -> CommonResult<RetryPolicy<E>> {
        if self.max_attempts < MIN_MAX_ATTEMPTS {
            return Err(CommonError::config("max_attempts", "must be at least 1"));
        }
        let multiplier = self.backoff.multiplier;
        if !multiplier.is_finite() || multiplier < MIN_MULTIPLIER {
            return Err(CommonError::config(
                "multiplier",
                format!("must be a finite number >= 1.0, got {multiplier}"),
            ));
        }
        if let Some(max_delay) = self.backoff.max_delay {
            if max_delay < self.backoff.initial_delay {
                return Err(CommonError::config(
                    "max_delay",
                    format!(
                        "{max_delay:?} is shorter than initial_delay {:?}",
                        self.backoff.initial_delay
                    ),
                ));
            }
        }

        Ok(RetryPolicy {
            max_attempts: self.max_attempts,
            backoff: self.backoff,
            retryable: self.retryable,
        })
    }
}

impl<E: HasErrorKind> RetryPolicyBuilder<E> {
    /// Add an exact-kind classifier to the retryable set
    pub fn retry_on_kind(self, kind: E::Kind) -> Self {
        self.classifier(ErrorClassifier::kind(kind))
    }
}

impl<E: ErrorClassification> RetryPolicyBuilder<E> {
    /// Retry every error whose [`ErrorClassification::is_retryable`] is true
    pub fn retry_on_classified(self) -> Self {
        self.classifier(ErrorClassifier::classified())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorSeverity;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Kind {
        GatewayTimeout,
        BadRequest,
    }

    #[derive(Debug)]
    struct FakeError(Kind);

    impl HasErrorKind for FakeError {
        type Kind = Kind;

        fn kind(&self) -> Kind {
            self.0
        }
    }

    impl ErrorClassification for FakeError {
        fn is_retryable(&self) -> bool {
            self.0 == Kind::GatewayTimeout
        }

        fn severity(&self) -> ErrorSeverity {
            ErrorSeverity::Warning
        }
    }

    #[test]
    fn test_empty_set_retries_everything() {
        let policy = RetryPolicy::<FakeError>::builder().build().unwrap();
        assert!(policy.is_retryable(&FakeError(Kind::BadRequest)));
        assert!(policy.is_retryable(&FakeError(Kind::GatewayTimeout)));
    }

    #[test]
    fn test_kind_classifier_is_exact() {
        let policy =
            RetryPolicy::<FakeError>::builder().retry_on_kind(Kind::GatewayTimeout).build().unwrap();
        assert!(policy.is_retryable(&FakeError(Kind::GatewayTimeout)));
        assert!(!policy.is_retryable(&FakeError(Kind::BadRequest)));
        assert_eq!(policy.classifiers()[0].name(), "GatewayTimeout");
    }

    #[test]
    fn test_predicate_classifier_groups_kinds() {
        let policy = RetryPolicy::<FakeError>::builder()
            .retry_on("any_client_failure", |e: &FakeError| {
                matches!(e.0, Kind::GatewayTimeout | Kind::BadRequest)
            })
            .build()
            .unwrap();
        assert!(policy.is_retryable(&FakeError(Kind::GatewayTimeout)));
        assert!(policy.is_retryable(&FakeError(Kind::BadRequest)));
    }

    #[test]
    fn test_classified_classifier_uses_error_classification() {
        let policy = RetryPolicy::<FakeError>::builder().retry_on_classified().build().unwrap();
        assert!(policy.is_retryable(&FakeError(Kind::GatewayTimeout)));
        assert!(!policy.is_retryable(&FakeError(Kind::BadRequest)));
    }

    #[test]
    fn test_decide_sequence() {
        let policy = RetryPolicy::<FakeError>::builder()
            .max_attempts(3)
            .initial_delay(Duration::from_millis(200))
            .multiplier(2.0)
            .retry_on_kind(Kind::GatewayTimeout)
            .build()
            .unwrap();
        let timeout = FakeError(Kind::GatewayTimeout);

        assert_eq!(policy.decide(&timeout, 0), RetryDecision::Retry(Duration::from_millis(200)));
        assert_eq!(policy.decide(&timeout, 1), RetryDecision::Retry(Duration::from_millis(400)));
        assert_eq!(policy.decide(&timeout, 2), RetryDecision::Exhausted);
        assert_eq!(policy.decide(&FakeError(Kind::BadRequest), 0), RetryDecision::Stop);
    }

    #[test]
    fn test_single_attempt_never_retries() {
        let policy = RetryPolicy::<FakeError>::builder().max_attempts(1).build().unwrap();
        assert_eq!(policy.decide(&FakeError(Kind::GatewayTimeout), 0), RetryDecision::Exhausted);
    }

    #[test]
    fn test_non_retryable_wins_over_exhaustion() {
        let policy = RetryPolicy::<FakeError>::builder()
            .max_attempts(1)
            .retry_on_kind(Kind::GatewayTimeout)
            .build()
            .unwrap();
        assert_eq!(policy.decide(&FakeError(Kind::BadRequest), 0), RetryDecision::Stop);
    }

    #[test]
    fn test_build_validation() {
        assert!(matches!(
            RetryPolicy::<FakeError>::builder().max_attempts(0).build(),
            Err(CommonError::Config { ref field, .. }) if field == "max_attempts"
        ));
        assert!(RetryPolicy::<FakeError>::builder().multiplier(0.5).build().is_err());
        assert!(RetryPolicy::<FakeError>::builder().multiplier(f64::NAN).build().is_err());
        assert!(RetryPolicy::<FakeError>::builder()
            .initial_delay(Duration::from_secs(2))
            .max_delay(Duration::from_secs(1))
            .build()
            .is_err());
    }

    #[test]
    fn test_policy_debug_lists_classifier_names() {
        let policy = RetryPolicy::<FakeError>::builder()
            .retry_on("always", |_: &FakeError| true)
            .build()
            .unwrap();
        let rendered = format!("{policy:?}");
        assert!(rendered.contains("always"));
        assert!(rendered.contains("max_attempts: 3"));
    }
}
