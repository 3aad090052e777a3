//! The retry executor.

use super::classifier::RetryClassifier;
use super::interval::RetryInterval;
use std::error::Error;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Implemented by error types that go through a [`RetryPolicy`].
///
/// `can_retry` lets an error type exclude whole kinds from classification:
/// when it returns `false` the error is terminal, whatever its text says.
/// The default accepts every error for classification.
pub trait RetryEligible: Error {
    /// Whether this error may be handed to the retry classifier at all.
    fn can_retry(&self) -> bool {
        true
    }
}

impl RetryEligible for std::io::Error {}

/// Failure returned by [`RetryPolicy::execute`].
#[derive(Debug, thiserror::Error)]
pub enum RetryError<E>
where
    E: Error + 'static,
{
    /// The attempt failed with an error that is not retryable.
    #[error(transparent)]
    Terminal(E),

    /// Every attempt failed with a retryable error.
    #[error("max retries exhausted after {attempts} attempts")]
    Exhausted {
        /// Number of attempts performed
        attempts: u32,
        /// Error from the final attempt
        #[source]
        last: E,
    },
}

impl<E> RetryError<E>
where
    E: Error + 'static,
{
    /// Number of attempts made before the budget ran out, if it did.
    pub fn attempts(&self) -> Option<u32> {
        match self {
            Self::Terminal(_) => None,
            Self::Exhausted { attempts, .. } => Some(*attempts),
        }
    }

    /// True if the retry budget ran out.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }

    /// The error from the last attempt.
    pub fn into_inner(self) -> E {
        match self {
            Self::Terminal(err) => err,
            Self::Exhausted { last, .. } => last,
        }
    }
}

/// Bounded retry policy: attempt budget, classification and interval.
///
/// The attempt budget counts every attempt including the first, so a policy
/// with `max_attempts == 3` calls the operation at most three times.
///
/// Between attempts the policy waits according to its [`RetryInterval`] only
/// when sleeping is enabled; by default retries are immediate.
///
/// # Examples
///
/// ```rust
/// use docstore_core::{RetryInterval, RetryPolicy};
/// use std::time::Duration;
///
/// let policy = RetryPolicy::builder()
///     .max_attempts(5)
///     .retryable_errors(["connection reset", "not primary"])
///     .interval(RetryInterval::Linear { step: Duration::from_millis(50) })
///     .sleep_between_attempts(true)
///     .build();
///
/// assert_eq!(policy.max_attempts(), 5);
/// assert_eq!(policy.next_delay(2), Some(Duration::from_millis(100)));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    classifier: RetryClassifier,
    interval: RetryInterval,
    sleep_between_attempts: bool,
}

impl Default for RetryPolicy {
    /// Defaults:
    /// - `max_attempts`: 3
    /// - `classifier`: empty (nothing is retryable)
    /// - `interval`: 10s × attempt
    /// - `sleep_between_attempts`: false
    fn default() -> Self {
        Self {
            max_attempts: 3,
            classifier: RetryClassifier::default(),
            interval: RetryInterval::default(),
            sleep_between_attempts: false,
        }
    }
}

impl RetryPolicy {
    /// Create a builder starting from the defaults.
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder::default()
    }

    /// Maximum number of attempts, including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// The retryable-error classifier.
    pub fn classifier(&self) -> &RetryClassifier {
        &self.classifier
    }

    /// The configured interval policy, whether or not it is applied.
    pub fn interval(&self) -> &RetryInterval {
        &self.interval
    }

    /// Whether the executor waits between attempts.
    pub fn sleeps_between_attempts(&self) -> bool {
        self.sleep_between_attempts
    }

    /// Decide whether `error` should be retried.
    pub fn should_retry<E>(&self, error: &E) -> bool
    where
        E: RetryEligible,
    {
        error.can_retry() && self.classifier.is_retryable(error)
    }

    /// Delay to wait after `attempt` failed, or `None` when retries are immediate.
    pub fn next_delay(&self, attempt: u32) -> Option<Duration> {
        self.sleep_between_attempts
            .then(|| self.interval.delay_for_attempt(attempt))
    }

    /// Run `operation` until it succeeds, fails terminally, or the attempt
    /// budget is spent.
    ///
    /// Attempts are strictly sequential. A terminal failure is returned after
    /// the attempt that produced it without consuming further attempts.
    pub async fn execute<F, Fut, T, E>(&self, mut operation: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: RetryEligible + 'static,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if !self.should_retry(&err) => return Err(RetryError::Terminal(err)),
                Err(err) if attempt >= self.max_attempts => {
                    warn!(
                        attempts = attempt,
                        error = %err,
                        "retry budget exhausted"
                    );
                    return Err(RetryError::Exhausted {
                        attempts: attempt,
                        last: err,
                    });
                }
                Err(err) => {
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %err,
                        "retryable error, attempting again"
                    );
                    if let Some(delay) = self.next_delay(attempt)
                        && !delay.is_zero()
                    {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
    }
}

/// Builder for [`RetryPolicy`].
#[derive(Debug, Default)]
pub struct RetryPolicyBuilder {
    max_attempts: Option<u32>,
    classifier: Option<RetryClassifier>,
    interval: Option<RetryInterval>,
    sleep_between_attempts: Option<bool>,
}

impl RetryPolicyBuilder {
    /// Set the attempt budget. Values below 1 are raised to 1.
    ///
    /// Default: 3
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts.max(1));
        self
    }

    /// Set the retryable-error substrings.
    ///
    /// Default: none
    pub fn retryable_errors<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.classifier = Some(RetryClassifier::new(patterns));
        self
    }

    /// Set a prepared classifier.
    pub fn classifier(mut self, classifier: RetryClassifier) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Set the interval policy.
    ///
    /// Default: 10s × attempt
    pub fn interval(mut self, interval: RetryInterval) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Wait according to the interval policy between attempts.
    ///
    /// Default: false
    pub fn sleep_between_attempts(mut self, enabled: bool) -> Self {
        self.sleep_between_attempts = Some(enabled);
        self
    }

    /// Build the policy, using defaults for unset values.
    pub fn build(self) -> RetryPolicy {
        let defaults = RetryPolicy::default();
        RetryPolicy {
            max_attempts: self.max_attempts.unwrap_or(defaults.max_attempts),
            classifier: self.classifier.unwrap_or(defaults.classifier),
            interval: self.interval.unwrap_or(defaults.interval),
            sleep_between_attempts: self
                .sleep_between_attempts
                .unwrap_or(defaults.sleep_between_attempts),
        }
    }
}
