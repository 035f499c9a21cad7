//! Bounded retry with exponential backoff for transient network failures.

use log::warn;
use std::fmt::Display;
use std::time::Duration;

/// Classifies errors that are worth another attempt.
pub trait Transient {
    /// Returns true when retrying the failed operation may succeed.
    fn is_transient(&self) -> bool;
}

/// How many times to attempt an operation and how long to wait in between.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use wheelhouse_indexer::retry::RetryPolicy;
///
/// let policy = RetryPolicy::new(3, Duration::from_millis(100));
/// assert_eq!(policy.delay_for(1), Duration::from_millis(100));
/// assert_eq!(policy.delay_for(2), Duration::from_millis(200));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl RetryPolicy {
    /// Upper bound on any single backoff delay.
    pub const MAX_DELAY: Duration = Duration::from_secs(30);

    /// Create a policy making at most `max_attempts` attempts (minimum one).
    #[must_use]
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay: Self::MAX_DELAY,
        }
    }

    /// A policy that never retries.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Maximum number of attempts, including the first.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before the retry following failed attempt number `attempt`
    /// (1-based). Doubles per attempt, capped at [`Self::MAX_DELAY`].
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1_u32 << exponent)
            .min(self.max_delay)
    }

    /// Run `operation` until it succeeds, fails permanently, or the attempt
    /// budget is exhausted. The closure receives the 1-based attempt number.
    ///
    /// # Errors
    ///
    /// Returns the last error produced by `operation`.
    pub fn run<T, E, F>(&self, label: &str, mut operation: F) -> Result<T, E>
    where
        E: Transient + Display,
        F: FnMut(u32) -> Result<T, E>,
    {
        let mut attempt = 1;
        loop {
            match operation(attempt) {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < self.max_attempts => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        "{label}: attempt {attempt}/{} failed: {err}; retrying in {delay:?}",
                        self.max_attempts
                    );
                    std::thread::sleep(delay);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(500))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::cell::Cell;

    #[derive(Debug)]
    struct FakeError {
        transient: bool,
    }

    impl Display for FakeError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "fake error (transient: {})", self.transient)
        }
    }

    impl Transient for FakeError {
        fn is_transient(&self) -> bool {
            self.transient
        }
    }

    fn fast_policy(attempts: u32) -> RetryPolicy {
        RetryPolicy::new(attempts, Duration::ZERO)
    }

    #[test]
    fn succeeds_after_transient_failures() {
        let calls = Cell::new(0);
        let result = fast_policy(3).run("test", |attempt| {
            calls.set(calls.get() + 1);
            if attempt < 3 {
                Err(FakeError { transient: true })
            } else {
                Ok(attempt)
            }
        });
        assert_eq!(result.expect("third attempt succeeds"), 3);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn stops_at_attempt_budget() {
        let calls = Cell::new(0);
        let result: Result<(), _> = fast_policy(2).run("test", |_| {
            calls.set(calls.get() + 1);
            Err(FakeError { transient: true })
        });
        assert!(result.is_err());
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn permanent_errors_are_not_retried() {
        let calls = Cell::new(0);
        let result: Result<(), _> = fast_policy(5).run("test", |_| {
            calls.set(calls.get() + 1);
            Err(FakeError { transient: false })
        });
        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }

    #[rstest]
    #[case(1, 100)]
    #[case(2, 200)]
    #[case(3, 400)]
    #[case(40, 30_000)]
    fn delay_doubles_and_caps(#[case] attempt: u32, #[case] expected_ms: u64) {
        let policy = RetryPolicy::new(50, Duration::from_millis(100));
        assert_eq!(policy.delay_for(attempt), Duration::from_millis(expected_ms));
    }

    #[test]
    fn zero_attempts_still_runs_once() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts(), 1);
        assert_eq!(RetryPolicy::none().max_attempts(), 1);
    }
}
