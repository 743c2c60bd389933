//! Retry with bounded exponential backoff for transient provider errors.

use crate::error::{Error, Result};
use std::thread;
use std::time::Duration;

/// Backoff policy for transient failures.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first
    pub max_attempts: u32,
    /// Delay before the second attempt
    pub base_delay: Duration,
    /// Multiplier applied per subsequent attempt
    pub backoff_factor: f64,
    /// Ceiling on the computed delay
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(500),
            backoff_factor: 2.0,
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
    /// A policy that gives up after the first failure.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay before re-running after the given 0-indexed failed attempt.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self.base_delay.as_secs_f64() * self.backoff_factor.powi(attempt as i32);
        Duration::from_secs_f64(delay.min(self.max_delay.as_secs_f64()))
    }
}

/// Run `operation`, retrying transient errors per `config`.
///
/// `on_retry(attempt, max_attempts, error, delay)` is invoked before each
/// backoff sleep, with `attempt` counting the failed attempt (1-indexed).
/// Non-retryable errors are returned immediately; once the attempt ceiling
/// is reached the last transient error is returned.
pub fn with_retry<T, F, C>(config: &RetryConfig, mut operation: F, mut on_retry: C) -> Result<T>
where
    F: FnMut() -> Result<T>,
    C: FnMut(u32, u32, &Error, Duration),
{
    let mut last_error = None;

    for attempt in 0..config.max_attempts {
        match operation() {
            Ok(value) => return Ok(value),
            Err(e) if !e.is_retryable() => return Err(e),
            Err(e) => {
                if attempt + 1 >= config.max_attempts {
                    last_error = Some(e);
                    break;
                }
                let delay = config.delay_for_attempt(attempt);
                on_retry(attempt + 1, config.max_attempts, &e, delay);
                thread::sleep(delay);
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| Error::transient("retry exhausted")))
}

/// Retry without an observer.
pub fn with_retry_simple<T, F>(config: &RetryConfig, operation: F) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    with_retry(config, operation, |_, _, _, _| {})
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn fast(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            base_delay: Duration::from_millis(1),
            backoff_factor: 1.0,
            max_delay: Duration::from_millis(5),
        }
    }

    #[test]
    fn success_on_first_try() {
        let result = with_retry_simple(&RetryConfig::no_retry(), || Ok(42));
        assert_eq!(result.unwrap(), 42);
    }

    #[test]
    fn terminal_error_is_not_retried() {
        let attempts = Cell::new(0u32);
        let result: Result<()> = with_retry_simple(&fast(3), || {
            attempts.set(attempts.get() + 1);
            Err(Error::terminal("invalid configuration"))
        });
        assert!(result.is_err());
        assert_eq!(attempts.get(), 1);
    }

    #[test]
    fn transient_error_retries_until_success() {
        let attempts = Cell::new(0u32);
        let result = with_retry_simple(&fast(4), || {
            attempts.set(attempts.get() + 1);
            if attempts.get() < 3 {
                Err(Error::transient("rate limited"))
            } else {
                Ok("done")
            }
        });
        assert_eq!(result.unwrap(), "done");
        assert_eq!(attempts.get(), 3);
    }

    #[test]
    fn attempt_ceiling_is_honored() {
        let attempts = Cell::new(0u32);
        let result: Result<()> = with_retry_simple(&fast(3), || {
            attempts.set(attempts.get() + 1);
            Err(Error::transient("still flaky"))
        });
        assert!(matches!(result, Err(Error::Transient { .. })));
        assert_eq!(attempts.get(), 3);
    }

    #[test]
    fn observer_sees_each_backoff() {
        let seen = Cell::new(0u32);
        let _: Result<()> = with_retry(
            &fast(3),
            || Err(Error::transient("flaky")),
            |attempt, max, _, _| {
                seen.set(seen.get() + 1);
                assert!(attempt < max);
            },
        );
        // Notified before each sleep: not on the first attempt, not after the last
        assert_eq!(seen.get(), 2);
    }

    #[test]
    fn backoff_grows_and_caps() {
        let config = RetryConfig {
            max_attempts: 5,
            base_delay: Duration::from_millis(100),
            backoff_factor: 2.0,
            max_delay: Duration::from_millis(300),
        };
        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(300));
        assert_eq!(config.delay_for_attempt(5), Duration::from_millis(300));
    }
}
