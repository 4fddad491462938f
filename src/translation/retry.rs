/*!
 * Retry policy with exponential backoff.
 *
 * Wraps any fallible async call independently of the call site. Sleeps between
 * attempts honour the cancellation token, so an aborted run never waits out a
 * backoff.
 */

use log::warn;
use std::future::Future;
use std::time::Duration;

use super::cancel::CancelToken;

/// Longest wait between two attempts
pub const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Attempts, base delay and growth factor
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, the first call included
    pub max_attempts: u32,
    /// Delay after the first failed attempt
    pub base_delay: Duration,
    /// Factor applied to the delay after every further failure
    pub multiplier: f64,
}

/// Why `RetryPolicy::run` gave up
#[derive(Debug, Clone, PartialEq)]
pub enum RetryError<E> {
    /// Every attempt failed with a retryable error
    Exhausted { attempts: u32, last_error: E },
    /// An attempt failed with an error that must not be retried
    Fatal(E),
    /// The token fired before a result was available
    Cancelled,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, multiplier: f64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            multiplier: multiplier.max(1.0),
        }
    }

    /// Policy that retries immediately, for tests and offline engines
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO, 1.0)
    }

    /// Wait before the next attempt, after `failed_attempts` failures (1-based),
    /// capped at `MAX_BACKOFF`
    pub fn delay_for(&self, failed_attempts: u32) -> Duration {
        if self.base_delay.is_zero() {
            return Duration::ZERO;
        }
        let exponent = failed_attempts.saturating_sub(1).min(i32::MAX as u32) as i32;
        let seconds = self.base_delay.as_secs_f64() * self.multiplier.powi(exponent);
        Duration::try_from_secs_f64(seconds)
            .map(|delay| delay.min(MAX_BACKOFF))
            .unwrap_or(MAX_BACKOFF)
    }

    /// Run `operation` until it succeeds, fails fatally or attempts run out
    pub async fn run<T, E, F, Fut, R>(
        &self,
        cancel: &CancelToken,
        is_retryable: R,
        mut operation: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        R: Fn(&E) -> bool,
        E: std::fmt::Display,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;

            let result = match cancel.run(operation(attempt)).await {
                Some(result) => result,
                None => return Err(RetryError::Cancelled),
            };

            let error = match result {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            if !is_retryable(&error) {
                return Err(RetryError::Fatal(error));
            }

            if attempt >= self.max_attempts {
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    last_error: error,
                });
            }

            let delay = self.delay_for(attempt);
            warn!(
                "Attempt {}/{} failed: {} - retrying in {:?}",
                attempt, self.max_attempts, error, delay
            );
            if cancel.run(tokio::time::sleep(delay)).await.is_none() {
                return Err(RetryError::Cancelled);
            }
        }
    }
}
