//! Bounded exponential-backoff retry around a fallible async call.
//!
//! The policy sleeps `initial_delay`, then multiplies the delay by
//! `backoff_base` after each failed attempt, capped at `max_delay`. No jitter.
//! When every attempt fails, the last error is returned unchanged.

use std::future::Future;
use std::time::Duration;

use super::logger::StepLogger;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_BACKOFF_BASE: f64 = 2.0;
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(10);

/// Retry schedule. `max_retries` counts total attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub backoff_base: f64,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: DEFAULT_INITIAL_DELAY,
            backoff_base: DEFAULT_BACKOFF_BASE,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

/// Result of a retried call plus the number of attempts it took.
#[derive(Debug)]
pub struct Attempted<T, E> {
    pub result: Result<T, E>,
    pub attempts: u32,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_delay: Duration, backoff_base: f64, max_delay: Duration) -> Self {
        Self {
            max_retries,
            initial_delay,
            backoff_base,
            max_delay,
        }
    }

    /// Delay slept after the given failed attempt (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.initial_delay.as_secs_f64() * self.backoff_base.powi(exponent);
        if !secs.is_finite() || secs >= self.max_delay.as_secs_f64() {
            return self.max_delay;
        }
        Duration::from_secs_f64(secs.max(0.0))
    }

    /// Retries `op` on every error.
    pub async fn run<T, E, F, Fut>(&self, logger: &dyn StepLogger, step: &str, op: F) -> Attempted<T, E>
    where
        E: std::fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.run_if(logger, step, |_| true, op).await
    }

    /// Retries `op` while `should_retry` accepts the error; other errors are
    /// returned after the attempt that produced them.
    pub async fn run_if<T, E, P, F, Fut>(
        &self,
        logger: &dyn StepLogger,
        step: &str,
        should_retry: P,
        mut op: F,
    ) -> Attempted<T, E>
    where
        E: std::fmt::Display,
        P: Fn(&E) -> bool,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let max_attempts = self.max_retries.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let err = match op().await {
                Ok(value) => {
                    if attempt > 1 {
                        logger.info(step, &format!("succeeded on attempt {}", attempt));
                    }
                    return Attempted {
                        result: Ok(value),
                        attempts: attempt,
                    };
                }
                Err(err) => err,
            };

            if attempt >= max_attempts {
                logger.error(
                    step,
                    &format!("failed after {} attempt(s): {}", attempt, err),
                );
                return Attempted {
                    result: Err(err),
                    attempts: attempt,
                };
            }

            if !should_retry(&err) {
                logger.warn(step, &format!("non-retryable error: {}", err));
                return Attempted {
                    result: Err(err),
                    attempts: attempt,
                };
            }

            let delay = self.delay_after(attempt);
            logger.warn(
                step,
                &format!(
                    "attempt {}/{} failed: {}. Retrying in {:.2}s",
                    attempt,
                    max_attempts,
                    err,
                    delay.as_secs_f64()
                ),
            );
            tokio::time::sleep(delay).await;
        }
    }
}
