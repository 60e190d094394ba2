use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use crate::config::TranscriptConfig;

/// Bounded retries with a flat pause between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts allowed after the first
    pub max_retries: u32,

    /// Pause before each re-attempt
    pub delay: Duration,
}

/// Why [`RetryPolicy::run`] gave up
#[derive(Debug)]
pub enum RetryError<E> {
    /// The predicate refused to retry this error
    Terminal { error: E, attempt: u32 },

    /// Every allowed attempt failed; `error` is the last one
    Exhausted { error: E, attempts: u32 },
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            delay: Duration::from_secs(1),
        }
    }
}

impl From<&TranscriptConfig> for RetryPolicy {
    fn from(config: &TranscriptConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            delay: config.retry_delay(),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    pub fn total_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Run `operation` until it succeeds, fails with an error `is_retryable`
    /// rejects, or runs out of attempts. The operation gets the 1-based attempt
    /// number and is re-run from scratch each time.
    pub async fn run<T, E, F, Fut, P>(&self, mut operation: F, is_retryable: P) -> Result<T, RetryError<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        E: Display,
    {
        let total = self.total_attempts();
        let mut attempt = 1;

        loop {
            match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(error) if !is_retryable(&error) => {
                    return Err(RetryError::Terminal { error, attempt });
                }
                Err(error) if attempt >= total => {
                    tracing::warn!("Giving up after {} attempt(s): {}", attempt, error);
                    return Err(RetryError::Exhausted {
                        error,
                        attempts: attempt,
                    });
                }
                Err(error) => {
                    tracing::warn!(
                        "Attempt {}/{} failed, retrying in {:?}: {}",
                        attempt,
                        total,
                        self.delay,
                        error
                    );
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
