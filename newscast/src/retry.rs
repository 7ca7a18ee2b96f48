//! Bounded retry with capped exponential backoff.

use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::error::{ErrorKind, UpstreamError};

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    retry_on: Vec<ErrorKind>,
}

impl RetryPolicy {
    /// `max_attempts` counts the first call; zero is treated as one.
    /// Nothing is retryable until [`RetryPolicy::retry_on`] is used.
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay: max_delay.max(base_delay),
            retry_on: Vec::new(),
        }
    }

    /// Single attempt, no retries.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO, Duration::ZERO)
    }

    pub fn retry_on(mut self, kinds: &[ErrorKind]) -> Self {
        for kind in kinds {
            if !self.retry_on.contains(kind) {
                self.retry_on.push(*kind);
            }
        }
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn is_retryable(&self, err: &UpstreamError) -> bool {
        self.retry_on.contains(&err.kind())
    }

    /// Wait before the next call once `failed_attempts` calls have failed:
    /// `min(base * 2^(failed_attempts - 1), cap)`.
    pub fn delay_after(&self, failed_attempts: u32) -> Duration {
        let exponent = failed_attempts.saturating_sub(1).min(63) as i32;
        let secs = self.base_delay.as_secs_f64() * 2f64.powi(exponent);
        if secs >= self.max_delay.as_secs_f64() {
            self.max_delay
        } else {
            Duration::from_secs_f64(secs)
        }
    }

    pub async fn run<T, F, Fut>(&self, op: F) -> Result<T, UpstreamError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, UpstreamError>>,
    {
        self.run_counted(op).await.0
    }

    /// Like [`RetryPolicy::run`], also returning how many calls were made.
    pub async fn run_counted<T, F, Fut>(&self, mut op: F) -> (Result<T, UpstreamError>, u32)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, UpstreamError>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match op().await {
                Ok(value) => return (Ok(value), attempt),
                Err(e) if attempt < self.max_attempts && self.is_retryable(&e) => {
                    let delay = self.delay_after(attempt);
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        ?delay,
                        error = %e,
                        "transient upstream failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return (Err(e), attempt),
            }
        }
    }
}
