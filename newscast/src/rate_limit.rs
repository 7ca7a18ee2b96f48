//! Sliding-window pacing for a single upstream.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Allows at most `permits` acquisitions to start within any trailing
/// `window`. Callers are delayed, never rejected.
///
/// A limiter is owned by exactly one collector run, so acquisition takes
/// `&mut self` and needs no locking.
#[derive(Debug)]
pub struct RateLimiter {
    permits: usize,
    window: Duration,
    started: VecDeque<Instant>,
}

impl RateLimiter {
    pub fn new(permits: u32, window: Duration) -> Self {
        let permits = permits.max(1) as usize;
        Self {
            permits,
            window,
            started: VecDeque::with_capacity(permits),
        }
    }

    pub fn permits(&self) -> usize {
        self.permits
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Wait until a permit is free, then record the start of an operation.
    pub async fn acquire(&mut self) {
        loop {
            let now = Instant::now();
            while let Some(&oldest) = self.started.front() {
                if now.duration_since(oldest) >= self.window {
                    self.started.pop_front();
                } else {
                    break;
                }
            }

            if self.started.len() < self.permits {
                self.started.push_back(now);
                return;
            }

            // Full window: sleep until the oldest start ages out.
            let Some(&oldest) = self.started.front() else { continue };
            let ready_at = oldest + self.window;
            debug!(wait = ?ready_at.duration_since(now), "rate limiter delaying call");
            tokio::time::sleep_until(ready_at).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_permits_within_window_are_immediate() {
        let mut limiter = RateLimiter::new(3, Duration::from_secs(10));
        let start = Instant::now();
        for _ in 0..3 {
            limiter.acquire().await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_extra_acquisition_waits_for_window() {
        let mut limiter = RateLimiter::new(2, Duration::from_secs(15));
        let start = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_secs(15));
        assert!(start.elapsed() < Duration::from_secs(16));
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_slides_with_earlier_calls() {
        let mut limiter = RateLimiter::new(2, Duration::from_secs(10));
        let start = Instant::now();
        limiter.acquire().await;
        tokio::time::sleep(Duration::from_secs(4)).await;
        limiter.acquire().await;

        // Oldest start was at t=0, so the third call may begin at t=10.
        limiter.acquire().await;
        assert_eq!(start.elapsed(), Duration::from_secs(10));

        // Second start (t=4) now gates the fourth call until t=14.
        limiter.acquire().await;
        assert_eq!(start.elapsed(), Duration::from_secs(14));
    }

    #[test]
    fn test_zero_permits_is_clamped() {
        let limiter = RateLimiter::new(0, Duration::from_secs(1));
        assert_eq!(limiter.permits(), 1);
    }
}
