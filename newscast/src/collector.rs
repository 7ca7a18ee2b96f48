use common::PacingConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::error::ErrorKind;
use crate::rate_limit::RateLimiter;
use crate::retry::RetryPolicy;
use crate::sources::{Source, SourceKind, TopicResult, TopicSummary};

/// Rate, retry and pause settings for one source.
#[derive(Debug, Clone)]
pub struct SourcePacing {
    pub permits: u32,
    pub window: Duration,
    /// Fixed pause between consecutive topics
    pub pause: Duration,
    pub retry: RetryPolicy,
}

impl SourcePacing {
    /// Defaults tuned to each upstream's tolerance.
    pub fn defaults_for(kind: SourceKind) -> Self {
        match kind {
            SourceKind::News => Self {
                permits: 5,
                window: Duration::from_secs(1),
                pause: Duration::from_secs(1),
                retry: RetryPolicy::new(3, Duration::from_secs(2), Duration::from_secs(10))
                    .retry_on(&[ErrorKind::Overloaded]),
            },
            SourceKind::Forum => Self {
                permits: 1,
                window: Duration::from_secs(15),
                pause: Duration::from_secs(5),
                retry: RetryPolicy::new(3, Duration::from_secs(15), Duration::from_secs(60))
                    .retry_on(&[ErrorKind::Overloaded]),
            },
            SourceKind::Social => Self {
                permits: 2,
                window: Duration::from_secs(15),
                pause: Duration::from_secs(3),
                retry: RetryPolicy::new(3, Duration::from_secs(15), Duration::from_secs(60))
                    .retry_on(&[ErrorKind::Overloaded]),
            },
        }
    }

    /// Defaults for `kind` with any configured values applied on top.
    pub fn from_config(kind: SourceKind, config: Option<&PacingConfig>) -> Self {
        let mut pacing = Self::defaults_for(kind);
        let Some(cfg) = config else { return pacing };

        if let Some(permits) = cfg.permits {
            pacing.permits = permits;
        }
        if let Some(window) = cfg.window_seconds.and_then(seconds) {
            pacing.window = window;
        }
        if let Some(pause) = cfg.pause_seconds.and_then(seconds) {
            pacing.pause = pause;
        }
        if cfg.max_attempts.is_some() || cfg.backoff_base_seconds.is_some() || cfg.backoff_cap_seconds.is_some() {
            let defaults = Self::defaults_for(kind).retry;
            let base = cfg
                .backoff_base_seconds
                .and_then(seconds)
                .unwrap_or_else(|| defaults.delay_after(1));
            let cap = cfg
                .backoff_cap_seconds
                .and_then(seconds)
                .unwrap_or_else(|| defaults.delay_after(u32::MAX));
            pacing.retry = RetryPolicy::new(cfg.max_attempts.unwrap_or(defaults.max_attempts()), base, cap)
                .retry_on(&[ErrorKind::Overloaded]);
        }
        pacing
    }
}

/// Negative, NaN and out-of-range values are ignored.
fn seconds(value: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(value).ok()
}

/// Drives one source across a topic batch.
///
/// Topics run strictly one at a time. Every failure, including failing to
/// open the batch session, becomes a placeholder; `collect` never errors.
pub struct SourceCollector {
    source: Arc<dyn Source>,
    limiter: RateLimiter,
    retry: RetryPolicy,
    pause: Duration,
}

impl SourceCollector {
    pub fn new(source: Arc<dyn Source>, pacing: SourcePacing) -> Self {
        Self {
            source,
            limiter: RateLimiter::new(pacing.permits, pacing.window),
            retry: pacing.retry,
            pause: pacing.pause,
        }
    }

    pub fn kind(&self) -> SourceKind {
        self.source.kind()
    }

    pub async fn collect(&mut self, topics: &[String]) -> TopicResult {
        let kind = self.source.kind();
        let batch_start = Instant::now();
        info!(source = %kind, topics = topics.len(), "starting collection");

        let adapter = match self.source.open().await {
            Ok(adapter) => adapter,
            Err(e) => {
                error!(source = %kind, error = %e, "source unavailable for whole batch");
                return TopicResult::unavailable(kind, topics);
            }
        };

        let mut result = TopicResult::new();
        for (idx, topic) in topics.iter().enumerate() {
            if idx > 0 && !self.pause.is_zero() {
                tokio::time::sleep(self.pause).await;
            }

            let topic_start = Instant::now();
            info!(source = %kind, "processing topic {}/{}: '{}'", idx + 1, topics.len(), topic);

            self.limiter.acquire().await;
            let (outcome, attempts) = self
                .retry
                .run_counted(|| adapter.fetch_and_summarize(topic))
                .await;

            let summary = match outcome {
                Ok(text) => {
                    info!(source = %kind, %topic, attempts, chars = text.len(), "topic collected");
                    TopicSummary::Available(text)
                }
                Err(e) => {
                    warn!(source = %kind, %topic, attempts, error = %e, "topic unavailable, recording placeholder");
                    TopicSummary::Unavailable(kind.placeholder(topic))
                }
            };
            result.insert(topic.clone(), summary);
            info!(source = %kind, %topic, elapsed = ?topic_start.elapsed(), "topic completed");
        }

        info!(
            source = %kind,
            topics = topics.len(),
            elapsed = ?batch_start.elapsed(),
            "collection completed"
        );
        result
    }
}
