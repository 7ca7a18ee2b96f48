use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::collector::{SourceCollector, SourcePacing};
use crate::sources::{Source, SourceKind, SourceSelection, TopicResult};

/// Per-source results for one request, keyed in collection order.
pub type AggregatedBundle = BTreeMap<SourceKind, TopicResult>;

/// Runs the collectors a [`SourceSelection`] asks for.
///
/// Sources and their pacing are registered once; every `run` builds fresh
/// collectors so no limiter state leaks between requests.
pub struct Orchestrator {
    sources: BTreeMap<SourceKind, (Arc<dyn Source>, SourcePacing)>,
    concurrent: bool,
}

impl Orchestrator {
    pub fn new() -> Self {
        Self {
            sources: BTreeMap::new(),
            concurrent: false,
        }
    }

    pub fn with_source(mut self, source: Arc<dyn Source>, pacing: SourcePacing) -> Self {
        self.sources.insert(source.kind(), (source, pacing));
        self
    }

    /// Run the selected collectors side by side instead of one after another.
    pub fn with_concurrent_sources(mut self, concurrent: bool) -> Self {
        self.concurrent = concurrent;
        self
    }

    pub fn is_configured(&self, kind: SourceKind) -> bool {
        self.sources.contains_key(&kind)
    }

    fn collector(&self, kind: SourceKind) -> Option<SourceCollector> {
        self.sources
            .get(&kind)
            .map(|(source, pacing)| SourceCollector::new(source.clone(), pacing.clone()))
    }

    async fn collect_one(&self, kind: SourceKind, wanted: bool, topics: &[String]) -> Option<TopicResult> {
        if !wanted {
            return None;
        }
        match self.collector(kind) {
            Some(mut collector) => Some(collector.collect(topics).await),
            None => {
                warn!(source = %kind, "source selected but not configured, using placeholders");
                Some(TopicResult::unavailable(kind, topics))
            }
        }
    }

    pub async fn run(&self, topics: &[String], selection: SourceSelection) -> AggregatedBundle {
        let start = Instant::now();
        info!(?topics, %selection, concurrent = self.concurrent, "aggregating sources");

        let mut bundle = AggregatedBundle::new();
        if self.concurrent {
            let (news, forum, social) = tokio::join!(
                self.collect_one(SourceKind::News, selection.includes(SourceKind::News), topics),
                self.collect_one(SourceKind::Forum, selection.includes(SourceKind::Forum), topics),
                self.collect_one(SourceKind::Social, selection.includes(SourceKind::Social), topics),
            );
            for (kind, result) in [(SourceKind::News, news), (SourceKind::Forum, forum), (SourceKind::Social, social)] {
                if let Some(result) = result {
                    bundle.insert(kind, result);
                }
            }
        } else {
            for kind in selection.kinds() {
                if let Some(result) = self.collect_one(kind, true, topics).await {
                    bundle.insert(kind, result);
                }
            }
        }

        info!(sources = bundle.len(), elapsed = ?start.elapsed(), "aggregation completed");
        bundle
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}
