//! Upstream sources and the per-topic results they produce.
//!
//! A [`Source`] opens one batch-scoped [`SourceAdapter`] per collection run.
//! For news the adapter is stateless; forum and social adapters hold the
//! agent session opened for the whole topic batch.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::UpstreamError;

pub mod discussion;
pub mod fetch;
pub mod news;

pub use discussion::{AgentConnector, AgentSession, DiscussionProfile, DiscussionSource, LlmAgentConnector};
pub use fetch::{DirectFetcher, PageFetcher, UnlockerFetcher};
pub use news::NewsAdapter;

/// One upstream channel of material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    News,
    Forum,
    Social,
}

impl SourceKind {
    pub const ALL: [SourceKind; 3] = [SourceKind::News, SourceKind::Forum, SourceKind::Social];

    pub fn label(&self) -> &'static str {
        match self {
            SourceKind::News => "news",
            SourceKind::Forum => "forum",
            SourceKind::Social => "social",
        }
    }

    /// Deterministic stand-in recorded when this source fails for `topic`.
    pub fn placeholder(&self, topic: &str) -> String {
        match self {
            SourceKind::News => {
                format!("We couldn't retrieve the latest news about {} at this time.", topic)
            }
            SourceKind::Forum => {
                format!("Reddit discussions about {} are currently unavailable.", topic)
            }
            SourceKind::Social => {
                format!("Twitter discussions about {} are currently unavailable.", topic)
            }
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which collectors a request runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceSelection {
    #[serde(rename = "news")]
    News,
    #[serde(rename = "forum", alias = "reddit")]
    Forum,
    #[serde(rename = "social", alias = "twitter")]
    Social,
    #[serde(rename = "both", alias = "news+forum")]
    NewsAndForum,
    #[serde(rename = "all")]
    All,
}

impl SourceSelection {
    pub fn includes(&self, kind: SourceKind) -> bool {
        use SourceSelection::*;
        match kind {
            SourceKind::News => matches!(self, News | NewsAndForum | All),
            SourceKind::Forum => matches!(self, Forum | NewsAndForum | All),
            SourceKind::Social => matches!(self, Social | All),
        }
    }

    /// Selected kinds in collection order.
    pub fn kinds(&self) -> Vec<SourceKind> {
        SourceKind::ALL
            .into_iter()
            .filter(|k| self.includes(*k))
            .collect()
    }
}

impl FromStr for SourceSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "news" => Ok(SourceSelection::News),
            "forum" | "reddit" => Ok(SourceSelection::Forum),
            "social" | "twitter" => Ok(SourceSelection::Social),
            "both" | "news+forum" => Ok(SourceSelection::NewsAndForum),
            "all" => Ok(SourceSelection::All),
            other => Err(format!(
                "unknown source selection '{}' (expected news, forum, social, both or all)",
                other
            )),
        }
    }
}

impl fmt::Display for SourceSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SourceSelection::News => "news",
            SourceSelection::Forum => "forum",
            SourceSelection::Social => "social",
            SourceSelection::NewsAndForum => "both",
            SourceSelection::All => "all",
        };
        f.write_str(s)
    }
}

/// Summary text for one topic from one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicSummary {
    Available(String),
    /// Explicit placeholder left by a failed fetch or session.
    Unavailable(String),
}

impl TopicSummary {
    pub fn text(&self) -> &str {
        match self {
            TopicSummary::Available(s) | TopicSummary::Unavailable(s) => s,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, TopicSummary::Available(_))
    }
}

/// Topic → summary for one source, in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicResult {
    entries: Vec<(String, TopicSummary)>,
}

impl TopicResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every topic mapped to `kind`'s placeholder.
    pub fn unavailable(kind: SourceKind, topics: &[String]) -> Self {
        let mut result = Self::new();
        for topic in topics {
            result.insert(topic.clone(), TopicSummary::Unavailable(kind.placeholder(topic)));
        }
        result
    }

    /// Insert or replace the summary for `topic`.
    pub fn insert(&mut self, topic: String, summary: TopicSummary) {
        match self.entries.iter_mut().find(|(t, _)| *t == topic) {
            Some(entry) => entry.1 = summary,
            None => self.entries.push((topic, summary)),
        }
    }

    pub fn get(&self, topic: &str) -> Option<&TopicSummary> {
        self.entries.iter().find(|(t, _)| t == topic).map(|(_, s)| s)
    }

    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(t, _)| t.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TopicSummary)> {
        self.entries.iter().map(|(t, s)| (t.as_str(), s))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when the key set equals `topics` exactly.
    pub fn covers_exactly(&self, topics: &[String]) -> bool {
        self.len() == topics.len() && topics.iter().all(|t| self.get(t).is_some())
    }
}

/// Batch-scoped adapter: fetches raw material for one topic and reduces it.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    async fn fetch_and_summarize(&self, topic: &str) -> Result<String, UpstreamError>;
}

/// Opens an adapter for one collection run over a topic batch.
#[async_trait]
pub trait Source: Send + Sync {
    fn kind(&self) -> SourceKind;

    async fn open(&self) -> Result<Box<dyn SourceAdapter>, UpstreamError>;
}
