//! Forum and social sources, driven through a tool-calling agent session.
//!
//! Both variants share [`DiscussionSource`]; they differ only in their
//! [`DiscussionProfile`] (prompts, lookback window, output budget).

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::info;

use super::{Source, SourceAdapter, SourceKind};
use crate::error::UpstreamError;
use crate::llm::{LlmProvider, LlmRequest};

/// A stateful agent session scoped to one topic batch.
#[async_trait]
pub trait AgentSession: Send + Sync {
    /// Fails with `Overloaded` when the service is saturated and with
    /// `Session` for anything else.
    async fn run(&self, system_prompt: &str, user_prompt: &str) -> Result<String, UpstreamError>;
}

/// Opens agent sessions.
#[async_trait]
pub trait AgentConnector: Send + Sync {
    async fn open(&self, profile: &DiscussionProfile) -> Result<Box<dyn AgentSession>, UpstreamError>;
}

/// Per-variant settings for a discussion source.
#[derive(Debug, Clone)]
pub struct DiscussionProfile {
    pub kind: SourceKind,
    /// How far back material may come from; sent to the upstream query.
    pub lookback: Duration,
    pub max_output_tokens: usize,
}

impl DiscussionProfile {
    /// Forum threads from the last 14 days.
    pub fn forum() -> Self {
        Self {
            kind: SourceKind::Forum,
            lookback: Duration::days(14),
            max_output_tokens: 2000,
        }
    }

    /// Social posts from the last 48 hours.
    pub fn social() -> Self {
        Self {
            kind: SourceKind::Social,
            lookback: Duration::hours(48),
            max_output_tokens: 1500,
        }
    }

    pub fn with_lookback_hours(mut self, hours: u64) -> Self {
        self.lookback = Duration::hours(hours.min(i32::MAX as u64) as i64);
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: usize) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    pub fn system_prompt(&self, now: DateTime<Utc>) -> String {
        let cutoff = now - self.lookback;
        match self.kind {
            SourceKind::Social => format!(
                "You are a social media analysis expert. Use the available tools to:\n\
                 1. Find trending posts about the given topic from the last {} hours (after {}), nothing older\n\
                 2. Analyze post content, engagement and sentiment\n\
                 3. Identify key voices and viral discussions\n\
                 4. Summarize the conversation and its overall sentiment",
                self.lookback.num_hours(),
                cutoff.format("%Y-%m-%d %H:%M UTC")
            ),
            _ => format!(
                "You are a discussion forum analysis expert. Use the available tools to:\n\
                 1. Find the top 2 posts about the given topic published after {}, strictly nothing before that date\n\
                 2. Analyze their content and sentiment\n\
                 3. Summarize the discussions and the overall sentiment",
                cutoff.format("%Y-%m-%d")
            ),
        }
    }

    pub fn user_prompt(&self, topic: &str) -> String {
        match self.kind {
            SourceKind::Social => format!(
                "Analyze social media posts about '{}'. Summarize the top trending posts and their \
                 key messages, engagement levels, sentiment (positive/negative/neutral), notable \
                 hashtags, and the overall narrative. Quote interesting posts without naming users.",
                topic
            ),
            _ => format!(
                "Analyze forum posts about '{}'. Summarize the main discussion points, key opinions, \
                 notable trends, and the overall sentiment (positive/neutral/negative). Quote \
                 interesting comments without naming users.",
                topic
            ),
        }
    }
}

/// Source whose adapter holds one agent session for the whole batch.
pub struct DiscussionSource {
    connector: Arc<dyn AgentConnector>,
    profile: DiscussionProfile,
}

impl DiscussionSource {
    pub fn new(connector: Arc<dyn AgentConnector>, profile: DiscussionProfile) -> Self {
        Self { connector, profile }
    }

    pub fn profile(&self) -> &DiscussionProfile {
        &self.profile
    }
}

#[async_trait]
impl Source for DiscussionSource {
    fn kind(&self) -> SourceKind {
        self.profile.kind
    }

    async fn open(&self) -> Result<Box<dyn SourceAdapter>, UpstreamError> {
        info!(source = %self.profile.kind, "opening agent session");
        let session = self.connector.open(&self.profile).await?;
        Ok(Box::new(DiscussionAdapter {
            session,
            profile: self.profile.clone(),
        }))
    }
}

struct DiscussionAdapter {
    session: Box<dyn AgentSession>,
    profile: DiscussionProfile,
}

#[async_trait]
impl SourceAdapter for DiscussionAdapter {
    async fn fetch_and_summarize(&self, topic: &str) -> Result<String, UpstreamError> {
        let system = self.profile.system_prompt(Utc::now());
        let user = self.profile.user_prompt(topic);
        let analysis = self.session.run(&system, &user).await?;
        info!(source = %self.profile.kind, %topic, chars = analysis.len(), "agent analysis completed");
        Ok(analysis)
    }
}

/// Agent sessions backed directly by an LLM endpoint.
pub struct LlmAgentConnector {
    provider: Arc<dyn LlmProvider>,
    temperature: f32,
}

impl LlmAgentConnector {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            temperature: 0.7,
        }
    }
}

#[async_trait]
impl AgentConnector for LlmAgentConnector {
    async fn open(&self, profile: &DiscussionProfile) -> Result<Box<dyn AgentSession>, UpstreamError> {
        Ok(Box::new(LlmAgentSession {
            provider: self.provider.clone(),
            max_tokens: profile.max_output_tokens,
            temperature: self.temperature,
        }))
    }
}

struct LlmAgentSession {
    provider: Arc<dyn LlmProvider>,
    max_tokens: usize,
    temperature: f32,
}

#[async_trait]
impl AgentSession for LlmAgentSession {
    async fn run(&self, system_prompt: &str, user_prompt: &str) -> Result<String, UpstreamError> {
        let request = LlmRequest::new(user_prompt)
            .with_system(system_prompt)
            .with_max_tokens(self.max_tokens)
            .with_temperature(self.temperature);

        let response = self.provider.generate(request).await.map_err(|e| match e {
            UpstreamError::Overloaded(msg) => UpstreamError::Overloaded(msg),
            other => UpstreamError::Session(other.to_string()),
        })?;

        let content = response.content.trim();
        if content.is_empty() {
            return Err(UpstreamError::Session("agent returned an empty analysis".to_string()));
        }
        Ok(content.to_string())
    }
}
