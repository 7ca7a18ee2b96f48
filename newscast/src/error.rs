//! Error taxonomy shared by every pipeline stage.
//!
//! Collaborators (LLM endpoints, fetchers, agent sessions, the narrator)
//! fail with [`UpstreamError`]. Each variant carries a fixed [`ErrorKind`]
//! so retry decisions are made on the tag, never on message text.
//! Failures that abort a request are [`PipelineError`].

use serde::Serialize;

/// Tag used by [`crate::retry::RetryPolicy`] to decide what is retryable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Overloaded,
    Fetch,
    Session,
    Model,
    Synthesis,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum UpstreamError {
    /// Rate-limited or overloaded upstream; the only transient class.
    #[error("upstream overloaded: {0}")]
    Overloaded(String),

    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("agent session failed: {0}")]
    Session(String),

    #[error("model call failed: {0}")]
    Model(String),

    #[error("speech synthesis failed: {0}")]
    Synthesis(String),
}

impl UpstreamError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            UpstreamError::Overloaded(_) => ErrorKind::Overloaded,
            UpstreamError::Fetch(_) => ErrorKind::Fetch,
            UpstreamError::Session(_) => ErrorKind::Session,
            UpstreamError::Model(_) => ErrorKind::Model,
            UpstreamError::Synthesis(_) => ErrorKind::Synthesis,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Missing credentials or a required setting.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("no source produced material for any topic")]
    NoMaterial,

    #[error("composition failed: {0}")]
    Composition(#[source] UpstreamError),

    #[error("translation failed: {0}")]
    Translation(#[source] UpstreamError),

    #[error("narration failed: {0}")]
    Narration(#[source] UpstreamError),
}
