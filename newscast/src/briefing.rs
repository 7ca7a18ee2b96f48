//! End-to-end request flow: aggregate, compose, translate, narrate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};
use uuid::Uuid;

use crate::composer::Composer;
use crate::error::{PipelineError, UpstreamError};
use crate::narrator::{Narrator, VoiceBook};
use crate::orchestrator::{AggregatedBundle, Orchestrator};
use crate::sources::{SourceKind, SourceSelection};
use crate::translator::Translator;

pub const DEFAULT_MAX_TOPICS: usize = 3;

fn default_language() -> String {
    "en-US".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BriefingRequest {
    pub topics: Vec<String>,
    pub source_selection: SourceSelection,
    #[serde(default = "default_language")]
    pub language: String,
}

impl BriefingRequest {
    pub fn new(topics: Vec<String>, source_selection: SourceSelection) -> Self {
        Self {
            topics,
            source_selection,
            language: default_language(),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Trimmed topics in request order, or why they are unacceptable.
    pub fn validated_topics(&self, max_topics: usize) -> Result<Vec<String>, PipelineError> {
        if self.topics.is_empty() {
            return Err(PipelineError::InvalidRequest("at least one topic is required".to_string()));
        }
        if self.topics.len() > max_topics {
            return Err(PipelineError::InvalidRequest(format!(
                "at most {} topics are allowed, got {}",
                max_topics,
                self.topics.len()
            )));
        }

        let mut seen = HashSet::new();
        let mut topics = Vec::with_capacity(self.topics.len());
        for raw in &self.topics {
            let topic = raw.trim();
            if topic.is_empty() {
                return Err(PipelineError::InvalidRequest("topics must not be blank".to_string()));
            }
            if !seen.insert(topic.to_lowercase()) {
                return Err(PipelineError::InvalidRequest(format!("duplicate topic '{}'", topic)));
            }
            topics.push(topic.to_string());
        }
        Ok(topics)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Coverage {
    Available,
    Unavailable,
}

/// Wall-clock seconds spent in each stage.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StageTimings {
    pub aggregation: f64,
    pub composition: f64,
    pub translation: f64,
    pub narration: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BriefingMetadata {
    pub request_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub topics: Vec<String>,
    pub sources: SourceSelection,
    pub language: String,
    pub voice: String,
    /// Total seconds for the request.
    pub processing_time: f64,
    pub stages: StageTimings,
    /// topic → source → whether real material was collected
    pub coverage: BTreeMap<String, BTreeMap<SourceKind, Coverage>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BriefingResponse {
    pub script_text: String,
    #[serde(skip)]
    pub audio: Vec<u8>,
    pub metadata: BriefingMetadata,
}

fn coverage_of(bundle: &AggregatedBundle, topics: &[String]) -> BTreeMap<String, BTreeMap<SourceKind, Coverage>> {
    topics
        .iter()
        .map(|topic| {
            let per_source = bundle
                .iter()
                .map(|(kind, result)| {
                    let status = match result.get(topic) {
                        Some(summary) if summary.is_available() => Coverage::Available,
                        _ => Coverage::Unavailable,
                    };
                    (*kind, status)
                })
                .collect();
            (topic.clone(), per_source)
        })
        .collect()
}

/// The assembled pipeline. Collaborators are built once and shared across
/// requests; per-request state lives inside [`Briefing::generate`].
pub struct Briefing {
    orchestrator: Orchestrator,
    composer: Composer,
    translator: Translator,
    narrator: Arc<dyn Narrator>,
    voices: VoiceBook,
    max_topics: usize,
}

impl Briefing {
    pub fn new(
        orchestrator: Orchestrator,
        composer: Composer,
        translator: Translator,
        narrator: Arc<dyn Narrator>,
    ) -> Self {
        Self {
            orchestrator,
            composer,
            translator,
            narrator,
            voices: VoiceBook::new(),
            max_topics: DEFAULT_MAX_TOPICS,
        }
    }

    pub fn with_voices(mut self, voices: VoiceBook) -> Self {
        self.voices = voices;
        self
    }

    pub fn with_max_topics(mut self, max_topics: usize) -> Self {
        self.max_topics = max_topics.max(1);
        self
    }

    pub async fn generate(&self, request: &BriefingRequest) -> Result<BriefingResponse, PipelineError> {
        let request_id = Uuid::new_v4();
        let started = Instant::now();
        let topics = self.validated(request)?;
        info!(%request_id, ?topics, sources = %request.source_selection, language = %request.language, "briefing requested");

        let mut stages = StageTimings::default();

        let stage = Instant::now();
        let bundle = self.orchestrator.run(&topics, request.source_selection).await;
        stages.aggregation = stage.elapsed().as_secs_f64();

        let stage = Instant::now();
        let script = self.composer.compose(&bundle, &topics).await.map_err(|e| {
            error!(%request_id, error = %e, "composition failed");
            e
        })?;
        stages.composition = stage.elapsed().as_secs_f64();

        let stage = Instant::now();
        let script = self.translator.translate(&script, &request.language).await.map_err(|e| {
            error!(%request_id, error = %e, "translation failed");
            e
        })?;
        stages.translation = stage.elapsed().as_secs_f64();

        let voice = self.voices.voice_for(&request.language).to_string();
        let stage = Instant::now();
        let audio = self
            .narrator
            .synthesize(&script, &voice, &request.language)
            .await
            .map_err(PipelineError::Narration)?;
        if audio.is_empty() {
            return Err(PipelineError::Narration(UpstreamError::Synthesis(
                "narrator returned no audio".to_string(),
            )));
        }
        stages.narration = stage.elapsed().as_secs_f64();

        let processing_time = started.elapsed().as_secs_f64();
        info!(
            %request_id,
            processing_time,
            script_chars = script.len(),
            audio_bytes = audio.len(),
            "briefing generated"
        );

        Ok(BriefingResponse {
            script_text: script,
            audio,
            metadata: BriefingMetadata {
                request_id,
                generated_at: Utc::now(),
                coverage: coverage_of(&bundle, &topics),
                topics,
                sources: request.source_selection,
                language: request.language.clone(),
                voice,
                processing_time,
                stages,
            },
        })
    }

    fn validated(&self, request: &BriefingRequest) -> Result<Vec<String>, PipelineError> {
        if request.language.trim().is_empty() {
            return Err(PipelineError::InvalidRequest("language must not be blank".to_string()));
        }
        request.validated_topics(self.max_topics)
    }
}
