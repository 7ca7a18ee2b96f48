/*!
common/src/lib.rs

Shared configuration types for Newscast.

This file provides:
- Config data structures (deserialized from TOML)
- An async loader merging a default file with an optional override file
*/

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Remote LLM endpoint (OpenAI-compatible chat completions)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteLlmConfig {
    pub api_url: Option<String>,
    pub api_key_env: Option<String>,
    pub model: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub max_tokens: Option<usize>,
    pub temperature: Option<f32>,
}

/// Which pipeline step an LLM endpoint serves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmTask {
    /// Per-topic reduction of raw news headlines
    Summarization,
    /// Merging all per-topic material into one script
    Composition,
    Translation,
    /// Tool-calling sessions used by the forum and social sources
    Agent,
}

/// LLM top-level config: one fallback endpoint plus optional per-task overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmConfig {
    // Fallback: single remote config
    pub remote: Option<RemoteLlmConfig>,
    // Task-specific configs
    pub summarization: Option<RemoteLlmConfig>,
    pub composition: Option<RemoteLlmConfig>,
    pub translation: Option<RemoteLlmConfig>,
    pub agent: Option<RemoteLlmConfig>,
}

impl LlmConfig {
    /// Endpoint for `task`. Fields missing from the task-specific section are
    /// taken from `remote`.
    pub fn endpoint(&self, task: LlmTask) -> Option<RemoteLlmConfig> {
        let specific = match task {
            LlmTask::Summarization => self.summarization.as_ref(),
            LlmTask::Composition => self.composition.as_ref(),
            LlmTask::Translation => self.translation.as_ref(),
            LlmTask::Agent => self.agent.as_ref(),
        };
        match (specific, self.remote.as_ref()) {
            (Some(s), Some(r)) => Some(RemoteLlmConfig {
                api_url: s.api_url.clone().or_else(|| r.api_url.clone()),
                api_key_env: s.api_key_env.clone().or_else(|| r.api_key_env.clone()),
                model: s.model.clone().or_else(|| r.model.clone()),
                timeout_seconds: s.timeout_seconds.or(r.timeout_seconds),
                max_tokens: s.max_tokens.or(r.max_tokens),
                temperature: s.temperature.or(r.temperature),
            }),
            (specific, remote) => specific.or(remote).cloned(),
        }
    }
}

/// Rate limiting, retry and pause settings for one upstream source
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Calls allowed per window
    pub permits: Option<u32>,
    pub window_seconds: Option<f64>,
    /// Fixed pause after each topic
    pub pause_seconds: Option<f64>,
    pub max_attempts: Option<u32>,
    pub backoff_base_seconds: Option<f64>,
    pub backoff_cap_seconds: Option<f64>,
}

/// Structured news search source
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewsConfig {
    /// Search page; the encoded topic is appended as the `q` parameter
    pub search_url: Option<String>,
    /// Web-unlocker proxy API used as the primary fetch path
    pub unlocker_api_url: Option<String>,
    pub unlocker_api_key_env: Option<String>,
    pub unlocker_zone: Option<String>,
    /// User agent for the direct fallback fetch
    pub user_agent: Option<String>,
    pub fetch_timeout_seconds: Option<u64>,
    pub max_output_tokens: Option<usize>,
    pub pacing: Option<PacingConfig>,
}

/// Forum or social discussion source driven through an agent session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscussionConfig {
    pub lookback_hours: Option<u64>,
    pub max_output_tokens: Option<usize>,
    pub pacing: Option<PacingConfig>,
}

/// Speech synthesis endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TtsConfig {
    pub api_url: Option<String>,
    pub api_key_env: Option<String>,
    pub format: Option<String>,
    pub sample_rate: Option<f64>,
    pub style: Option<String>,
    pub timeout_seconds: Option<u64>,
    /// Language prefix ("hi", "es", ...) to voice id overrides
    #[serde(default)]
    pub voices: HashMap<String, String>,
}

/// Request-level pipeline behaviour
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Language the composer writes in; translation is skipped for it
    pub source_language: Option<String>,
    pub max_topics: Option<usize>,
    /// Run the selected source collectors concurrently instead of in order
    pub concurrent_sources: Option<bool>,
}

/// Top-level application configuration (deserialized from config.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub news: NewsConfig,
    #[serde(default)]
    pub forum: DiscussionConfig,
    #[serde(default)]
    pub social: DiscussionConfig,
    #[serde(default)]
    pub tts: TtsConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl Config {
    /// Load configuration from a TOML file asynchronously.
    ///
    /// Example:
    ///   let cfg = Config::from_file("config.toml").await?;
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = tokio::fs::read_to_string(path.as_ref())
            .await
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let cfg: Config = toml::from_str(&data).context("Failed to parse TOML configuration")?;
        Ok(cfg)
    }

    /// Load configuration with an optional default file and an optional override file.
    /// If both are present, they are merged (override takes precedence).
    pub async fn load_with_defaults(default_path: Option<&Path>, override_path: Option<&Path>) -> Result<Self> {
        let mut config_value = toml::Value::Table(toml::map::Map::new());

        for (label, path) in [("default", default_path), ("override", override_path)] {
            let Some(path) = path else { continue };
            if !path.exists() {
                continue;
            }
            let data = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read {} config: {}", label, path.display()))?;
            let val: toml::Value = toml::from_str(&data)
                .with_context(|| format!("Failed to parse {} configuration", label))?;
            merge_toml(&mut config_value, val);
        }

        let cfg: Config = config_value.try_into().context("Failed to parse merged configuration")?;
        Ok(cfg)
    }
}

fn merge_toml(a: &mut toml::Value, b: toml::Value) {
    match (a, b) {
        (toml::Value::Table(a_map), toml::Value::Table(b_map)) => {
            for (k, v) in b_map {
                if let Some(a_val) = a_map.get_mut(&k) {
                    merge_toml(a_val, v);
                } else {
                    a_map.insert(k, v);
                }
            }
        }
        (a_val, b_val) => *a_val = b_val,
    }
}
