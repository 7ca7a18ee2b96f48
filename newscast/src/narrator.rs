//! Speech synthesis: voice choice and the remote TTS collaborator.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::UpstreamError;
use crate::translator::primary_subtag;

/// Voice used when a language has no entry.
pub const FALLBACK_VOICE: &str = "en-US-natalie";

const DEFAULT_VOICES: [(&str, &str); 11] = [
    ("en", "wayne"),
    ("hi", "shweta"),
    ("es", "valeria"),
    ("fr", "victor"),
    ("de", "max"),
    ("it", "vera"),
    ("ja", "kei"),
    ("ko", "seo-yun"),
    ("pt", "pedro"),
    ("ru", "sofia"),
    ("zh", "xing"),
];

/// Renders text to audio bytes.
#[async_trait]
pub trait Narrator: Send + Sync {
    async fn synthesize(&self, text: &str, voice: &str, locale: &str) -> Result<Vec<u8>, UpstreamError>;
}

/// Language → voice id table.
#[derive(Debug, Clone)]
pub struct VoiceBook {
    voices: HashMap<String, String>,
}

impl VoiceBook {
    pub fn new() -> Self {
        Self {
            voices: DEFAULT_VOICES
                .iter()
                .map(|(lang, voice)| (lang.to_string(), voice.to_string()))
                .collect(),
        }
    }

    /// Overrides keyed by language; keys are reduced to their primary subtag.
    pub fn with_overrides(mut self, overrides: &HashMap<String, String>) -> Self {
        for (lang, voice) in overrides {
            self.voices.insert(primary_subtag(lang), voice.clone());
        }
        self
    }

    pub fn voice_for(&self, language: &str) -> &str {
        self.voices
            .get(&primary_subtag(language))
            .map(String::as_str)
            .unwrap_or(FALLBACK_VOICE)
    }
}

impl Default for VoiceBook {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    text: &'a str,
    voice_id: &'a str,
    multi_native_locale: &'a str,
    format: &'a str,
    sample_rate: f64,
    channel_type: &'static str,
    pitch: i32,
    rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    style: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    audio_file: Option<String>,
    url: Option<String>,
}

/// HTTP text-to-speech service that answers with a link to the rendered file.
pub struct RemoteNarrator {
    api_url: String,
    api_key: String,
    format: String,
    sample_rate: f64,
    style: Option<String>,
    timeout: Duration,
    client: reqwest::Client,
}

impl RemoteNarrator {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
            format: "MP3".to_string(),
            sample_rate: 44100.0,
            style: None,
            timeout: Duration::from_secs(120),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    pub fn with_sample_rate(mut self, sample_rate: f64) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout = Duration::from_secs(timeout_secs);
        self
    }

    async fn request_audio_url(&self, text: &str, voice: &str, locale: &str) -> Result<String, UpstreamError> {
        let body = GenerateRequest {
            text,
            voice_id: voice,
            multi_native_locale: locale,
            format: &self.format,
            sample_rate: self.sample_rate,
            channel_type: "STEREO",
            pitch: 0,
            rate: 1.0,
            style: self.style.as_deref(),
        };

        let response = self
            .client
            .post(&self.api_url)
            .timeout(self.timeout)
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| UpstreamError::Synthesis(format!("TTS request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = format!("TTS API error {}: {}", status, body);
            return Err(if status == StatusCode::TOO_MANY_REQUESTS {
                UpstreamError::Overloaded(message)
            } else {
                UpstreamError::Synthesis(message)
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| UpstreamError::Synthesis(format!("Failed to parse TTS response: {}", e)))?;

        parsed
            .audio_file
            .or(parsed.url)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| UpstreamError::Synthesis("TTS response missing audio URL".to_string()))
    }
}

#[async_trait]
impl Narrator for RemoteNarrator {
    async fn synthesize(&self, text: &str, voice: &str, locale: &str) -> Result<Vec<u8>, UpstreamError> {
        debug!(%voice, %locale, chars = text.len(), "requesting speech synthesis");
        let audio_url = self.request_audio_url(text, voice, locale).await?;

        let response = self
            .client
            .get(&audio_url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| UpstreamError::Synthesis(format!("audio download failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Synthesis(format!(
                "audio download returned status {}",
                status
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::Synthesis(format!("failed to read audio body: {}", e)))?;
        info!(%voice, bytes = bytes.len(), "audio downloaded");
        Ok(bytes.to_vec())
    }
}
