use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{PipelineError, UpstreamError};
use crate::llm::{LlmProvider, LlmRequest};
use crate::orchestrator::AggregatedBundle;
use crate::sources::SourceKind;

/// Separator placed between topic blocks in the prompt.
pub const TOPIC_SEPARATOR: &str = "--- NEW TOPIC ---";

const BROADCAST_INSTRUCTIONS: &str = "You are a professional broadcast news writer. Generate \
natural, speech-ready news reports from the material provided for each topic.

Structure each topic by the material available:
1. Official news: \"According to official reports...\" followed by the summary
2. Forum discussions: \"Online discussions reveal...\" followed by the summary
3. Social media: \"On social media, trending conversations show...\" followed by the summary
4. When several are present, present the news first and the public reactions after it

Formatting rules:
- Start directly with the content, no introductions
- Keep each topic between 60 and 120 seconds when read aloud
- Use natural spoken transitions such as \"Meanwhile, on social media...\"
- Include one or two short quotes from discussions when available
- Keep a neutral tone while highlighting the key sentiments
- Close each topic with a short wrap-up sentence
- Never output topic separators or section markers

Write full paragraphs suited to speech synthesis. Do not use markdown.";

fn content_label(kind: SourceKind) -> &'static str {
    match kind {
        SourceKind::News => "OFFICIAL NEWS CONTENT",
        SourceKind::Forum => "FORUM DISCUSSION CONTENT",
        SourceKind::Social => "SOCIAL MEDIA CONTENT",
    }
}

/// Merges every topic's material into one broadcast script with a single
/// model call.
pub struct Composer {
    provider: Arc<dyn LlmProvider>,
    max_tokens: usize,
    temperature: f32,
}

impl Composer {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            max_tokens: 4000,
            temperature: 0.3,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// User prompt for `topics`, or `None` when no topic has any material.
    ///
    /// Material is ordered news, forum, social within each topic; topics keep
    /// request order and topics without material are left out.
    pub fn build_prompt(bundle: &AggregatedBundle, topics: &[String]) -> Option<String> {
        let mut blocks = Vec::new();
        for topic in topics {
            let sections: Vec<String> = SourceKind::ALL
                .iter()
                .filter_map(|kind| {
                    let text = bundle.get(kind)?.get(topic)?.text().trim();
                    (!text.is_empty()).then(|| format!("{}:\n{}", content_label(*kind), text))
                })
                .collect();

            if sections.is_empty() {
                warn!(%topic, "no material for topic, leaving it out of the broadcast");
                continue;
            }
            blocks.push(format!("TOPIC: {}\n\n{}", topic, sections.join("\n\n")));
        }

        if blocks.is_empty() {
            return None;
        }
        let separator = format!("\n\n{}\n\n", TOPIC_SEPARATOR);
        Some(format!(
            "Create broadcast segments for these topics using the available sources:\n\n{}",
            blocks.join(&separator)
        ))
    }

    pub async fn compose(&self, bundle: &AggregatedBundle, topics: &[String]) -> Result<String, PipelineError> {
        let prompt = Self::build_prompt(bundle, topics).ok_or(PipelineError::NoMaterial)?;
        info!(topics = topics.len(), prompt_chars = prompt.len(), "composing broadcast script");

        let request = LlmRequest::new(prompt)
            .with_system(BROADCAST_INSTRUCTIONS)
            .with_max_tokens(self.max_tokens)
            .with_temperature(self.temperature);

        let response = self
            .provider
            .generate(request)
            .await
            .map_err(PipelineError::Composition)?;

        let script = strip_separators(&response.content);
        if script.is_empty() {
            return Err(PipelineError::Composition(UpstreamError::Model(
                "model returned an empty script".to_string(),
            )));
        }
        info!(chars = script.len(), model = %response.model, "broadcast script generated");
        Ok(script)
    }
}

/// Drop separator lines the model may have echoed back.
fn strip_separators(text: &str) -> String {
    let kept: Vec<&str> = text
        .lines()
        .filter(|line| line.trim() != TOPIC_SEPARATOR)
        .collect();
    kept.join("\n").replace(TOPIC_SEPARATOR, "").trim().to_string()
}
