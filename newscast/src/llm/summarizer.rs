// Summarizer module
use tracing::info;

use super::{LlmProvider, LlmRequest};
use crate::error::UpstreamError;

/// Raw material beyond this many characters is cut before it reaches the model.
pub const MAX_INPUT_CHARS: usize = 12_000;

/// Reduce `text` to a spoken-style summary following `instructions`.
///
/// The instructions travel as the system message and the material as the
/// user prompt. An empty completion counts as a model failure.
pub async fn summarize<P: LlmProvider + ?Sized>(
    provider: &P,
    text: &str,
    instructions: &str,
    max_tokens: usize,
) -> Result<String, UpstreamError> {
    let material = truncate(text, MAX_INPUT_CHARS);
    let request = LlmRequest::new(material)
        .with_system(instructions)
        .with_max_tokens(max_tokens)
        .with_temperature(0.4);

    let response = provider.generate(request).await?;
    let summary = response.content.trim();
    if summary.is_empty() {
        return Err(UpstreamError::Model("model returned an empty summary".to_string()));
    }

    info!(
        "LLM summarization successful: {} chars, {} tokens",
        summary.len(),
        response.usage.total_tokens
    );
    Ok(summary.to_string())
}

/// Cut `s` to at most `max_chars` characters, marking the cut with "...".
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
