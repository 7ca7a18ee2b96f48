use std::sync::Arc;
use tracing::info;

use crate::error::{PipelineError, UpstreamError};
use crate::llm::{LlmProvider, LlmRequest};

/// Primary subtag of a BCP 47 style tag: `"en-US"` → `"en"`.
pub fn primary_subtag(tag: &str) -> String {
    tag.trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}

/// Optional post-pass rendering the script in the listener's language.
pub struct Translator {
    provider: Arc<dyn LlmProvider>,
    source_language: String,
}

impl Translator {
    /// Scripts are assumed to be composed in `en-US`.
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            source_language: "en-US".to_string(),
        }
    }

    pub fn with_source_language(mut self, language: impl Into<String>) -> Self {
        self.source_language = language.into();
        self
    }

    /// True when `target` names the language the script is already in.
    pub fn is_identity(&self, target: &str) -> bool {
        primary_subtag(target) == primary_subtag(&self.source_language)
    }

    pub async fn translate(&self, script: &str, target: &str) -> Result<String, PipelineError> {
        if self.is_identity(target) {
            return Ok(script.to_string());
        }

        info!(from = %self.source_language, to = %target, chars = script.len(), "translating script");
        let prompt = format!(
            "Translate the following broadcast news script to {}. Maintain paragraph structure, \
             formal broadcast tone, no extra commentary.\n\n{}",
            target, script
        );

        let response = self
            .provider
            .generate(LlmRequest::new(prompt))
            .await
            .map_err(PipelineError::Translation)?;

        let translated = response.content.trim();
        if translated.is_empty() {
            return Err(PipelineError::Translation(UpstreamError::Model(
                "model returned an empty translation".to_string(),
            )));
        }
        Ok(translated.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::ScriptedLlm;

    #[test]
    fn test_primary_subtag() {
        assert_eq!(primary_subtag("en-US"), "en");
        assert_eq!(primary_subtag("hi_IN"), "hi");
        assert_eq!(primary_subtag(" FR "), "fr");
        assert_eq!(primary_subtag(""), "");
    }

    #[tokio::test]
    async fn test_english_targets_are_identity() {
        let llm = Arc::new(ScriptedLlm::replying("unused"));
        let translator = Translator::new(llm.clone());

        for target in ["en-US", "en-GB", "en"] {
            assert_eq!(translator.translate("Good evening.", target).await.unwrap(), "Good evening.");
        }
        assert!(llm.requests().is_empty());
    }

    #[tokio::test]
    async fn test_other_language_makes_one_call() {
        let llm = Arc::new(ScriptedLlm::replying("  नमस्ते।  \n"));
        let translator = Translator::new(llm.clone());

        let translated = translator.translate("Hello.", "hi-IN").await.unwrap();

        assert_eq!(translated, "नमस्ते।");
        let requests = llm.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].prompt.contains("to hi-IN"));
        assert!(requests[0].prompt.ends_with("Hello."));
    }

    #[tokio::test]
    async fn test_source_language_is_configurable() {
        let llm = Arc::new(ScriptedLlm::replying("Good evening."));
        let translator = Translator::new(llm.clone()).with_source_language("fr-FR");

        assert_eq!(translator.translate("Bonsoir.", "fr-CA").await.unwrap(), "Bonsoir.");
        assert_eq!(translator.translate("Bonsoir.", "en-US").await.unwrap(), "Good evening.");
        assert_eq!(llm.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_failure_is_fatal() {
        let llm = Arc::new(ScriptedLlm::failing(UpstreamError::Model("quota".into())));
        let err = Translator::new(llm).translate("Hello.", "es-ES").await.unwrap_err();
        assert!(matches!(err, PipelineError::Translation(_)));
    }
}
