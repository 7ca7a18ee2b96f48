use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use super::fetch::PageFetcher;
use super::{Source, SourceAdapter, SourceKind};
use crate::error::UpstreamError;
use crate::llm::summarizer::summarize;
use crate::llm::LlmProvider;
use crate::scraping::{clean_html_to_text, extract_headlines, news_search_url};

const NEWS_SCRIPT_INSTRUCTIONS: &str = "You are a news editor and scriptwriter for a spoken news \
bulletin. Turn the headlines you are given into a clean, professional script that will be read \
aloud by a text-to-speech engine. Use no special characters, emojis, markdown or preamble. Write \
full, formal, broadcast-style paragraphs, focus on the most important headlines and start \
directly with the script.";

/// Search-page news source: fetch, extract headlines, summarize.
#[derive(Clone)]
pub struct NewsAdapter {
    search_url: String,
    primary: Arc<dyn PageFetcher>,
    fallback: Option<Arc<dyn PageFetcher>>,
    llm: Arc<dyn LlmProvider>,
    max_output_tokens: usize,
}

impl NewsAdapter {
    pub fn new(
        search_url: impl Into<String>,
        primary: Arc<dyn PageFetcher>,
        llm: Arc<dyn LlmProvider>,
    ) -> Self {
        Self {
            search_url: search_url.into(),
            primary,
            fallback: None,
            llm,
            max_output_tokens: 1000,
        }
    }

    /// Fetcher tried when the primary one fails.
    pub fn with_fallback(mut self, fallback: Arc<dyn PageFetcher>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: usize) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    async fn fetch_page(&self, url: &str) -> Result<String, UpstreamError> {
        match self.primary.fetch(url).await {
            Ok(html) => Ok(html),
            Err(e) => match &self.fallback {
                Some(fallback) => {
                    warn!(
                        fetcher = self.primary.name(),
                        error = %e,
                        "news: primary fetch failed, using {} fetch",
                        fallback.name()
                    );
                    fallback.fetch(url).await
                }
                None => Err(e),
            },
        }
    }
}

#[async_trait]
impl SourceAdapter for NewsAdapter {
    async fn fetch_and_summarize(&self, topic: &str) -> Result<String, UpstreamError> {
        let url = news_search_url(&self.search_url, topic)
            .map_err(|e| UpstreamError::Fetch(format!("invalid search url '{}': {}", self.search_url, e)))?;

        let html = self.fetch_page(url.as_str()).await?;
        let text = clean_html_to_text(&html);
        let mut headlines = extract_headlines(&text);
        info!(%topic, text_chars = text.len(), headline_chars = headlines.len(), "news: page cleaned");

        if headlines.trim().is_empty() {
            warn!(%topic, "news: no headlines found, using generic stand-in");
            headlines = format!("Latest news about {}", topic);
        }

        summarize(
            self.llm.as_ref(),
            &headlines,
            NEWS_SCRIPT_INSTRUCTIONS,
            self.max_output_tokens,
        )
        .await
    }
}

#[async_trait]
impl Source for NewsAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::News
    }

    async fn open(&self) -> Result<Box<dyn SourceAdapter>, UpstreamError> {
        Ok(Box::new(self.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{ScriptedFetcher, ScriptedLlm};
    use crate::scraping::DEFAULT_SEARCH_URL;

    const SEARCH_PAGE: &str = "<html><body>\
        <div><a>Chip exports rise</a><span>Reuters</span><span>More</span></div>\
        <div><a>Fab opens in Ohio</a><span>More</span></div>\
        </body></html>";

    #[tokio::test]
    async fn test_headlines_are_summarized() {
        let fetcher = Arc::new(ScriptedFetcher::returning(SEARCH_PAGE));
        let llm = Arc::new(ScriptedLlm::replying("Chips are booming."));
        let adapter = NewsAdapter::new(DEFAULT_SEARCH_URL, fetcher.clone(), llm.clone());

        let summary = adapter.fetch_and_summarize("chips").await.expect("summary");

        assert_eq!(summary, "Chips are booming.");
        assert_eq!(fetcher.urls(), vec!["https://news.google.com/search?q=chips&tbs=sbd%3A1".to_string()]);
        assert_eq!(llm.requests()[0].prompt, "Chip exports rise\nFab opens in Ohio");
    }

    #[tokio::test]
    async fn test_fallback_fetcher_used_on_primary_failure() {
        let primary = Arc::new(ScriptedFetcher::failing(UpstreamError::Fetch("403".into())));
        let fallback = Arc::new(ScriptedFetcher::returning(SEARCH_PAGE));
        let llm = Arc::new(ScriptedLlm::replying("ok"));
        let adapter = NewsAdapter::new(DEFAULT_SEARCH_URL, primary.clone(), llm)
            .with_fallback(fallback.clone());

        adapter.fetch_and_summarize("chips").await.expect("summary");

        assert_eq!(primary.urls().len(), 1);
        assert_eq!(fallback.urls().len(), 1);
    }

    #[tokio::test]
    async fn test_primary_failure_without_fallback_propagates() {
        let primary = Arc::new(ScriptedFetcher::failing(UpstreamError::Fetch("403".into())));
        let llm = Arc::new(ScriptedLlm::replying("ok"));
        let adapter = NewsAdapter::new(DEFAULT_SEARCH_URL, primary, llm.clone());

        let err = adapter.fetch_and_summarize("chips").await.unwrap_err();
        assert!(matches!(err, UpstreamError::Fetch(_)));
        assert!(llm.requests().is_empty());
    }

    #[tokio::test]
    async fn test_empty_page_uses_generic_stand_in() {
        let fetcher = Arc::new(ScriptedFetcher::returning(""));
        let llm = Arc::new(ScriptedLlm::replying("Here is the latest on x."));
        let adapter = NewsAdapter::new(DEFAULT_SEARCH_URL, fetcher, llm.clone());

        let summary = adapter.fetch_and_summarize("x").await.expect("summary");

        assert_eq!(summary, "Here is the latest on x.");
        assert_eq!(llm.requests()[0].prompt, "Latest news about x");
    }
}
