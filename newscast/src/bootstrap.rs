//! Wires a [`Briefing`] from configuration. Secrets are read from the
//! environment variables the config names.

use common::{Config, LlmTask};
use std::sync::Arc;
use tracing::{info, warn};

use crate::briefing::{Briefing, DEFAULT_MAX_TOPICS};
use crate::collector::SourcePacing;
use crate::composer::Composer;
use crate::error::PipelineError;
use crate::llm::remote::RemoteLlmProvider;
use crate::llm::LlmProvider;
use crate::narrator::{RemoteNarrator, VoiceBook};
use crate::orchestrator::Orchestrator;
use crate::scraping::DEFAULT_SEARCH_URL;
use crate::sources::fetch::BROWSER_USER_AGENT;
use crate::sources::{
    DirectFetcher, DiscussionProfile, DiscussionSource, LlmAgentConnector, NewsAdapter, PageFetcher,
    SourceKind, UnlockerFetcher,
};
use crate::translator::Translator;

const DEFAULT_LLM_URL: &str = "http://localhost:11434/v1/chat/completions";
const DEFAULT_LLM_MODEL: &str = "llama3.2";
const DEFAULT_TTS_URL: &str = "https://api.murf.ai/v1/speech/generate";
const DEFAULT_TTS_KEY_ENV: &str = "MURF_API_KEY";

fn secret(env: &dyn Fn(&str) -> Option<String>, var: &str, what: &str) -> Result<String, PipelineError> {
    env(var)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| PipelineError::Configuration(format!("{} env var '{}' not set", what, var)))
}

/// LLM client for one pipeline task.
pub fn llm_provider(
    config: &Config,
    task: LlmTask,
    env: &dyn Fn(&str) -> Option<String>,
) -> Result<Arc<dyn LlmProvider>, PipelineError> {
    let endpoint = config
        .llm
        .endpoint(task)
        .ok_or_else(|| PipelineError::Configuration(format!("no LLM endpoint configured for {:?}", task)))?;

    let api_key_env = endpoint.api_key_env.as_deref().ok_or_else(|| {
        PipelineError::Configuration(format!("missing api_key_env in LLM config for {:?}", task))
    })?;
    let api_key = secret(env, api_key_env, "LLM API key")?;

    let model = endpoint.model.clone().unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string());
    let api_url = endpoint.api_url.clone().unwrap_or_else(|| DEFAULT_LLM_URL.to_string());
    info!(?task, %model, %api_url, "configured LLM endpoint");

    let provider = RemoteLlmProvider::new(api_url, api_key, model).with_defaults(
        endpoint.timeout_seconds.unwrap_or(60),
        endpoint.max_tokens.unwrap_or(1000),
        endpoint.temperature.unwrap_or(0.7),
    );
    Ok(Arc::new(provider))
}

fn news_source(
    config: &Config,
    llm: Arc<dyn LlmProvider>,
    env: &dyn Fn(&str) -> Option<String>,
) -> Result<NewsAdapter, PipelineError> {
    let news = &config.news;
    let timeout = news.fetch_timeout_seconds.unwrap_or(30);
    let direct: Arc<dyn PageFetcher> = Arc::new(DirectFetcher::new(
        news.user_agent.as_deref().unwrap_or(BROWSER_USER_AGENT),
        timeout,
    )?);
    let search_url = news.search_url.clone().unwrap_or_else(|| DEFAULT_SEARCH_URL.to_string());

    let adapter = match &news.unlocker_api_url {
        Some(api_url) => {
            let key_env = news.unlocker_api_key_env.as_deref().ok_or_else(|| {
                PipelineError::Configuration("missing news.unlocker_api_key_env".to_string())
            })?;
            let api_key = secret(env, key_env, "unlocker API key")?;
            let zone = news.unlocker_zone.clone().unwrap_or_else(|| "web_unlocker1".to_string());
            let unlocker = Arc::new(UnlockerFetcher::new(api_url.clone(), api_key, zone, timeout)?);
            NewsAdapter::new(search_url, unlocker, llm).with_fallback(direct)
        }
        None => {
            warn!("no unlocker configured, news pages are fetched directly");
            NewsAdapter::new(search_url, direct, llm)
        }
    };

    Ok(match news.max_output_tokens {
        Some(max) => adapter.with_max_output_tokens(max),
        None => adapter,
    })
}

fn discussion_profile(kind: SourceKind, config: &common::DiscussionConfig) -> DiscussionProfile {
    let mut profile = match kind {
        SourceKind::Social => DiscussionProfile::social(),
        _ => DiscussionProfile::forum(),
    };
    if let Some(hours) = config.lookback_hours {
        profile = profile.with_lookback_hours(hours);
    }
    if let Some(max) = config.max_output_tokens {
        profile = profile.with_max_output_tokens(max);
    }
    profile
}

/// Builds the whole pipeline, looking secrets up with `env`.
pub fn build_briefing_with(
    config: &Config,
    env: &dyn Fn(&str) -> Option<String>,
) -> Result<Briefing, PipelineError> {
    let summarizer = llm_provider(config, LlmTask::Summarization, env)?;
    let composer_llm = llm_provider(config, LlmTask::Composition, env)?;
    let translator_llm = llm_provider(config, LlmTask::Translation, env)?;
    let agent_llm = llm_provider(config, LlmTask::Agent, env)?;

    let connector = Arc::new(LlmAgentConnector::new(agent_llm));
    let forum = DiscussionSource::new(connector.clone(), discussion_profile(SourceKind::Forum, &config.forum));
    let social = DiscussionSource::new(connector, discussion_profile(SourceKind::Social, &config.social));

    let orchestrator = Orchestrator::new()
        .with_source(
            Arc::new(news_source(config, summarizer, env)?),
            SourcePacing::from_config(SourceKind::News, config.news.pacing.as_ref()),
        )
        .with_source(
            Arc::new(forum),
            SourcePacing::from_config(SourceKind::Forum, config.forum.pacing.as_ref()),
        )
        .with_source(
            Arc::new(social),
            SourcePacing::from_config(SourceKind::Social, config.social.pacing.as_ref()),
        )
        .with_concurrent_sources(config.pipeline.concurrent_sources.unwrap_or(false));

    let tts = &config.tts;
    let tts_key = secret(
        env,
        tts.api_key_env.as_deref().unwrap_or(DEFAULT_TTS_KEY_ENV),
        "TTS API key",
    )?;
    let mut narrator = RemoteNarrator::new(tts.api_url.as_deref().unwrap_or(DEFAULT_TTS_URL), tts_key)
        .with_timeout(tts.timeout_seconds.unwrap_or(120));
    if let Some(format) = &tts.format {
        narrator = narrator.with_format(format.clone());
    }
    if let Some(rate) = tts.sample_rate {
        narrator = narrator.with_sample_rate(rate);
    }
    if let Some(style) = &tts.style {
        narrator = narrator.with_style(style.clone());
    }

    let mut translator = Translator::new(translator_llm);
    if let Some(language) = &config.pipeline.source_language {
        translator = translator.with_source_language(language.clone());
    }

    Ok(Briefing::new(orchestrator, Composer::new(composer_llm), translator, Arc::new(narrator))
        .with_voices(VoiceBook::new().with_overrides(&tts.voices))
        .with_max_topics(config.pipeline.max_topics.unwrap_or(DEFAULT_MAX_TOPICS)))
}

/// [`build_briefing_with`] reading secrets from the process environment.
pub fn build_briefing(config: &Config) -> Result<Briefing, PipelineError> {
    build_briefing_with(config, &|var: &str| std::env::var(var).ok())
}
