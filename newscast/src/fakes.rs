//! In-process stand-ins for the external collaborators, used by unit tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::UpstreamError;
use crate::llm::{LlmProvider, LlmRequest, LlmResponse, UsageMetadata};
use crate::narrator::Narrator;
use crate::sources::{PageFetcher, Source, SourceAdapter, SourceKind};

type Reply = Box<dyn Fn(&LlmRequest) -> Result<String, UpstreamError> + Send + Sync>;

/// LLM that records every request and answers from a closure.
pub struct ScriptedLlm {
    reply: Reply,
    requests: Mutex<Vec<LlmRequest>>,
}

impl ScriptedLlm {
    pub fn with(reply: impl Fn(&LlmRequest) -> Result<String, UpstreamError> + Send + Sync + 'static) -> Self {
        Self {
            reply: Box::new(reply),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(text: &str) -> Self {
        let text = text.to_string();
        Self::with(move |_| Ok(text.clone()))
    }

    pub fn failing(err: UpstreamError) -> Self {
        Self::with(move |_| Err(err.clone()))
    }

    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, UpstreamError> {
        self.requests.lock().unwrap().push(request.clone());
        let content = (self.reply)(&request)?;
        Ok(LlmResponse {
            content,
            usage: UsageMetadata::default(),
            model: "scripted".to_string(),
        })
    }
}

/// Page fetcher returning a fixed body or error.
pub struct ScriptedFetcher {
    result: Result<String, UpstreamError>,
    urls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn returning(body: &str) -> Self {
        Self {
            result: Ok(body.to_string()),
            urls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(err: UpstreamError) -> Self {
        Self {
            result: Err(err),
            urls: Mutex::new(Vec::new()),
        }
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn fetch(&self, url: &str) -> Result<String, UpstreamError> {
        self.urls.lock().unwrap().push(url.to_string());
        self.result.clone()
    }
}

type TopicFn = Arc<dyn Fn(&str, u32) -> Result<String, UpstreamError> + Send + Sync>;

/// Source whose adapter answers per topic from a closure that also receives
/// the 1-based call count for that topic.
pub struct FakeSource {
    kind: SourceKind,
    answer: TopicFn,
    open_error: Option<UpstreamError>,
    pub opened: AtomicU32,
    calls: Arc<Mutex<Vec<String>>>,
}

impl FakeSource {
    pub fn new(
        kind: SourceKind,
        answer: impl Fn(&str, u32) -> Result<String, UpstreamError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            answer: Arc::new(answer),
            open_error: None,
            opened: AtomicU32::new(0),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every topic summarized as "<kind> on <topic>".
    pub fn echoing(kind: SourceKind) -> Self {
        Self::new(kind, move |topic, _| Ok(format!("{} on {}", kind, topic)))
    }

    pub fn failing_to_open(kind: SourceKind, err: UpstreamError) -> Self {
        let mut source = Self::new(kind, |_, _| Ok(String::new()));
        source.open_error = Some(err);
        source
    }

    /// Topics in the order the adapter was called, retries included.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Source for FakeSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn open(&self) -> Result<Box<dyn SourceAdapter>, UpstreamError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.open_error {
            return Err(err.clone());
        }
        Ok(Box::new(FakeAdapter {
            answer: self.answer.clone(),
            calls: self.calls.clone(),
        }))
    }
}

struct FakeAdapter {
    answer: TopicFn,
    calls: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl SourceAdapter for FakeAdapter {
    async fn fetch_and_summarize(&self, topic: &str) -> Result<String, UpstreamError> {
        let attempt = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(topic.to_string());
            calls.iter().filter(|t| *t == topic).count() as u32
        };
        (self.answer)(topic, attempt)
    }
}

/// Narrator producing the script bytes, recording the voice and locale.
#[derive(Default)]
pub struct EchoNarrator {
    pub fail: bool,
    pub seen: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl Narrator for EchoNarrator {
    async fn synthesize(&self, text: &str, voice: &str, locale: &str) -> Result<Vec<u8>, UpstreamError> {
        self.seen.lock().unwrap().push((voice.to_string(), locale.to_string()));
        if self.fail {
            return Err(UpstreamError::Synthesis("tts down".to_string()));
        }
        Ok(text.as_bytes().to_vec())
    }
}
