use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{PipelineError, UpstreamError};

pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Fetches the raw body of a page.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch(&self, url: &str) -> Result<String, UpstreamError>;
}

/// 429 and 503 are transient; any other status is a permanent fetch failure.
fn status_error(status: reqwest::StatusCode, what: &str) -> UpstreamError {
    let message = format!("{} returned status {}", what, status);
    match status {
        reqwest::StatusCode::TOO_MANY_REQUESTS | reqwest::StatusCode::SERVICE_UNAVAILABLE => {
            UpstreamError::Overloaded(message)
        }
        _ => UpstreamError::Fetch(message),
    }
}

/// Web-unlocker proxy API: the page is fetched by the proxy service and
/// returned raw.
pub struct UnlockerFetcher {
    client: Client,
    api_url: String,
    api_key: String,
    zone: String,
}

#[derive(Serialize)]
struct UnlockerRequest<'a> {
    zone: &'a str,
    url: &'a str,
    format: &'static str,
}

impl UnlockerFetcher {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        zone: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, PipelineError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| PipelineError::Configuration(format!("failed to build reqwest client: {}", e)))?;
        Ok(Self {
            client,
            api_url: api_url.into(),
            api_key: api_key.into(),
            zone: zone.into(),
        })
    }
}

#[async_trait]
impl PageFetcher for UnlockerFetcher {
    fn name(&self) -> &str {
        "unlocker"
    }

    async fn fetch(&self, url: &str) -> Result<String, UpstreamError> {
        debug!(%url, "unlocker: sending request");
        let body = UnlockerRequest {
            zone: &self.zone,
            url,
            format: "raw",
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| UpstreamError::Fetch(format!("unlocker request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, "unlocker"));
        }

        let text = response
            .text()
            .await
            .map_err(|e| UpstreamError::Fetch(format!("failed to read unlocker body: {}", e)))?;
        info!(%url, bytes = text.len(), "unlocker: content fetched");
        Ok(text)
    }
}

/// Plain GET with a browser user agent; the fallback path.
pub struct DirectFetcher {
    client: Client,
}

impl DirectFetcher {
    pub fn new(user_agent: &str, timeout_secs: u64) -> Result<Self, PipelineError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .build()
            .map_err(|e| PipelineError::Configuration(format!("failed to build reqwest client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for DirectFetcher {
    fn name(&self) -> &str {
        "direct"
    }

    async fn fetch(&self, url: &str) -> Result<String, UpstreamError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| UpstreamError::Fetch(format!("direct fetch failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, "direct fetch"));
        }

        response
            .text()
            .await
            .map_err(|e| UpstreamError::Fetch(format!("failed to read page body: {}", e)))
    }
}
