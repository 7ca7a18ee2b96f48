// Library interface for newscast modules
// This allows tests and the binary to import modules

pub mod error;
pub mod llm;
pub mod rate_limit;
pub mod retry;
pub mod scraping;
pub mod sources;
pub mod collector;
pub mod orchestrator;
pub mod composer;
pub mod translator;
pub mod narrator;
pub mod briefing;
pub mod bootstrap;

#[cfg(test)]
pub(crate) mod fakes;

pub use error::{ErrorKind, PipelineError, UpstreamError};
