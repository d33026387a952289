//! LLM integration for mi-guide.
//!
//! The interview core only sees the `LlmProvider` trait. `OpenAiProvider`
//! talks to an OpenAI-compatible chat-completions endpoint over reqwest.

mod openai;
pub mod provider;
pub mod rate_limit;

pub use openai::OpenAiProvider;
pub use provider::*;
pub use rate_limit::RateLimiter;

use std::sync::Arc;

use crate::config::LlmSettings;
use crate::error::LlmError;

/// Create the default provider from configuration.
pub fn create_provider(settings: &LlmSettings) -> Result<Arc<dyn LlmProvider>, LlmError> {
    let provider = OpenAiProvider::new(settings.clone())?;
    tracing::info!("Using OpenAI-compatible endpoint {} (model: {})", settings.base_url, settings.model);
    Ok(Arc::new(provider))
}
