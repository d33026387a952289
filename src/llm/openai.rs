//! OpenAI chat-completions transport.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::LlmSettings;
use crate::error::LlmError;

use super::provider::{
    ChatMessage, CompletionRequest, CompletionResponse, FinishReason, LlmProvider,
};
use super::rate_limit::RateLimiter;

const PROVIDER: &str = "openai";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    frequency_penalty: f32,
    presence_penalty: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

/// Chat-completions client for OpenAI-compatible endpoints.
pub struct OpenAiProvider {
    client: Client,
    settings: LlmSettings,
    limiter: RateLimiter,
}

impl OpenAiProvider {
    pub fn new(settings: LlmSettings) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(settings.request_timeout)
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| LlmError::RequestFailed {
                provider: PROVIDER.to_string(),
                reason: format!("Failed to build HTTP client: {e}"),
            })?;
        let limiter = RateLimiter::per_minute(settings.requests_per_minute);
        Ok(Self {
            client,
            settings,
            limiter,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.settings.base_url)
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn model_name(&self) -> &str {
        &self.settings.model
    }

    async fn complete(
        &self,
        api_key: &SecretString,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, LlmError> {
        if let Err(wait) = self.limiter.try_acquire() {
            return Err(LlmError::RateLimited {
                provider: PROVIDER.to_string(),
                retry_after: Some(wait),
            });
        }

        let body = ChatRequest {
            model: &self.settings.model,
            messages: &request.messages,
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
            top_p: self.settings.top_p,
            frequency_penalty: self.settings.frequency_penalty,
            presence_penalty: self.settings.presence_penalty,
        };

        debug!(
            model = %self.settings.model,
            messages = request.messages.len(),
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed {
                provider: PROVIDER.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| LlmError::RequestFailed {
            provider: PROVIDER.to_string(),
            reason: format!("Failed to read response body: {e}"),
        })?;

        if !status.is_success() {
            warn!(status = %status, "Chat completion request rejected");
            return Err(error_from_body(status, &text));
        }

        parse_completion(&text)
    }
}

/// Map a non-success response body to an `LlmError`.
fn error_from_body(status: StatusCode, body: &str) -> LlmError {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
        let message = envelope
            .error
            .message
            .unwrap_or_else(|| format!("HTTP {status}"));
        if let Some(code) = envelope.error.code.or(envelope.error.kind) {
            return LlmError::Api {
                provider: PROVIDER.to_string(),
                code,
                message,
            };
        }
    }

    if status == StatusCode::UNAUTHORIZED {
        return LlmError::AuthFailed {
            provider: PROVIDER.to_string(),
        };
    }
    if status == StatusCode::TOO_MANY_REQUESTS {
        return LlmError::RateLimited {
            provider: PROVIDER.to_string(),
            retry_after: None,
        };
    }

    LlmError::RequestFailed {
        provider: PROVIDER.to_string(),
        reason: format!("HTTP {status}"),
    }
}

fn parse_completion(body: &str) -> Result<CompletionResponse, LlmError> {
    let parsed: ChatResponse = serde_json::from_str(body)?;
    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::InvalidResponse {
            provider: PROVIDER.to_string(),
            reason: "response contained no choices".to_string(),
        })?;

    let (input_tokens, output_tokens) = parsed
        .usage
        .map(|u| (u.prompt_tokens, u.completion_tokens))
        .unwrap_or((0, 0));

    Ok(CompletionResponse {
        content: choice.message.content.unwrap_or_default(),
        input_tokens,
        output_tokens,
        finish_reason: FinishReason::from_api(choice.finish_reason.as_deref()),
    })
}
