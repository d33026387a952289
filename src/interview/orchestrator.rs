//! Generation orchestrator: one oracle call per turn, with outcome
//! classification and the single in-flight guard.

use std::sync::Arc;

use secrecy::SecretString;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::credentials::CredentialStore;
use crate::error::{InterviewError, LlmError};
use crate::llm::{ChatMessage, CompletionRequest, CompletionResponse, FinishReason, LlmProvider};

use super::model::{ConversationState, Sender};
use super::prompts::synthesize;
use super::store::ConversationStore;

/// Provider error codes that mean the credential itself is unusable.
pub const CREDENTIAL_ERROR_CODES: &[&str] = &["insufficient_quota", "invalid_api_key"];

/// Reply phrasing that indicates a credential failure delivered as text.
pub const CREDENTIAL_FAILURE_PATTERNS: &[&str] = &[
    "exceeded its quota",
    "exceeded your current quota",
    "API key",
    "insufficient_quota",
    "invalid_api_key",
];

/// Phrasing that looks like provider error prose but matches no known pattern.
const SUSPECT_PATTERNS: &[&str] = &["encountered an error", "please try again", "error code"];

/// Classified result of one generation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum GenerationOutcome {
    /// A normal assistant reply.
    Reply(String),
    /// No credential is configured; the oracle was not called.
    NeedsCredential,
    /// The provider rejected the credential or the quota is exhausted.
    CredentialError(String),
    /// Network, parse or other provider failure. Retry is up to the user.
    TransientError(String),
}

impl GenerationOutcome {
    pub fn is_reply(&self) -> bool {
        matches!(self, Self::Reply(_))
    }

    /// Whether the front end should ask for a (new) credential.
    pub fn needs_credential(&self) -> bool {
        matches!(self, Self::NeedsCredential | Self::CredentialError(_))
    }

    /// User-facing guidance for non-reply outcomes.
    pub fn guidance(&self) -> Option<String> {
        match self {
            Self::Reply(_) => None,
            Self::NeedsCredential => Some(
                "I need an OpenAI API key to continue our conversation. Please enter your API key."
                    .to_string(),
            ),
            Self::CredentialError(detail) => Some(format!(
                "Your API key was rejected or has run out of quota. Please enter a different key.\n({detail})"
            )),
            Self::TransientError(_) => {
                Some("Failed to get a response. Please try again.".to_string())
            }
        }
    }
}

/// Classify the oracle's result. The only place error patterns live.
pub fn classify(result: Result<CompletionResponse, LlmError>) -> GenerationOutcome {
    match result {
        Ok(response) => classify_reply(response.content),
        Err(LlmError::Api { code, message, .. })
            if CREDENTIAL_ERROR_CODES.contains(&code.as_str()) =>
        {
            GenerationOutcome::CredentialError(message)
        }
        Err(e @ LlmError::AuthFailed { .. }) => GenerationOutcome::CredentialError(e.to_string()),
        Err(e) => GenerationOutcome::TransientError(e.to_string()),
    }
}

fn classify_reply(text: String) -> GenerationOutcome {
    if CREDENTIAL_FAILURE_PATTERNS.iter().any(|p| text.contains(p)) {
        return GenerationOutcome::CredentialError(text);
    }
    if text.trim().is_empty() {
        return GenerationOutcome::TransientError("empty response from model".to_string());
    }

    let lower = text.to_lowercase();
    if SUSPECT_PATTERNS.iter().any(|p| lower.contains(p)) {
        warn!(reply = %text, "Reply resembles a provider error but matched no known pattern");
    }
    GenerationOutcome::Reply(text)
}

/// Clears `is_thinking` when dropped, so every exit path resets it.
struct ThinkingGuard {
    store: Arc<RwLock<ConversationStore>>,
    armed: bool,
}

impl ThinkingGuard {
    fn hold(store: &Arc<RwLock<ConversationStore>>) -> Self {
        Self {
            store: Arc::clone(store),
            armed: true,
        }
    }

    async fn release(self) {
        self.release_with(None).await;
    }

    /// Clear the flag, recording `reply` first under the same lock.
    async fn release_with(mut self, reply: Option<&str>) {
        let mut store = self.store.write().await;
        if let Some(text) = reply {
            store.append_message(text, Sender::Ai);
        }
        store.set_thinking(false);
        drop(store);
        self.armed = false;
    }
}

impl Drop for ThinkingGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        // Only reached when the generating future is dropped mid-call.
        match self.store.try_write() {
            Ok(mut store) => store.set_thinking(false),
            Err(_) => {
                let store = Arc::clone(&self.store);
                if let Ok(handle) = tokio::runtime::Handle::try_current() {
                    handle.spawn(async move { store.write().await.set_thinking(false) });
                }
            }
        }
    }
}

/// Sequences the thinking flag, prompt synthesis and the oracle call.
pub struct GenerationOrchestrator {
    llm: Arc<dyn LlmProvider>,
    credentials: Arc<CredentialStore>,
}

impl GenerationOrchestrator {
    pub fn new(llm: Arc<dyn LlmProvider>, credentials: Arc<CredentialStore>) -> Self {
        Self { llm, credentials }
    }

    pub fn credentials(&self) -> &Arc<CredentialStore> {
        &self.credentials
    }

    /// Generate the next assistant turn for the conversation in `store`.
    ///
    /// Does not append the reply; the caller decides what to record.
    pub async fn respond_to(
        &self,
        store: &Arc<RwLock<ConversationStore>>,
    ) -> Result<GenerationOutcome, InterviewError> {
        let Some(api_key) = self.credentials.get() else {
            debug!("No credential configured, skipping generation");
            return Ok(GenerationOutcome::NeedsCredential);
        };

        let snapshot = {
            let mut guard = store.write().await;
            if guard.snapshot().is_thinking {
                return Err(InterviewError::GenerationInFlight);
            }
            guard.set_thinking(true);
            guard.snapshot()
        };
        let thinking = ThinkingGuard::hold(store);

        Ok(self.generate(api_key, &snapshot, thinking, false).await)
    }

    /// Like [`respond_to`](Self::respond_to), for a caller that already set
    /// `is_thinking` under the write lock that produced `snapshot`.
    ///
    /// A `Reply` is appended to the store in the same write that clears the
    /// flag, so no other turn can land between them.
    pub async fn respond_reserved(
        &self,
        store: &Arc<RwLock<ConversationStore>>,
        snapshot: &ConversationState,
    ) -> GenerationOutcome {
        let thinking = ThinkingGuard::hold(store);
        let Some(api_key) = self.credentials.get() else {
            thinking.release().await;
            return GenerationOutcome::NeedsCredential;
        };
        self.generate(api_key, snapshot, thinking, true).await
    }

    async fn generate(
        &self,
        api_key: SecretString,
        snapshot: &ConversationState,
        thinking: ThinkingGuard,
        record_reply: bool,
    ) -> GenerationOutcome {
        let mut messages = Vec::with_capacity(snapshot.messages.len() + 1);
        messages.push(ChatMessage::system(synthesize(
            snapshot.current_stage,
            snapshot.target_behavior.as_deref(),
        )));
        messages.extend(snapshot.chat_history());

        info!(
            stage = %snapshot.current_stage,
            history = snapshot.messages.len(),
            model = self.llm.model_name(),
            "Requesting assistant reply"
        );

        let result = self
            .llm
            .complete(&api_key, CompletionRequest::new(messages))
            .await;
        match &result {
            Ok(response) => {
                debug!(
                    input_tokens = response.input_tokens,
                    output_tokens = response.output_tokens,
                    finish_reason = ?response.finish_reason,
                    "Assistant reply received"
                );
                if response.finish_reason == FinishReason::Length {
                    warn!("Reply was cut off at the token limit");
                }
            }
            Err(e) => warn!(error = %e, "Oracle call failed"),
        }
        let outcome = classify(result);

        let reply = match &outcome {
            GenerationOutcome::Reply(text) if record_reply => Some(text.as_str()),
            _ => None,
        };
        thinking.release_with(reply).await;

        match &outcome {
            GenerationOutcome::CredentialError(detail) => {
                warn!(detail = %detail, "Credential rejected by provider")
            }
            GenerationOutcome::TransientError(detail) => {
                warn!(detail = %detail, "Generation failed")
            }
            GenerationOutcome::Reply(_) | GenerationOutcome::NeedsCredential => {}
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use secrecy::{ExposeSecret, SecretString};

    use super::*;
    use crate::interview::model::Sender;
    use crate::interview::stage::Stage;
    use crate::llm::{FinishReason, Role};

    /// Stub oracle that records requests and replays a fixed result.
    struct StubLlm {
        reply: Result<String, fn() -> LlmError>,
        requests: Mutex<Vec<(String, CompletionRequest)>>,
    }

    impl StubLlm {
        fn replying(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.to_string()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn failing(err: fn() -> LlmError) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(err),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl LlmProvider for StubLlm {
        fn model_name(&self) -> &str {
            "stub"
        }

        async fn complete(
            &self,
            api_key: &SecretString,
            request: CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            self.requests
                .lock()
                .unwrap()
                .push((api_key.expose_secret().to_string(), request));
            match &self.reply {
                Ok(text) => Ok(CompletionResponse {
                    content: text.clone(),
                    input_tokens: 0,
                    output_tokens: 0,
                    finish_reason: FinishReason::Stop,
                }),
                Err(make) => Err(make()),
            }
        }
    }

    fn orchestrator(llm: Arc<StubLlm>, key: Option<&str>) -> GenerationOrchestrator {
        let credentials = Arc::new(CredentialStore::new());
        if let Some(key) = key {
            credentials.set(SecretString::from(key.to_string()));
        }
        GenerationOrchestrator::new(llm, credentials)
    }

    fn store_with(messages: &[(&str, Sender)]) -> Arc<RwLock<ConversationStore>> {
        let mut store = ConversationStore::new();
        for (content, sender) in messages {
            store.append_message(*content, *sender);
        }
        Arc::new(RwLock::new(store))
    }

    #[tokio::test]
    async fn no_credential_short_circuits() {
        let llm = StubLlm::replying("hello");
        let orch = orchestrator(Arc::clone(&llm), None);
        let store = store_with(&[("hi", Sender::User)]);

        let outcome = orch.respond_to(&store).await.unwrap();

        assert_eq!(outcome, GenerationOutcome::NeedsCredential);
        assert_eq!(llm.calls(), 0);
        assert!(!store.read().await.snapshot().is_thinking);
    }

    #[tokio::test]
    async fn no_credential_leaves_thinking_untouched() {
        let orch = orchestrator(StubLlm::replying("hello"), None);
        let store = store_with(&[]);
        store.write().await.set_thinking(true);

        let outcome = orch.respond_to(&store).await.unwrap();

        assert_eq!(outcome, GenerationOutcome::NeedsCredential);
        assert!(store.read().await.snapshot().is_thinking);
    }

    #[tokio::test]
    async fn quota_text_is_a_credential_error() {
        let orch = orchestrator(
            StubLlm::replying("Your key exceeded its quota for this month."),
            Some("sk-test"),
        );
        let store = store_with(&[("hi", Sender::User)]);

        let outcome = orch.respond_to(&store).await.unwrap();

        assert!(matches!(outcome, GenerationOutcome::CredentialError(ref t) if t.contains("exceeded its quota")));
        assert!(!store.read().await.snapshot().is_thinking);
    }

    #[tokio::test]
    async fn reply_does_not_append() {
        let orch = orchestrator(StubLlm::replying("Tell me more."), Some("sk-test"));
        let store = store_with(&[("hi", Sender::User)]);

        let outcome = orch.respond_to(&store).await.unwrap();

        assert_eq!(outcome, GenerationOutcome::Reply("Tell me more.".to_string()));
        let state = store.read().await.snapshot();
        assert_eq!(state.messages.len(), 1);
        assert!(!state.is_thinking);
    }

    #[tokio::test]
    async fn request_carries_instruction_history_and_key() {
        let llm = StubLlm::replying("ok");
        let orch = orchestrator(Arc::clone(&llm), Some("sk-abc"));
        let store = store_with(&[
            ("Welcome", Sender::Ai),
            ("smoking", Sender::User),
        ]);
        {
            let mut s = store.write().await;
            s.set_stage(Stage::Contemplation);
            s.adopt_target_behavior("smoking");
        }

        orch.respond_to(&store).await.unwrap();

        let requests = llm.requests.lock().unwrap();
        let (key, request) = &requests[0];
        assert_eq!(key, "sk-abc");
        assert_eq!(
            request.instruction().unwrap(),
            synthesize(Stage::Contemplation, Some("smoking"))
        );
        let roles: Vec<Role> = request.messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::Assistant, Role::User]);
        assert_eq!(request.messages[2].content, "smoking");
    }

    async fn reserve(store: &Arc<RwLock<ConversationStore>>) -> Arc<ConversationState> {
        let mut guard = store.write().await;
        guard.set_thinking(true);
        guard.snapshot()
    }

    #[tokio::test]
    async fn reserved_reply_is_recorded_before_release() {
        let llm = StubLlm::replying("What matters most here?");
        let orch = orchestrator(Arc::clone(&llm), Some("sk-test"));
        let store = store_with(&[("smoking", Sender::User)]);
        let snapshot = reserve(&store).await;

        let outcome = orch.respond_reserved(&store, &snapshot).await;

        assert!(outcome.is_reply());
        assert_eq!(llm.calls(), 1);
        let state = store.read().await.snapshot();
        assert!(!state.is_thinking);
        assert_eq!(state.messages.len(), 2);
        assert_eq!(state.messages[1].sender, Sender::Ai);
        assert_eq!(state.messages[1].content, "What matters most here?");
    }

    #[tokio::test]
    async fn reserved_generation_uses_reserved_snapshot() {
        let llm = StubLlm::replying("ok");
        let orch = orchestrator(Arc::clone(&llm), Some("sk-test"));
        let store = store_with(&[("smoking", Sender::User)]);
        let snapshot = reserve(&store).await;
        store.write().await.append_message("late arrival", Sender::User);

        orch.respond_reserved(&store, &snapshot).await;

        let requests = llm.requests.lock().unwrap();
        let contents: Vec<&str> = requests[0].1.messages[1..]
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, vec!["smoking"]);
    }

    #[tokio::test]
    async fn reserved_failure_is_not_recorded() {
        let orch = orchestrator(
            StubLlm::failing(|| LlmError::AuthFailed {
                provider: "stub".to_string(),
            }),
            Some("sk-test"),
        );
        let store = store_with(&[("hi", Sender::User)]);
        let snapshot = reserve(&store).await;

        let outcome = orch.respond_reserved(&store, &snapshot).await;

        assert!(matches!(outcome, GenerationOutcome::CredentialError(_)));
        let state = store.read().await.snapshot();
        assert_eq!(state.messages.len(), 1);
        assert!(!state.is_thinking);
    }

    #[tokio::test]
    async fn reserved_without_credential_releases() {
        let llm = StubLlm::replying("hello");
        let orch = orchestrator(Arc::clone(&llm), None);
        let store = store_with(&[("hi", Sender::User)]);
        let snapshot = reserve(&store).await;

        let outcome = orch.respond_reserved(&store, &snapshot).await;

        assert_eq!(outcome, GenerationOutcome::NeedsCredential);
        assert_eq!(llm.calls(), 0);
        assert!(!store.read().await.snapshot().is_thinking);
    }

    #[test]
    fn truncated_reply_is_still_a_reply() {
        let result = Ok(CompletionResponse {
            content: "Let's think about".to_string(),
            input_tokens: 40,
            output_tokens: 500,
            finish_reason: FinishReason::Length,
        });
        assert_eq!(
            classify(result),
            GenerationOutcome::Reply("Let's think about".to_string())
        );
    }

    #[tokio::test]
    async fn second_call_while_thinking_is_rejected() {
        let llm = StubLlm::replying("ok");
        let orch = orchestrator(Arc::clone(&llm), Some("sk-test"));
        let store = store_with(&[("hi", Sender::User)]);
        store.write().await.set_thinking(true);

        let err = orch.respond_to(&store).await.unwrap_err();

        assert!(matches!(err, InterviewError::GenerationInFlight));
        assert_eq!(llm.calls(), 0);
        assert!(store.read().await.snapshot().is_thinking);
    }

    #[tokio::test]
    async fn transport_failure_is_transient() {
        let orch = orchestrator(
            StubLlm::failing(|| LlmError::RequestFailed {
                provider: "stub".to_string(),
                reason: "connection reset".to_string(),
            }),
            Some("sk-test"),
        );
        let store = store_with(&[("hi", Sender::User)]);

        let outcome = orch.respond_to(&store).await.unwrap();

        assert!(matches!(outcome, GenerationOutcome::TransientError(_)));
        assert!(!store.read().await.snapshot().is_thinking);
    }

    #[tokio::test]
    async fn invalid_key_code_is_credential_error() {
        let orch = orchestrator(
            StubLlm::failing(|| LlmError::Api {
                provider: "stub".to_string(),
                code: "invalid_api_key".to_string(),
                message: "Incorrect key provided".to_string(),
            }),
            Some("sk-bad"),
        );
        let store = store_with(&[("hi", Sender::User)]);

        let outcome = orch.respond_to(&store).await.unwrap();

        assert_eq!(
            outcome,
            GenerationOutcome::CredentialError("Incorrect key provided".to_string())
        );
        assert!(!store.read().await.snapshot().is_thinking);
    }

    #[test]
    fn classify_error_codes() {
        let quota = classify(Err(LlmError::Api {
            provider: "openai".to_string(),
            code: "insufficient_quota".to_string(),
            message: "You exceeded your current quota".to_string(),
        }));
        assert!(quota.needs_credential());

        let other = classify(Err(LlmError::Api {
            provider: "openai".to_string(),
            code: "server_error".to_string(),
            message: "boom".to_string(),
        }));
        assert!(matches!(other, GenerationOutcome::TransientError(_)));

        let auth = classify(Err(LlmError::AuthFailed {
            provider: "openai".to_string(),
        }));
        assert!(matches!(auth, GenerationOutcome::CredentialError(_)));

        let limited = classify(Err(LlmError::RateLimited {
            provider: "openai".to_string(),
            retry_after: None,
        }));
        assert!(matches!(limited, GenerationOutcome::TransientError(_)));
    }

    #[test]
    fn classify_reply_text() {
        assert!(matches!(
            classify_reply("Please check your API key".to_string()),
            GenerationOutcome::CredentialError(_)
        ));
        assert!(matches!(
            classify_reply("   ".to_string()),
            GenerationOutcome::TransientError(_)
        ));
        // Suspect prose is logged but still a reply.
        assert!(classify_reply("I encountered an error once too.".to_string()).is_reply());
        assert!(classify_reply("What matters most to you?".to_string()).is_reply());
    }

    #[test]
    fn guidance_only_for_failures() {
        assert!(GenerationOutcome::Reply("hi".to_string()).guidance().is_none());
        assert!(GenerationOutcome::NeedsCredential.guidance().unwrap().contains("API key"));
        assert!(
            GenerationOutcome::TransientError("x".to_string())
                .guidance()
                .unwrap()
                .contains("try again")
        );
    }
}
