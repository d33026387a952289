//! InterviewSession: coordinates the conversation store, readiness
//! detection, assessment and generation for one conversation.

use std::sync::Arc;

use secrecy::SecretString;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::credentials::CredentialStore;
use crate::error::InterviewError;
use crate::export::ConversationExport;
use crate::llm::LlmProvider;

use super::assessment;
use super::model::{Assessment, ConversationState, Sender};
use super::orchestrator::{GenerationOrchestrator, GenerationOutcome};
use super::prompts::{WELCOME_MESSAGE, assessment_acknowledgement};
use super::readiness::{self, ReadinessSignal};
use super::stage::Stage;
use super::store::ConversationStore;

/// What happened on one user turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnReport {
    /// `None` when the input was blank and nothing happened.
    pub outcome: Option<GenerationOutcome>,
    /// The front end should ask for a self-assessment now.
    pub assessment_due: bool,
    pub readiness: ReadinessSignal,
}

impl TurnReport {
    fn ignored() -> Self {
        Self {
            outcome: None,
            assessment_due: false,
            readiness: ReadinessSignal::default(),
        }
    }
}

/// One behavior-change conversation.
pub struct InterviewSession {
    store: Arc<RwLock<ConversationStore>>,
    orchestrator: GenerationOrchestrator,
}

impl InterviewSession {
    pub fn new(llm: Arc<dyn LlmProvider>, credentials: Arc<CredentialStore>) -> Self {
        Self {
            store: Arc::new(RwLock::new(ConversationStore::new())),
            orchestrator: GenerationOrchestrator::new(llm, credentials),
        }
    }

    /// Current state of the conversation.
    pub async fn snapshot(&self) -> Arc<ConversationState> {
        self.store.read().await.snapshot()
    }

    pub fn has_credential(&self) -> bool {
        self.orchestrator.credentials().is_configured()
    }

    /// Post the welcome message if a credential is set and nothing has been said yet.
    pub async fn start(&self) -> bool {
        if !self.has_credential() {
            return false;
        }
        let mut store = self.store.write().await;
        if !store.snapshot().messages.is_empty() {
            return false;
        }
        store.append_message(WELCOME_MESSAGE, Sender::Ai);
        debug!("Posted welcome message");
        true
    }

    /// Store a credential and greet if the conversation is empty.
    ///
    /// Returns false when the key is blank.
    pub async fn set_credential(&self, key: SecretString) -> bool {
        if !self.orchestrator.credentials().set(key) {
            return false;
        }
        info!("API key updated");
        self.start().await;
        true
    }

    /// Handle one user turn.
    pub async fn send_message(&self, text: &str) -> Result<TurnReport, InterviewError> {
        if text.trim().is_empty() {
            return Ok(TurnReport::ignored());
        }
        if !self.has_credential() {
            return Ok(TurnReport {
                outcome: Some(GenerationOutcome::NeedsCredential),
                ..TurnReport::ignored()
            });
        }

        // Busy check, user turn and in-flight reservation share one write lock.
        let (readiness, assessment_due, snapshot) = {
            let mut store = self.store.write().await;
            if store.snapshot().is_thinking {
                return Err(InterviewError::GenerationInFlight);
            }
            let before = store.snapshot();
            let readiness = readiness::detect(&before.messages, text);

            store.append_message(text, Sender::User);
            if store.adopt_target_behavior(text) {
                info!(target_behavior = text, "Target behavior set");
            }

            let fire = readiness.should_fire() && !before.assessment_offered;
            if fire {
                store.mark_assessment_offered();
            }
            debug!(
                strong = readiness.has_strong_signal,
                moderate = readiness.has_moderate_signal,
                count = readiness.cumulative_moderate_count,
                fired = fire,
                "Readiness scan"
            );
            store.set_thinking(true);
            (readiness, fire, store.snapshot())
        };

        if assessment_due {
            info!("Readiness signals detected, assessment due");
        }

        let outcome = self
            .orchestrator
            .respond_reserved(&self.store, &snapshot)
            .await;

        Ok(TurnReport {
            outcome: Some(outcome),
            assessment_due,
            readiness,
        })
    }

    /// Record a self-assessment and move to the recommended stage.
    pub async fn submit_assessment(
        &self,
        importance: u8,
        confidence: u8,
    ) -> Result<Stage, InterviewError> {
        let assessment = Assessment::new(importance, confidence)?;
        let stage = assessment::recommend(&assessment);

        let mut store = self.store.write().await;
        let target = store
            .snapshot()
            .target_behavior
            .clone()
            .ok_or(InterviewError::NoTargetBehavior)?;

        store.set_assessment(assessment);
        store.set_stage(stage);
        store.mark_assessment_offered();
        store.append_message(assessment_acknowledgement(&assessment, &target), Sender::Ai);

        info!(
            importance,
            confidence,
            stage = %stage,
            "Assessment recorded"
        );
        Ok(stage)
    }

    /// Set by the front end; no interview operation changes it.
    pub async fn set_final_summary(&self, is_final: bool) {
        self.store.write().await.set_final_summary(is_final);
    }

    /// Start over with an empty conversation. Irreversible.
    pub async fn reset(&self) {
        self.store.write().await.reset();
        info!("Conversation reset");
    }

    /// Read-only export of the current conversation.
    pub async fn export(&self) -> ConversationExport {
        let state = self.snapshot().await;
        ConversationExport::from_state(&state)
    }
}
