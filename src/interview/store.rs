//! Conversation state store: the single mutation entry point.
//!
//! Every mutation is copy-on-write over an `Arc<ConversationState>`, so a
//! snapshot handed out earlier never observes later changes.

use std::sync::Arc;

use super::model::{Assessment, ConversationState, Message, Sender};
use super::stage::Stage;

#[derive(Debug, Default)]
pub struct ConversationStore {
    state: Arc<ConversationState>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Immutable view of the current state.
    pub fn snapshot(&self) -> Arc<ConversationState> {
        Arc::clone(&self.state)
    }

    fn state_mut(&mut self) -> &mut ConversationState {
        Arc::make_mut(&mut self.state)
    }

    /// Append a message with a fresh id and the current timestamp.
    pub fn append_message(&mut self, content: impl Into<String>, sender: Sender) -> Message {
        let message = Message::new(content, sender);
        self.state_mut().messages.push(message.clone());
        message
    }

    pub fn set_stage(&mut self, stage: Stage) {
        self.state_mut().current_stage = stage;
    }

    pub fn set_target_behavior(&mut self, behavior: impl Into<String>) {
        self.state_mut().target_behavior = Some(behavior.into());
    }

    /// Set the target behavior only if none is set yet. Returns whether it was set.
    pub fn adopt_target_behavior(&mut self, behavior: &str) -> bool {
        if self.state.target_behavior.is_some() {
            return false;
        }
        self.set_target_behavior(behavior);
        true
    }

    pub fn set_assessment(&mut self, assessment: Assessment) {
        self.state_mut().assessment = Some(assessment);
    }

    pub fn set_thinking(&mut self, thinking: bool) {
        self.state_mut().is_thinking = thinking;
    }

    pub fn set_final_summary(&mut self, is_final: bool) {
        self.state_mut().is_final_summary = is_final;
    }

    pub fn mark_assessment_offered(&mut self) {
        self.state_mut().assessment_offered = true;
    }

    /// Discard everything and return to the initial state.
    pub fn reset(&mut self) {
        self.state = Arc::new(ConversationState::default());
    }
}
