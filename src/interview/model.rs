//! Conversation data model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AssessmentError;
use crate::llm::{ChatMessage, Role};

use super::stage::Stage;

/// Highest value on either assessment scale.
pub const MAX_RATING: u8 = 10;

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
}

impl std::fmt::Display for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Ai => write!(f, "ai"),
        }
    }
}

/// A single conversation turn. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub content: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub(crate) fn new(content: impl Into<String>, sender: Sender) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            sender,
            timestamp: Utc::now(),
        }
    }

    pub fn is_from_user(&self) -> bool {
        self.sender == Sender::User
    }

    /// The provider-facing form of this message.
    pub fn to_chat_message(&self) -> ChatMessage {
        let role = match self.sender {
            Sender::User => Role::User,
            Sender::Ai => Role::Assistant,
        };
        ChatMessage {
            role,
            content: self.content.clone(),
        }
    }
}

/// Self-assessed importance of and confidence in making the change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assessment {
    pub importance: u8,
    pub confidence: u8,
}

impl Assessment {
    /// Build an assessment, rejecting ratings above `MAX_RATING`.
    pub fn new(importance: u8, confidence: u8) -> Result<Self, AssessmentError> {
        check_rating("importance", importance)?;
        check_rating("confidence", confidence)?;
        Ok(Self {
            importance,
            confidence,
        })
    }

    pub fn average(&self) -> f32 {
        (f32::from(self.importance) + f32::from(self.confidence)) / 2.0
    }
}

fn check_rating(field: &'static str, value: u8) -> Result<(), AssessmentError> {
    if value > MAX_RATING {
        return Err(AssessmentError::OutOfRange { field, value });
    }
    Ok(())
}

/// Everything the interview knows about the current conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConversationState {
    /// Append-only, in insertion order.
    pub messages: Vec<Message>,
    pub current_stage: Stage,
    /// Set from the first user message and kept for the conversation.
    pub target_behavior: Option<String>,
    pub assessment: Option<Assessment>,
    /// True exactly while an oracle call is outstanding.
    pub is_thinking: bool,
    /// Owned by the front end; no interview operation sets it.
    pub is_final_summary: bool,
    /// Whether the readiness trigger has already asked for an assessment.
    pub assessment_offered: bool,
}

impl ConversationState {
    /// Messages mapped to provider roles, in order.
    pub fn chat_history(&self) -> Vec<ChatMessage> {
        self.messages.iter().map(Message::to_chat_message).collect()
    }
}
