//! Conversation export: a JSON snapshot for the user to keep.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::ExportError;
use crate::interview::{Assessment, ConversationState, Sender, Stage};

/// One exported message.
#[derive(Debug, Clone, Serialize)]
pub struct ExportedMessage {
    pub role: Sender,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Serialized form of a conversation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationExport {
    pub conversation: Vec<ExportedMessage>,
    pub target_behavior: Option<String>,
    pub stage: Stage,
    pub assessment: Option<Assessment>,
    pub date: DateTime<Utc>,
}

impl ConversationExport {
    pub fn from_state(state: &ConversationState) -> Self {
        Self {
            conversation: state
                .messages
                .iter()
                .map(|m| ExportedMessage {
                    role: m.sender,
                    content: m.content.clone(),
                    timestamp: m.timestamp,
                })
                .collect(),
            target_behavior: state.target_behavior.clone(),
            stage: state.current_stage,
            assessment: state.assessment,
            date: Utc::now(),
        }
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// `mi-conversation-YYYY-MM-DD.json`, dated by the export time.
    pub fn file_name(&self) -> String {
        format!("mi-conversation-{}.json", self.date.format("%Y-%m-%d"))
    }

    /// Write the export into `dir` and return the file path.
    pub fn write_to_dir(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        let path = dir.join(self.file_name());
        let json = self.to_json()?;
        std::fs::write(&path, json).map_err(|source| ExportError::Write {
            path: path.clone(),
            source,
        })?;
        tracing::info!(path = %path.display(), "Conversation exported");
        Ok(path)
    }
}
