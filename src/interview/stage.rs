//! Behavior-change stages.

use serde::{Deserialize, Serialize};

/// The stages of change a conversation can be in.
///
/// Listed in their natural order: Precontemplation → Contemplation →
/// Preparation → Action → Maintenance. The conversation store does not
/// enforce this ordering; stage changes come from the assessment engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Precontemplation,
    Contemplation,
    Preparation,
    Action,
    Maintenance,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Precontemplation,
        Stage::Contemplation,
        Stage::Preparation,
        Stage::Action,
        Stage::Maintenance,
    ];

    /// Position in the natural progression, starting at 0.
    pub fn index(&self) -> usize {
        match self {
            Self::Precontemplation => 0,
            Self::Contemplation => 1,
            Self::Preparation => 2,
            Self::Action => 3,
            Self::Maintenance => 4,
        }
    }

    /// The following stage, if any.
    pub fn next(&self) -> Option<Stage> {
        Self::ALL.get(self.index() + 1).copied()
    }

    /// Whether moving from `self` to `target` follows the stage-of-change
    /// model: one step forward, or back to any earlier stage (relapse).
    ///
    /// Advisory only. `ConversationStore::set_stage` accepts any stage.
    pub fn can_transition_to(&self, target: Stage) -> bool {
        target.index() < self.index() || self.next() == Some(target)
    }

    /// Upper-case label used in prompt text.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Precontemplation => "PRECONTEMPLATION",
            Self::Contemplation => "CONTEMPLATION",
            Self::Preparation => "PREPARATION",
            Self::Action => "ACTION",
            Self::Maintenance => "MAINTENANCE",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Precontemplation => "precontemplation",
            Self::Contemplation => "contemplation",
            Self::Preparation => "preparation",
            Self::Action => "action",
            Self::Maintenance => "maintenance",
        };
        write!(f, "{s}")
    }
}
