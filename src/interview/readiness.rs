//! Readiness signal detection: lexical cues of commitment to change.

use serde::Serialize;

use super::model::Message;

/// Explicit commitment phrasing.
pub const STRONG_CUES: &[&str] = &[
    "i want to change",
    "i'm ready to",
    "i will",
    "i must",
    "i've decided to",
    "it's time to",
];

/// Tentative phrasing.
pub const MODERATE_CUES: &[&str] = &[
    "i might",
    "i could",
    "thinking about",
    "considering",
    "maybe i should",
    "i'd like to",
    "i want to",
    "i need to",
    "i have to",
    "planning to",
];

/// Moderate-cue messages needed before a moderate cue alone fires.
pub const MODERATE_THRESHOLD: usize = 2;

/// Result of scanning the latest user turn against the conversation so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ReadinessSignal {
    /// The latest text contains a strong cue.
    pub has_strong_signal: bool,
    /// The latest text contains a moderate cue.
    pub has_moderate_signal: bool,
    /// User messages (history plus latest) containing any cue, each counted once.
    pub cumulative_moderate_count: usize,
}

impl ReadinessSignal {
    /// Whether this turn warrants asking for a self-assessment.
    ///
    /// Pure; the at-most-once latch lives in the conversation state.
    pub fn should_fire(&self) -> bool {
        self.has_strong_signal
            || (self.has_moderate_signal && self.cumulative_moderate_count >= MODERATE_THRESHOLD)
    }
}

/// Scan `latest_user_text` and the user messages in `history`.
///
/// `history` must not already contain the latest text.
pub fn detect(history: &[Message], latest_user_text: &str) -> ReadinessSignal {
    let latest = normalize(latest_user_text);
    let has_strong_signal = contains_any(&latest, STRONG_CUES);
    let has_moderate_signal = contains_any(&latest, MODERATE_CUES);

    let prior = history
        .iter()
        .filter(|m| m.is_from_user())
        .filter(|m| has_any_cue(&normalize(&m.content)))
        .count();
    let latest_counts = usize::from(has_strong_signal || has_moderate_signal);

    ReadinessSignal {
        has_strong_signal,
        has_moderate_signal,
        cumulative_moderate_count: prior + latest_counts,
    }
}

/// Lower-case and fold typographic apostrophes so "I’m" matches "i'm".
fn normalize(text: &str) -> String {
    text.to_lowercase().replace(['\u{2019}', '\u{2018}'], "'")
}

fn contains_any(text: &str, cues: &[&str]) -> bool {
    cues.iter().any(|cue| text.contains(cue))
}

fn has_any_cue(text: &str) -> bool {
    contains_any(text, STRONG_CUES) || contains_any(text, MODERATE_CUES)
}
