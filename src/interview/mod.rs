//! Motivational-interviewing conversation core.
//!
//! The session drives a conversation through the stages of change. Each
//! user turn is scanned for readiness cues; once the user signals
//! commitment, the front end asks for a self-assessment whose ratings pick
//! the stage. The stage and target behavior shape the instruction sent to
//! the model on every turn.

pub mod assessment;
pub mod model;
pub mod orchestrator;
pub mod prompts;
pub mod readiness;
pub mod session;
pub mod stage;
pub mod store;

pub use model::{Assessment, ConversationState, Message, Sender};
pub use orchestrator::{GenerationOrchestrator, GenerationOutcome};
pub use readiness::ReadinessSignal;
pub use session::{InterviewSession, TurnReport};
pub use stage::Stage;
pub use store::ConversationStore;
