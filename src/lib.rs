//! mi-guide: a motivational-interviewing conversation guide backed by an LLM.

pub mod cli;
pub mod config;
pub mod credentials;
pub mod error;
pub mod export;
pub mod interview;
pub mod llm;
