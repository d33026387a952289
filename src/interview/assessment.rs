//! Assessment engine: maps importance/confidence ratings to a stage.
//!
//! Only the first three stages are reachable from a rating. Action and
//! Maintenance have no rating that produces them.

use crate::error::AssessmentError;

use super::model::Assessment;
use super::stage::Stage;

/// Minimum average rating for Preparation.
pub const PREPARATION_THRESHOLD: f32 = 8.0;
/// Minimum average rating for Contemplation.
pub const CONTEMPLATION_THRESHOLD: f32 = 5.0;

/// Recommend a stage from two 0-10 ratings. Out-of-range input is rejected.
pub fn evaluate(importance: u8, confidence: u8) -> Result<Stage, AssessmentError> {
    Assessment::new(importance, confidence).map(|a| recommend(&a))
}

/// Recommend a stage for an already validated assessment.
pub fn recommend(assessment: &Assessment) -> Stage {
    let average = assessment.average();
    if average >= PREPARATION_THRESHOLD {
        Stage::Preparation
    } else if average >= CONTEMPLATION_THRESHOLD {
        Stage::Contemplation
    } else {
        Stage::Precontemplation
    }
}
