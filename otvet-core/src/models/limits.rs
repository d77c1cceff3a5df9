//! Daily action quotas.

use serde::Serialize;

/// Per-day allowance for each rate-limited action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LimitSet {
    /// Questions asked.
    pub questions: u32,
    /// Direct questions asked.
    pub direct_questions: u32,
    /// Answers given.
    pub answers: u32,
    /// Best-answer votes cast.
    pub best_answer_votes: u32,
    /// Poll votes cast.
    pub poll_votes: u32,
    /// Likes given.
    pub likes: u32,
    /// Photos attached.
    pub photos: u32,
    /// Videos attached.
    pub videos: u32,
    /// Questions recommended to the golden collection.
    pub best_question_recommends: u32,
}

/// Daily quotas: the full allowance and what is left of it today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Limits {
    /// The full daily allowance.
    pub total: LimitSet,
    /// What remains of the allowance today.
    pub current: LimitSet,
}
