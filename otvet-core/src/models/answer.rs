//! Answer-related models.

use serde::Serialize;

use super::{MinimalQuestionPreview, User, answer_url};
use crate::traits::HasId;

/// Reaction of a question's author to an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ThankStatus {
    /// No reaction.
    None,
    /// The author thanked the answer.
    Liked,
    /// The author hid the answer.
    Hidden,
}

impl ThankStatus {
    /// Parses the wire integer (`0`, `1`, `-1`).
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::None),
            1 => Some(Self::Liked),
            -1 => Some(Self::Hidden),
            _ => None,
        }
    }
}

/// Answer to a question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    /// Answer id.
    pub id: u64,
    /// Who answered.
    pub author: User,
    /// Answer body.
    pub text: String,
    /// Source reference the answerer supplied, often empty.
    pub source: String,
    /// Seconds since the answer was posted.
    pub age_seconds: u64,
    /// Whether the requesting user may like the answer.
    pub can_like: bool,
    /// Whether the requesting user may thank the answer.
    pub can_thank: bool,
    /// The question author's reaction, if any.
    pub thank_status: ThankStatus,
    /// Likes the answer received.
    pub like_count: u32,
    /// Comments under the answer.
    pub comment_count: u32,
    /// Best-answer votes this answer received.
    pub vote_count: u32,
}

impl Answer {
    /// Answer page URL.
    pub fn url(&self) -> String {
        answer_url(self.id)
    }
}

impl HasId for Answer {
    fn id(&self) -> u64 {
        self.id
    }
}

/// Item of a user's answers listing: the answer plus a minimal view of
/// the question it answers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerPreview {
    /// Answer id.
    pub id: u64,
    /// Answer body.
    pub text: String,
    /// Seconds since the answer was posted.
    pub age_seconds: u64,
    /// Whether this answer was chosen as best.
    pub is_best: bool,
    /// The question it answers.
    pub question: MinimalQuestionPreview,
}

impl AnswerPreview {
    /// Answer page URL.
    pub fn url(&self) -> String {
        answer_url(self.id)
    }
}

impl HasId for AnswerPreview {
    fn id(&self) -> u64 {
        self.id
    }
}
