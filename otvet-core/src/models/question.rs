//! Question-related models.
//!
//! Listings return questions at several levels of detail. The shared
//! listing fields live in [`QuestionSummary`]; the preview types wrap a
//! summary together with whatever extras their endpoint adds. The full
//! [`Question`] returned by the single-question endpoint is flat.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{Answer, MinimalUserPreview, SmallUser, User, UserPreview, question_url};
use crate::categories::Category;
use crate::traits::HasId;

// ============================================================================
// Enums
// ============================================================================

/// Lifecycle stage of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionState {
    /// Accepting answers.
    Open,
    /// Answer period over, best-answer vote running.
    Vote,
    /// Closed with a best answer chosen.
    Resolve,
}

impl QuestionState {
    /// Single-letter code the wire format uses for this state.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Open => "A",
            Self::Vote => "V",
            Self::Resolve => "R",
        }
    }

    /// Parses the wire code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "A" => Some(Self::Open),
            "V" => Some(Self::Vote),
            "R" => Some(Self::Resolve),
            _ => None,
        }
    }
}

/// Kind of poll attached to a question, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PollType {
    /// Not a poll.
    None,
    /// One option per voter.
    Single,
    /// Several options per voter.
    Multiple,
}

impl PollType {
    /// Wire code for this poll type; the empty string means no poll.
    pub fn code(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::Single => "S",
            Self::Multiple => "C",
        }
    }

    /// Parses the wire code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "" => Some(Self::None),
            "S" => Some(Self::Single),
            "C" => Some(Self::Multiple),
            _ => None,
        }
    }

    /// Whether the question actually carries a poll.
    pub fn is_poll(&self) -> bool {
        !matches!(self, Self::None)
    }
}

// ============================================================================
// Listing summaries and previews
// ============================================================================

/// Listing fields shared by every question preview shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionSummary {
    /// Question id.
    pub id: u64,
    /// Question title.
    pub title: String,
    /// Category the question was asked in.
    pub category: Category,
    /// Lifecycle stage.
    pub state: QuestionState,
    /// Seconds since the question was asked.
    pub age_seconds: u64,
    /// Whether the question was promoted to the leaders block.
    pub is_leader: bool,
    /// Kind of poll attached, if any.
    pub poll_type: PollType,
    /// Number of answers, or of poll votes when the question is a poll.
    pub answer_count: u32,
}

impl QuestionSummary {
    /// Question page URL.
    pub fn url(&self) -> String {
        question_url(self.id)
    }
}

impl HasId for QuestionSummary {
    fn id(&self) -> u64 {
        self.id
    }
}

/// Question listing item with its author.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionPreview {
    /// Shared listing fields.
    pub question: QuestionSummary,
    /// Who asked.
    pub author: UserPreview,
}

impl HasId for QuestionPreview {
    fn id(&self) -> u64 {
        self.question.id
    }
}

/// Item of the best-questions rating listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestQuestionPreview {
    /// Shared listing fields.
    pub question: QuestionSummary,
    /// Who asked.
    pub author: UserPreview,
    /// Whether the requesting user may like the question.
    pub can_like: bool,
    /// Likes the question received.
    pub like_count: u32,
}

impl HasId for BestQuestionPreview {
    fn id(&self) -> u64 {
        self.question.id
    }
}

/// Item of a user's own questions listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserQuestionPreview {
    /// Shared listing fields.
    pub question: QuestionSummary,
    /// Whether the question is hidden from listings.
    pub is_hidden: bool,
}

impl HasId for UserQuestionPreview {
    fn id(&self) -> u64 {
        self.question.id
    }
}

/// Question reference embedded in answer listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MinimalQuestionPreview {
    /// Shared listing fields.
    pub question: QuestionSummary,
    /// Who asked, at minimal detail.
    pub author: MinimalUserPreview,
}

impl HasId for MinimalQuestionPreview {
    fn id(&self) -> u64 {
        self.question.id
    }
}

// ============================================================================
// Polls and additions
// ============================================================================

/// Piece of text the author appended to a question after asking it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionAddition {
    /// Addition id.
    pub id: u64,
    /// Seconds since the addition was posted.
    pub age_seconds: u64,
    /// Addition body.
    pub text: String,
}

/// One option of a poll.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollOption {
    /// Option id.
    pub id: u64,
    /// Option label.
    pub text: String,
    /// Votes this option received.
    pub vote_count: u32,
    /// Whether the requesting user voted for this option.
    pub my_vote: bool,
}

/// Poll attached to a question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Poll {
    /// Single- or multiple-choice.
    pub poll_type: PollType,
    /// Total votes across all options.
    pub vote_count: u32,
    /// The options, in display order.
    pub options: Vec<PollOption>,
    /// Whether the requesting user voted for any option.
    pub i_voted: bool,
}

// ============================================================================
// Full question
// ============================================================================

/// Full question as returned by the single-question endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Question {
    /// Question id.
    pub id: u64,
    /// Question title.
    pub title: String,
    /// Question body.
    pub text: String,
    /// Category the question was asked in.
    pub category: Category,
    /// Lifecycle stage.
    pub state: QuestionState,
    /// Seconds since the question was asked.
    pub age_seconds: u64,
    /// When the question was asked.
    pub created_at: DateTime<Utc>,
    /// Whether the question was promoted to the leaders block.
    pub is_leader: bool,
    /// Kind of poll attached, if any.
    pub poll_type: PollType,
    /// Number of answers. Unlike listings, the full question reports this
    /// directly even for polls.
    pub answer_count: u32,
    /// Who asked.
    pub author: User,
    /// Answers, best answer first when one exists.
    pub answers: Vec<Answer>,
    /// The chosen best answer, if any.
    pub best_answer: Option<Answer>,
    /// Votes the best answer received in the vote stage.
    pub best_answer_vote_count: u32,
    /// Whether the author may still choose a best answer.
    pub can_choose_best_answer: bool,
    /// Users who liked the question; brands may appear here.
    pub liked_by: Vec<SmallUser>,
    /// Likes the question received.
    pub like_count: u32,
    /// Text the author appended after asking.
    pub additions: Vec<QuestionAddition>,
    /// Comments under the question.
    pub comment_count: u32,
    /// Whether the requesting user may comment.
    pub can_comment: bool,
    /// Whether the requesting user may like the question.
    pub can_like: bool,
    /// Whether the requesting user may answer.
    pub can_answer: bool,
    /// Server-side reason answering is disabled, when it is.
    pub cannot_answer_reason: Option<String>,
    /// Whether the question is hidden from listings.
    pub is_hidden: bool,
    /// Whether the requesting user watches this question.
    pub is_watching: bool,
    /// The poll, for poll questions.
    pub poll: Option<Poll>,
    /// Id of the moderator who removed the question, for removed questions.
    pub deleted_by_id: Option<u64>,
}

impl Question {
    /// Question page URL.
    pub fn url(&self) -> String {
        question_url(self.id)
    }
}

impl HasId for Question {
    fn id(&self) -> u64 {
        self.id
    }
}

// ============================================================================
// Search results
// ============================================================================

/// Hit from the full-text question search.
///
/// The search backend is a different system with its own response shape;
/// notably the state may be absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionSearchResult {
    /// Question id.
    pub id: u64,
    /// Question title.
    pub title: String,
    /// Question body, possibly empty.
    pub text: String,
    /// Category the question was asked in.
    pub category: Category,
    /// Number of answers.
    pub answer_count: u32,
    /// Lifecycle stage, when the search backend reports one.
    pub state: Option<QuestionState>,
    /// Whether the question carries a poll.
    pub is_poll: bool,
    /// When the question was asked.
    pub created_at: DateTime<Utc>,
    /// Seconds since the question was asked.
    pub age_seconds: u64,
    /// Who asked, at minimal detail.
    pub author: MinimalUserPreview,
}

impl QuestionSearchResult {
    /// Question page URL.
    pub fn url(&self) -> String {
        question_url(self.id)
    }
}

impl HasId for QuestionSearchResult {
    fn id(&self) -> u64 {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_codes_round_trip() {
        for state in [QuestionState::Open, QuestionState::Vote, QuestionState::Resolve] {
            assert_eq!(QuestionState::from_code(state.code()), Some(state));
        }
        assert_eq!(QuestionState::from_code("X"), None);
    }

    #[test]
    fn test_poll_type_codes() {
        assert_eq!(PollType::from_code(""), Some(PollType::None));
        assert_eq!(PollType::from_code("S"), Some(PollType::Single));
        assert_eq!(PollType::from_code("C"), Some(PollType::Multiple));
        assert_eq!(PollType::from_code("Z"), None);
        assert!(!PollType::None.is_poll());
        assert!(PollType::Single.is_poll());
    }
}
