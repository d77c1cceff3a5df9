//! Domain models for the otvet.mail.ru service.
//!
//! These are the values the client hands to callers. They are built by the
//! response-mapping layer from the service's wire JSON; the wire field
//! names never leak into them.
//!
//! ## Submodules
//!
//! - [`user`] - User previews, full users, brands, profiles
//! - [`question`] - Question previews, full questions, polls, search results
//! - [`answer`] - Answers and user-answer listing items
//! - [`limits`] - Daily action quotas
//! - [`rate`] - The user rank ladder

mod answer;
mod limits;
mod question;
mod rate;
mod user;

// Re-export everything at the models level
pub use answer::{Answer, AnswerPreview, ThankStatus};
pub use limits::{LimitSet, Limits};
pub use question::{
    BestQuestionPreview, MinimalQuestionPreview, Poll, PollOption, PollType, Question,
    QuestionAddition, QuestionPreview, QuestionSearchResult, QuestionState, QuestionSummary,
    UserQuestionPreview,
};
pub use rate::{RATES, Rate};
pub use user::{
    Avatar, Brand, BrandAffiliation, BrandSmallUserPreview, MinimalUserPreview, OwnProfileStats,
    PollVoter, SmallUser, SmallUserPreview, User, UserPreview, UserProfile,
};

/// Public site origin used for permalink rendering.
const SITE_URL: &str = "https://otvet.mail.ru";

/// Profile page URL for a user id.
pub fn profile_url(id: u64) -> String {
    format!("{SITE_URL}/profile/id{id}/")
}

/// Question page URL for a question id.
pub fn question_url(id: u64) -> String {
    format!("{SITE_URL}/question/{id}")
}

/// Answer permalink for an answer id.
pub fn answer_url(id: u64) -> String {
    format!("{SITE_URL}/answer/{id}")
}
