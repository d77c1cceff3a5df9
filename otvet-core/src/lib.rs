// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # otvet Core
//!
//! Domain types for the otvet.mail.ru Q&A service, shared by the client
//! and CLI crates.
//!
//! This crate is pure data: nothing here touches the network. It provides:
//!
//! - Domain models (questions, answers, users, profiles, quotas)
//! - The category tree with O(1) lookups ([`Categories`])
//! - The user rank ladder ([`Rate`])
//! - Serde helpers for the service's loosely-typed JSON
//!
//! ## Key Types
//!
//! ### Questions
//! - [`QuestionSummary`] - Listing fields shared by every preview shape
//! - [`QuestionPreview`] / [`BestQuestionPreview`] / [`UserQuestionPreview`] -
//!   Listing items
//! - [`Question`] - Full question with answers and poll
//! - [`QuestionSearchResult`] - Full-text search hit
//!
//! ### Users
//! - [`UserPreview`] / [`User`] - Author blocks at two levels of detail
//! - [`SmallUser`] - Member-or-brand union used in like lists
//! - [`UserProfile`] - Profile page, with own-profile extras
//!
//! ### Infrastructure
//! - [`Categories`] - Category arena
//! - [`Rate`] - Rank ladder entry
//! - [`HasId`] - Id access for generic listing machinery

pub mod categories;
pub mod models;
pub mod serde_helpers;
pub mod traits;

// Re-export the category tree
pub use categories::{Categories, Category, CategoryNode};

// Re-export all model types
pub use models::{
    Answer, AnswerPreview, Avatar, BestQuestionPreview, Brand, BrandAffiliation,
    BrandSmallUserPreview, LimitSet, Limits, MinimalQuestionPreview, MinimalUserPreview,
    OwnProfileStats, Poll, PollOption, PollType, PollVoter, Question, QuestionAddition,
    QuestionPreview, QuestionSearchResult, QuestionState, QuestionSummary, RATES, Rate,
    SmallUser, SmallUserPreview, ThankStatus, User, UserPreview, UserProfile,
    UserQuestionPreview, answer_url, profile_url, question_url,
};

// Re-export traits
pub use traits::HasId;
