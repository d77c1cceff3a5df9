//! Question payload shapes.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use otvet_core::serde_helpers::{
    bool_from_any, int_from_any, opt_bool_from_any, opt_uint_from_any, uint_from_any,
};
use otvet_core::{
    Answer, Avatar, BestQuestionPreview, Categories, Category, MinimalUserPreview, Poll,
    PollOption, PollType, Question, QuestionAddition, QuestionPreview, QuestionSearchResult,
    QuestionState, QuestionSummary, UserQuestionPreview,
};

use crate::error::OtvetError;
use crate::wire::user::{WireSmallUser, WireUser};
use crate::wire::WireAnswer;

// ============================================================================
// Listing previews
// ============================================================================

/// Listing fields every question preview shape shares.
///
/// For polls the answer counter is served as `total_voted`; plain questions
/// carry `anscnt`. Which one applies follows from `polltype`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireQuestionSummary {
    #[serde(deserialize_with = "uint_from_any")]
    pub(crate) id: u64,
    pub(crate) qtext: String,
    pub(crate) state: String,
    #[serde(deserialize_with = "uint_from_any")]
    pub(crate) cid: u64,
    #[serde(deserialize_with = "uint_from_any")]
    pub(crate) added: u64,
    #[serde(deserialize_with = "bool_from_any")]
    pub(crate) waslead: bool,
    pub(crate) polltype: String,
    #[serde(default, deserialize_with = "opt_uint_from_any")]
    pub(crate) anscnt: Option<u32>,
    #[serde(default, deserialize_with = "opt_uint_from_any")]
    pub(crate) total_voted: Option<u32>,
}

impl WireQuestionSummary {
    pub(crate) fn into_summary(
        self,
        categories: &Categories,
    ) -> Result<QuestionSummary, OtvetError> {
        let poll_type = poll_type(&self.polltype)?;
        let answer_count = if poll_type.is_poll() {
            self.total_voted
        } else {
            self.anscnt
        }
        .ok_or_else(|| OtvetError::parse("question entry without an answer count"))?;
        Ok(QuestionSummary {
            id: self.id,
            title: self.qtext,
            category: category(categories, self.cid)?,
            state: state(&self.state)?,
            age_seconds: self.added,
            is_leader: self.waslead,
            poll_type,
            answer_count,
        })
    }
}

/// Item of the main question listings.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireQuestionPreview {
    #[serde(flatten)]
    pub(crate) question: WireQuestionSummary,
    #[serde(flatten)]
    pub(crate) author: WireUser,
}

impl WireQuestionPreview {
    pub(crate) fn into_preview(
        self,
        categories: &Categories,
    ) -> Result<QuestionPreview, OtvetError> {
        Ok(QuestionPreview {
            question: self.question.into_summary(categories)?,
            author: self.author.into_preview()?,
        })
    }
}

/// Item of the best-questions rating listing.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireBestQuestionPreview {
    #[serde(flatten)]
    pub(crate) question: WireQuestionSummary,
    #[serde(flatten)]
    pub(crate) author: WireUser,
    #[serde(default, deserialize_with = "opt_bool_from_any")]
    pub(crate) canmark: Option<bool>,
    #[serde(rename = "sum", deserialize_with = "uint_from_any")]
    pub(crate) like_count: u32,
}

impl WireBestQuestionPreview {
    pub(crate) fn into_preview(
        self,
        categories: &Categories,
    ) -> Result<BestQuestionPreview, OtvetError> {
        Ok(BestQuestionPreview {
            question: self.question.into_summary(categories)?,
            author: self.author.into_preview()?,
            can_like: self.canmark.unwrap_or(false),
            like_count: self.like_count,
        })
    }
}

/// Item of a user's own questions listing; carries no author block.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireUserQuestionPreview {
    #[serde(flatten)]
    pub(crate) question: WireQuestionSummary,
    #[serde(deserialize_with = "bool_from_any")]
    pub(crate) hidden: bool,
}

impl WireUserQuestionPreview {
    pub(crate) fn into_preview(
        self,
        categories: &Categories,
    ) -> Result<UserQuestionPreview, OtvetError> {
        Ok(UserQuestionPreview {
            question: self.question.into_summary(categories)?,
            is_hidden: self.hidden,
        })
    }
}

// ============================================================================
// Full question
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireAddition {
    #[serde(deserialize_with = "uint_from_any")]
    pub(crate) adnid: u64,
    #[serde(deserialize_with = "uint_from_any")]
    pub(crate) added: u64,
    pub(crate) atext: String,
}

impl WireAddition {
    fn into_addition(self) -> QuestionAddition {
        QuestionAddition {
            id: self.adnid,
            age_seconds: self.added,
            text: self.atext,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WirePollOption {
    #[serde(deserialize_with = "uint_from_any")]
    pub(crate) optid: u64,
    pub(crate) text: String,
    #[serde(deserialize_with = "uint_from_any")]
    pub(crate) vote: u32,
    #[serde(deserialize_with = "bool_from_any")]
    pub(crate) ivoted: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WirePoll {
    #[serde(rename = "type")]
    pub(crate) poll_type: String,
    #[serde(deserialize_with = "uint_from_any")]
    pub(crate) total_voted: u32,
    pub(crate) options: Vec<WirePollOption>,
}

impl WirePoll {
    fn into_poll(self) -> Result<Poll, OtvetError> {
        let options: Vec<PollOption> = self
            .options
            .into_iter()
            .map(|option| PollOption {
                id: option.optid,
                text: option.text,
                vote_count: option.vote,
                my_vote: option.ivoted,
            })
            .collect();
        Ok(Poll {
            poll_type: poll_type(&self.poll_type)?,
            vote_count: self.total_voted,
            i_voted: options.iter().any(|option| option.my_vote),
            options,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireReplyReason {
    pub(crate) error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireDeletedBy {
    #[serde(deserialize_with = "uint_from_any")]
    pub(crate) id: u64,
}

/// Reply of the single-question endpoint.
///
/// The author block sits flattened next to the question's own fields. When
/// a best answer exists it is served both under `best` and by id under
/// `bestanswer`; the answers list may repeat it.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireQuestion {
    #[serde(deserialize_with = "uint_from_any")]
    pub(crate) qid: u64,
    pub(crate) qtext: String,
    pub(crate) qcomment: String,
    pub(crate) state: String,
    #[serde(deserialize_with = "uint_from_any")]
    pub(crate) cid: u64,
    #[serde(deserialize_with = "uint_from_any")]
    pub(crate) added: u64,
    #[serde(deserialize_with = "int_from_any")]
    pub(crate) created_at: i64,
    #[serde(deserialize_with = "bool_from_any")]
    pub(crate) waslead: bool,
    pub(crate) polltype: String,
    #[serde(deserialize_with = "uint_from_any")]
    pub(crate) anscnt: u32,
    #[serde(flatten)]
    pub(crate) author: WireUser,
    #[serde(deserialize_with = "bool_from_any")]
    pub(crate) acanselbest: bool,
    #[serde(deserialize_with = "uint_from_any")]
    pub(crate) arating: u32,
    #[serde(deserialize_with = "uint_from_any")]
    pub(crate) totalmarks: u32,
    #[serde(deserialize_with = "uint_from_any")]
    pub(crate) comcnt: u32,
    #[serde(deserialize_with = "bool_from_any")]
    pub(crate) cancomment: bool,
    #[serde(default, deserialize_with = "opt_bool_from_any")]
    pub(crate) canmark: Option<bool>,
    #[serde(deserialize_with = "bool_from_any")]
    pub(crate) canreply: bool,
    #[serde(default)]
    pub(crate) canreplyreason: Option<WireReplyReason>,
    #[serde(deserialize_with = "bool_from_any")]
    pub(crate) hidden: bool,
    #[serde(deserialize_with = "bool_from_any")]
    pub(crate) watcher: bool,
    #[serde(default)]
    pub(crate) marked: Vec<WireSmallUser>,
    #[serde(default)]
    pub(crate) answers: Vec<WireAnswer>,
    #[serde(default)]
    pub(crate) best: Option<WireAnswer>,
    #[serde(default)]
    pub(crate) bestanswer: Option<Value>,
    #[serde(default)]
    pub(crate) adds: Vec<WireAddition>,
    #[serde(default)]
    pub(crate) poll: Option<WirePoll>,
    #[serde(default)]
    pub(crate) deleted_by: Option<WireDeletedBy>,
}

impl WireQuestion {
    pub(crate) fn into_question(self, categories: &Categories) -> Result<Question, OtvetError> {
        let mut answers: Vec<Answer> = Vec::new();
        for entry in self.best.into_iter().chain(self.answers) {
            let answer = entry.into_answer()?;
            if answers.iter().all(|existing| existing.id != answer.id) {
                answers.push(answer);
            }
        }
        let best_answer = raw_id(self.bestanswer.as_ref())
            .and_then(|id| answers.iter().find(|answer| answer.id == id).cloned());
        let liked_by = self
            .marked
            .into_iter()
            .map(WireSmallUser::into_small_user)
            .collect::<Result<Vec<_>, _>>()?;
        let created_at = DateTime::<Utc>::from_timestamp(self.created_at, 0)
            .ok_or_else(|| OtvetError::parse("question timestamp out of range"))?;
        Ok(Question {
            id: self.qid,
            title: self.qtext,
            text: self.qcomment,
            category: category(categories, self.cid)?,
            state: state(&self.state)?,
            age_seconds: self.added,
            created_at,
            is_leader: self.waslead,
            poll_type: poll_type(&self.polltype)?,
            answer_count: self.anscnt,
            author: self.author.into_user()?,
            answers,
            best_answer,
            best_answer_vote_count: self.arating,
            can_choose_best_answer: self.acanselbest,
            liked_by,
            like_count: self.totalmarks,
            additions: self.adds.into_iter().map(WireAddition::into_addition).collect(),
            comment_count: self.comcnt,
            can_comment: self.cancomment,
            can_like: self.canmark.unwrap_or(false),
            can_answer: self.canreply,
            cannot_answer_reason: self.canreplyreason.and_then(|reason| reason.error),
            is_hidden: self.hidden,
            is_watching: self.watcher,
            poll: self.poll.map(WirePoll::into_poll).transpose()?,
            deleted_by_id: self.deleted_by.map(|moderator| moderator.id),
        })
    }
}

// ============================================================================
// Search results
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireSearchAuthor {
    #[serde(deserialize_with = "uint_from_any")]
    pub(crate) id: u64,
    pub(crate) nick: String,
    pub(crate) filin: String,
}

/// Hit from the search backend, which speaks its own dialect: the category
/// comes as a display name and the state as a small index.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireSearchResult {
    #[serde(deserialize_with = "uint_from_any")]
    pub(crate) id: u64,
    pub(crate) question: String,
    #[serde(default)]
    pub(crate) qstcomment: Option<String>,
    #[serde(deserialize_with = "uint_from_any")]
    pub(crate) count: u32,
    pub(crate) catname: String,
    #[serde(deserialize_with = "int_from_any")]
    pub(crate) state: i64,
    #[serde(deserialize_with = "bool_from_any")]
    pub(crate) is_poll: bool,
    #[serde(deserialize_with = "int_from_any")]
    pub(crate) time: i64,
    #[serde(deserialize_with = "uint_from_any")]
    pub(crate) time_ago: u64,
    pub(crate) author: WireSearchAuthor,
}

impl WireSearchResult {
    pub(crate) fn into_result(
        self,
        categories: &Categories,
    ) -> Result<QuestionSearchResult, OtvetError> {
        let state = match self.state {
            0 => None,
            1 => Some(QuestionState::Resolve),
            2 => Some(QuestionState::Vote),
            3 => Some(QuestionState::Open),
            other => {
                return Err(OtvetError::parse(format!(
                    "unknown search state index: {other}"
                )));
            }
        };
        let category = categories.by_name(&self.catname).cloned().ok_or_else(|| {
            OtvetError::parse(format!("unknown category name: {:?}", self.catname))
        })?;
        let created_at = DateTime::<Utc>::from_timestamp(self.time, 0)
            .ok_or_else(|| OtvetError::parse("question timestamp out of range"))?;
        Ok(QuestionSearchResult {
            id: self.id,
            title: self.question,
            text: self.qstcomment.unwrap_or_default(),
            category,
            answer_count: self.count,
            state,
            is_poll: self.is_poll,
            created_at,
            age_seconds: self.time_ago,
            author: MinimalUserPreview {
                id: self.author.id,
                name: self.author.nick,
                avatar: Avatar {
                    filin: self.author.filin,
                },
            },
        })
    }
}

// ============================================================================
// Shared lookups
// ============================================================================

fn category(categories: &Categories, cid: u64) -> Result<Category, OtvetError> {
    categories
        .by_id(cid)
        .cloned()
        .ok_or_else(|| OtvetError::parse(format!("unknown category id: {cid}")))
}

fn state(code: &str) -> Result<QuestionState, OtvetError> {
    QuestionState::from_code(code)
        .ok_or_else(|| OtvetError::parse(format!("unknown question state code: {code:?}")))
}

fn poll_type(code: &str) -> Result<PollType, OtvetError> {
    PollType::from_code(code)
        .ok_or_else(|| OtvetError::parse(format!("unknown poll type code: {code:?}")))
}

/// Id value the service serialized as either a number or a string. Anything
/// else reads as "not there", matching how the id is used for lookups.
fn raw_id(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.parse().ok(),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================
