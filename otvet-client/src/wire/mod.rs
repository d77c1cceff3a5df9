//! Raw response shapes of the API.
//!
//! The service serializes loosely: numbers arrive as strings or numbers,
//! flags as booleans or 0/1 in either form, and optional blocks come and go
//! between endpoints. The structs here mirror payloads exactly as served and
//! convert into the models from [`otvet_core`], resolving category ids and
//! rank names against the loaded catalogs. Anything the payload leaves
//! underspecified surfaces as [`OtvetError::Parse`] at conversion time, not
//! as a broken model value later.

mod answer;
mod question;
mod user;

pub(crate) use answer::{WireAnswer, WireAnswerPreview};
pub(crate) use question::{
    WireBestQuestionPreview, WireQuestion, WireQuestionPreview, WireSearchResult,
    WireUserQuestionPreview,
};
pub(crate) use user::{WireProfile, WireSmallUser};

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use otvet_core::serde_helpers::uint_from_any;
use otvet_core::{LimitSet, Limits};

use crate::error::OtvetError;

// ============================================================================
// Envelopes
// ============================================================================

/// Pulls the item array out of a listing reply.
///
/// Listing endpoints wrap their items under an endpoint-specific key
/// (`qst`, `answers`, `users`, `marked`, `results`). A missing or `null`
/// key reads as an empty listing.
pub(crate) fn take_list<T: DeserializeOwned>(
    mut reply: Value,
    key: &str,
) -> Result<Vec<T>, OtvetError> {
    match reply.get_mut(key).map(Value::take) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(OtvetError::from))
            .collect(),
        Some(other) => Err(OtvetError::parse(format!(
            "expected {key:?} to hold a list, got {other}"
        ))),
    }
}

// ============================================================================
// Limits
// ============================================================================

/// One row of the daily limits table. The service abbreviates each action
/// to a three-letter code.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireLimitSet {
    #[serde(rename = "ASK", deserialize_with = "uint_from_any")]
    pub(crate) questions: u32,
    #[serde(rename = "DIQ", deserialize_with = "uint_from_any")]
    pub(crate) direct_questions: u32,
    #[serde(rename = "AAQ", deserialize_with = "uint_from_any")]
    pub(crate) answers: u32,
    #[serde(rename = "VBA", deserialize_with = "uint_from_any")]
    pub(crate) best_answer_votes: u32,
    #[serde(rename = "OPV", deserialize_with = "uint_from_any")]
    pub(crate) poll_votes: u32,
    #[serde(rename = "QAM", deserialize_with = "uint_from_any")]
    pub(crate) likes: u32,
    #[serde(rename = "IMQ", deserialize_with = "uint_from_any")]
    pub(crate) photos: u32,
    #[serde(rename = "VIQ", deserialize_with = "uint_from_any")]
    pub(crate) videos: u32,
    #[serde(rename = "GSR", deserialize_with = "uint_from_any")]
    pub(crate) best_question_recommends: u32,
}

/// Reply of the daily limits endpoint.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireLimits {
    pub(crate) total: WireLimitSet,
    pub(crate) current: WireLimitSet,
}

impl WireLimitSet {
    fn into_set(self) -> LimitSet {
        LimitSet {
            questions: self.questions,
            direct_questions: self.direct_questions,
            answers: self.answers,
            best_answer_votes: self.best_answer_votes,
            poll_votes: self.poll_votes,
            likes: self.likes,
            photos: self.photos,
            videos: self.videos,
            best_question_recommends: self.best_question_recommends,
        }
    }
}

impl WireLimits {
    pub(crate) fn into_limits(self) -> Limits {
        Limits {
            total: self.total.into_set(),
            current: self.current.into_set(),
        }
    }
}

// ============================================================================
// Creation replies
// ============================================================================

/// Reply of the ask endpoint; carries the new question's id.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireNewQuestion {
    #[serde(deserialize_with = "uint_from_any")]
    pub(crate) qid: u64,
}

/// Reply of the answer endpoint.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireNewAnswer {
    pub(crate) result: WireNewAnswerId,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireNewAnswerId {
    #[serde(deserialize_with = "uint_from_any")]
    pub(crate) id: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_take_list() {
        let reply = json!({"status": 200, "qst": [1, 2, 3]});
        let items: Vec<u64> = take_list(reply, "qst").unwrap();
        assert_eq!(items, vec![1, 2, 3]);
    }

    #[test]
    fn test_take_list_missing_key_is_empty() {
        let items: Vec<u64> = take_list(json!({"status": 200}), "qst").unwrap();
        assert!(items.is_empty());
        let items: Vec<u64> = take_list(json!({"qst": null}), "qst").unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_take_list_rejects_non_list() {
        let result: Result<Vec<u64>, _> = take_list(json!({"qst": "nope"}), "qst");
        assert!(matches!(result, Err(OtvetError::Parse(_))));
    }

    #[test]
    fn test_limits() {
        let json = r#"{
            "total": {"ASK": 15, "DIQ": 5, "AAQ": 100, "VBA": 50, "OPV": 30,
                      "QAM": 100, "IMQ": 10, "VIQ": 5, "GSR": 3},
            "current": {"ASK": "14", "DIQ": 5, "AAQ": 99, "VBA": 50, "OPV": 30,
                        "QAM": 100, "IMQ": 10, "VIQ": 5, "GSR": 3}
        }"#;
        let limits = serde_json::from_str::<WireLimits>(json).unwrap().into_limits();
        assert_eq!(limits.total.questions, 15);
        assert_eq!(limits.current.questions, 14);
        assert_eq!(limits.current.answers, 99);
    }

    #[test]
    fn test_creation_replies() {
        let question: WireNewQuestion =
            serde_json::from_value(json!({"status": 200, "qid": "243100000"})).unwrap();
        assert_eq!(question.qid, 243_100_000);

        let answer: WireNewAnswer =
            serde_json::from_value(json!({"result": {"id": 512, "ok": 1}})).unwrap();
        assert_eq!(answer.result.id, 512);
    }
}
