//! Answer payload shapes.

use serde::Deserialize;

use otvet_core::serde_helpers::{
    bool_from_any, opt_bool_from_any, opt_int_from_any, opt_uint_from_any, uint_from_any,
};
use otvet_core::{
    Answer, AnswerPreview, Avatar, Categories, MinimalQuestionPreview, MinimalUserPreview,
    PollType, QuestionState, QuestionSummary, ThankStatus,
};

use crate::error::OtvetError;
use crate::wire::user::WireUser;

// ============================================================================
// Full answer
// ============================================================================

/// Answer as served inside a question or an answer listing. The author
/// block sits flattened next to the answer's own fields.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireAnswer {
    #[serde(deserialize_with = "uint_from_any")]
    pub(crate) id: u64,
    pub(crate) atext: String,
    pub(crate) source: String,
    #[serde(deserialize_with = "uint_from_any")]
    pub(crate) added: u64,
    #[serde(default, deserialize_with = "opt_bool_from_any")]
    pub(crate) canmark: Option<bool>,
    #[serde(default, deserialize_with = "opt_bool_from_any")]
    pub(crate) canth: Option<bool>,
    #[serde(default, deserialize_with = "opt_int_from_any")]
    pub(crate) canth_status: Option<i64>,
    #[serde(deserialize_with = "uint_from_any")]
    pub(crate) totalmarks: u32,
    #[serde(default, deserialize_with = "opt_uint_from_any")]
    pub(crate) comcnt: Option<u32>,
    #[serde(default, deserialize_with = "opt_uint_from_any")]
    pub(crate) rating: Option<u32>,
    #[serde(flatten)]
    pub(crate) author: WireUser,
}

impl WireAnswer {
    pub(crate) fn into_answer(self) -> Result<Answer, OtvetError> {
        let code = self.canth_status.unwrap_or(0);
        let thank_status = ThankStatus::from_code(code)
            .ok_or_else(|| OtvetError::parse(format!("unknown thank status code: {code}")))?;
        Ok(Answer {
            id: self.id,
            author: self.author.into_user()?,
            text: self.atext,
            source: self.source,
            age_seconds: self.added,
            can_like: self.canmark.unwrap_or(false),
            can_thank: self.canth.unwrap_or(false),
            thank_status,
            like_count: self.totalmarks,
            comment_count: self.comcnt.unwrap_or(0),
            vote_count: self.rating.unwrap_or(0),
        })
    }
}

// ============================================================================
// Listing preview
// ============================================================================

/// Item of a user's answers listing. Everything about the answered question
/// comes inline with `q`-prefixed keys, and polls never appear here.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireAnswerPreview {
    #[serde(deserialize_with = "uint_from_any")]
    pub(crate) aid: u64,
    #[serde(deserialize_with = "uint_from_any")]
    pub(crate) aadded: u64,
    pub(crate) atext: String,
    #[serde(deserialize_with = "bool_from_any")]
    pub(crate) best: bool,
    #[serde(deserialize_with = "uint_from_any")]
    pub(crate) qid: u64,
    pub(crate) qtext: String,
    pub(crate) qstate: String,
    #[serde(deserialize_with = "uint_from_any")]
    pub(crate) cid: u64,
    #[serde(deserialize_with = "uint_from_any")]
    pub(crate) qadded: u64,
    #[serde(deserialize_with = "bool_from_any")]
    pub(crate) waslead: bool,
    #[serde(deserialize_with = "uint_from_any")]
    pub(crate) anscnt: u32,
    #[serde(deserialize_with = "uint_from_any")]
    pub(crate) qusrid: u64,
    pub(crate) qnick: String,
    pub(crate) qfilin: String,
}

impl WireAnswerPreview {
    pub(crate) fn into_preview(
        self,
        categories: &Categories,
    ) -> Result<AnswerPreview, OtvetError> {
        let category = categories
            .by_id(self.cid)
            .cloned()
            .ok_or_else(|| OtvetError::parse(format!("unknown category id: {}", self.cid)))?;
        let state = QuestionState::from_code(&self.qstate).ok_or_else(|| {
            OtvetError::parse(format!("unknown question state code: {:?}", self.qstate))
        })?;
        Ok(AnswerPreview {
            id: self.aid,
            text: self.atext,
            age_seconds: self.aadded,
            is_best: self.best,
            question: MinimalQuestionPreview {
                question: QuestionSummary {
                    id: self.qid,
                    title: self.qtext,
                    category,
                    state,
                    age_seconds: self.qadded,
                    is_leader: self.waslead,
                    poll_type: PollType::None,
                    answer_count: self.anscnt,
                },
                author: MinimalUserPreview {
                    id: self.qusrid,
                    name: self.qnick,
                    avatar: Avatar { filin: self.qfilin },
                },
            },
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use otvet_core::CategoryNode;

    fn catalog() -> Categories {
        let roots: Vec<CategoryNode> = serde_json::from_str(
            r#"[{"id": 33, "urlname": "food", "name": "Еда, Кулинария",
                 "position": 1, "readonly": 0}]"#,
        )
        .unwrap();
        Categories::new(roots)
    }

    #[test]
    fn test_answer() {
        let json = r#"{
            "id": "210987", "atext": "Вот так.", "source": "опыт",
            "added": "360", "canmark": 1, "canth": "1", "canth_status": -1,
            "totalmarks": "4", "comcnt": 2, "rating": 9,
            "usrid": 77, "nick": "знаток", "vip": 0, "kpd": "41.5",
            "about": "", "filin": "pic", "is_expert": 0, "points": 300
        }"#;
        let answer = serde_json::from_str::<WireAnswer>(json)
            .unwrap()
            .into_answer()
            .unwrap();
        assert_eq!(answer.id, 210_987);
        assert_eq!(answer.source, "опыт");
        assert_eq!(answer.thank_status, ThankStatus::Hidden);
        assert!(answer.can_like);
        assert!(answer.can_thank);
        assert_eq!(answer.like_count, 4);
        assert_eq!(answer.comment_count, 2);
        assert_eq!(answer.vote_count, 9);
        assert_eq!(answer.author.rate.unwrap().name, "Знаток");
    }

    #[test]
    fn test_answer_defaults() {
        // Poll-vote payloads omit the mark and comment counters.
        let json = r#"{
            "id": 1, "atext": "да", "source": "", "added": 5,
            "totalmarks": 0,
            "usrid": 2, "nick": "x", "vip": 0, "kpd": 0, "about": "",
            "filin": "f", "is_expert": 0
        }"#;
        let answer = serde_json::from_str::<WireAnswer>(json)
            .unwrap()
            .into_answer()
            .unwrap();
        assert_eq!(answer.thank_status, ThankStatus::None);
        assert!(!answer.can_like);
        assert!(!answer.can_thank);
        assert_eq!(answer.comment_count, 0);
        assert_eq!(answer.vote_count, 0);
    }

    #[test]
    fn test_answer_preview() {
        let json = r#"{
            "aid": "500600", "aadded": "60", "atext": "Ответил так", "best": "1",
            "qid": "243000111", "qtext": "Как сварить борщ?", "qstate": "R",
            "cid": "33", "qadded": "7200", "waslead": 0, "anscnt": "15",
            "qusrid": "42", "qnick": "повар", "qfilin": "chef"
        }"#;
        let preview = serde_json::from_str::<WireAnswerPreview>(json)
            .unwrap()
            .into_preview(&catalog())
            .unwrap();
        assert_eq!(preview.id, 500_600);
        assert!(preview.is_best);
        assert_eq!(preview.question.question.id, 243_000_111);
        assert_eq!(preview.question.question.state, QuestionState::Resolve);
        assert_eq!(preview.question.question.poll_type, PollType::None);
        assert_eq!(preview.question.question.category.urlname, "food");
        assert_eq!(preview.question.author.name, "повар");
    }
}
