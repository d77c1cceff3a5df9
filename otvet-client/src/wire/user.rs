//! User payload shapes.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use otvet_core::serde_helpers::{
    bool_from_any, f64_from_any, opt_int_from_any, opt_uint_from_any, uint_from_any,
};
use otvet_core::{
    Avatar, Brand, BrandAffiliation, BrandSmallUserPreview, OwnProfileStats, PollVoter, Rate,
    SmallUser, SmallUserPreview, User, UserPreview, UserProfile,
};

use crate::error::OtvetError;

// ============================================================================
// Compact user entries
// ============================================================================

/// Compact user entry from like lists and poll voter listings.
///
/// Regular members carry `lvl`, the rank name. Brand accounts drop it and
/// carry `brand_cid` plus `brand` instead; presence of `brand_cid` is the
/// only discriminator.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireSmallUser {
    #[serde(deserialize_with = "uint_from_any")]
    pub(crate) id: u64,
    pub(crate) nick: String,
    pub(crate) filin: String,
    pub(crate) lvl: Option<String>,
    #[serde(default, deserialize_with = "opt_uint_from_any")]
    pub(crate) brand_cid: Option<u64>,
    pub(crate) brand: Option<String>,
    /// Only the poll voter listing exposes this.
    pub(crate) email: Option<String>,
}

impl WireSmallUser {
    pub(crate) fn into_small_user(self) -> Result<SmallUser, OtvetError> {
        let avatar = Avatar { filin: self.filin };
        match self.brand_cid {
            Some(brand_id) => Ok(SmallUser::Brand(BrandSmallUserPreview {
                id: self.id,
                name: self.nick,
                avatar,
                brand_id,
                brand_description: self
                    .brand
                    .ok_or_else(|| OtvetError::parse("brand entry without a description"))?,
            })),
            None => Ok(SmallUser::Member(SmallUserPreview {
                id: self.id,
                name: self.nick,
                avatar,
                rate: rank(self.lvl.as_deref())?,
            })),
        }
    }

    pub(crate) fn into_voter(self) -> Result<PollVoter, OtvetError> {
        Ok(PollVoter {
            id: self.id,
            name: self.nick,
            avatar: Avatar { filin: self.filin },
            rate: rank(self.lvl.as_deref())?,
            email: self
                .email
                .ok_or_else(|| OtvetError::parse("voter entry without an email"))?,
        })
    }
}

fn rank(name: Option<&str>) -> Result<Rate, OtvetError> {
    let name = name.ok_or_else(|| OtvetError::parse("user entry without a rank name"))?;
    Rate::by_name(name).ok_or_else(|| OtvetError::parse(format!("unknown rank name: {name:?}")))
}

// ============================================================================
// Embedded users
// ============================================================================

/// User block embedded in questions, answers, and listing previews.
///
/// The same key set serves two detail levels: previews stop at `is_expert`,
/// full embeddings add points and the brand block. Brand data applies only
/// when `brand_url` is a non-empty string.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireUser {
    #[serde(deserialize_with = "uint_from_any")]
    pub(crate) usrid: u64,
    pub(crate) nick: String,
    #[serde(deserialize_with = "bool_from_any")]
    pub(crate) vip: bool,
    #[serde(deserialize_with = "f64_from_any")]
    pub(crate) kpd: f64,
    pub(crate) about: String,
    pub(crate) filin: Option<String>,
    /// Avatar override some embeddings use instead of `filin`.
    pub(crate) ofilin: Option<String>,
    #[serde(deserialize_with = "bool_from_any")]
    pub(crate) is_expert: bool,
    #[serde(default, deserialize_with = "opt_uint_from_any")]
    pub(crate) points: Option<u32>,
    pub(crate) brand_url: Option<String>,
    pub(crate) url: Option<String>,
    pub(crate) brand: Option<String>,
    pub(crate) role: Option<String>,
}

impl WireUser {
    /// Listing author at preview detail.
    pub(crate) fn into_preview(self) -> Result<UserPreview, OtvetError> {
        Ok(UserPreview {
            id: self.usrid,
            name: self.nick,
            avatar: Avatar {
                filin: self
                    .filin
                    .ok_or_else(|| OtvetError::parse("author entry without an avatar"))?,
            },
            is_vip: self.vip,
            kpd: self.kpd,
            about: self.about,
            is_expert: self.is_expert,
        })
    }

    /// Full embedded user, with rank and brand data when present.
    pub(crate) fn into_user(self) -> Result<User, OtvetError> {
        let rate = self.points.map(|points| Rate::by_user_stats(points, self.kpd));
        let brand = match self.brand_url {
            Some(urlname) if !urlname.is_empty() => Some(BrandAffiliation {
                brand: Brand {
                    urlname,
                    site_url: self
                        .url
                        .ok_or_else(|| OtvetError::parse("brand entry without a site url"))?,
                    description: self
                        .brand
                        .ok_or_else(|| OtvetError::parse("brand entry without a description"))?,
                },
                role: self
                    .role
                    .ok_or_else(|| OtvetError::parse("brand entry without a role"))?,
            }),
            _ => None,
        };
        let filin = self
            .ofilin
            .or(self.filin)
            .ok_or_else(|| OtvetError::parse("user entry without an avatar"))?;
        Ok(User {
            id: self.usrid,
            name: self.nick,
            avatar: Avatar { filin },
            is_vip: self.vip,
            kpd: self.kpd,
            about: self.about,
            is_expert: self.is_expert,
            points: self.points,
            rate,
            brand,
        })
    }
}

// ============================================================================
// Profiles
// ============================================================================

/// Counter block of the profile endpoint. The direct/removed counters show
/// up only on the viewer's own profile.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireProfileCounters {
    #[serde(deserialize_with = "uint_from_any")]
    pub(crate) deleted_answers: u32,
    #[serde(deserialize_with = "uint_from_any")]
    pub(crate) questions_new: u32,
    #[serde(deserialize_with = "uint_from_any")]
    pub(crate) questions_voting: u32,
    #[serde(deserialize_with = "uint_from_any")]
    pub(crate) questions_resolved: u32,
    #[serde(deserialize_with = "uint_from_any")]
    pub(crate) followers: u32,
    #[serde(default, deserialize_with = "opt_uint_from_any")]
    pub(crate) questions_direct: Option<u32>,
    #[serde(default, deserialize_with = "opt_uint_from_any")]
    pub(crate) questions_removed: Option<u32>,
}

/// Reply of the profile endpoint.
///
/// The payload does not repeat the user id, so conversion takes it from the
/// request. A `maillogin` key marks the viewer's own profile and unlocks
/// the private counter block.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireProfile {
    pub(crate) snick: String,
    #[serde(deserialize_with = "uint_from_any")]
    pub(crate) spoints: u32,
    pub(crate) srank: String,
    pub(crate) description: String,
    #[serde(deserialize_with = "f64_from_any")]
    pub(crate) skpd: f64,
    #[serde(deserialize_with = "bool_from_any")]
    pub(crate) is_expert: bool,
    #[serde(deserialize_with = "bool_from_any")]
    pub(crate) vip: bool,
    #[serde(deserialize_with = "bool_from_any")]
    pub(crate) banned: bool,
    #[serde(deserialize_with = "bool_from_any")]
    pub(crate) subscribed: bool,
    #[serde(deserialize_with = "bool_from_any")]
    pub(crate) hidden: bool,
    #[serde(deserialize_with = "uint_from_any")]
    pub(crate) place: u32,
    #[serde(deserialize_with = "uint_from_any")]
    pub(crate) sans: u32,
    #[serde(deserialize_with = "uint_from_any")]
    pub(crate) sbans: u32,
    #[serde(deserialize_with = "uint_from_any")]
    pub(crate) sqst: u32,
    #[serde(deserialize_with = "uint_from_any")]
    pub(crate) black_cnt: u32,
    #[serde(deserialize_with = "uint_from_any")]
    pub(crate) following: u32,
    #[serde(deserialize_with = "uint_from_any")]
    pub(crate) weekpoints: u32,
    pub(crate) cnt: WireProfileCounters,
    pub(crate) sfilin: Option<String>,
    pub(crate) filin: Option<String>,
    pub(crate) maillogin: Option<String>,
    #[serde(default, deserialize_with = "opt_uint_from_any")]
    pub(crate) watchcnt: Option<u32>,
    #[serde(default, deserialize_with = "opt_int_from_any")]
    pub(crate) ban_until: Option<i64>,
}

impl WireProfile {
    pub(crate) fn into_profile(self, user_id: u64) -> Result<UserProfile, OtvetError> {
        let rate = Rate::by_name(&self.srank)
            .ok_or_else(|| OtvetError::parse(format!("unknown rank name: {:?}", self.srank)))?;
        let filin = self
            .sfilin
            .or(self.filin)
            .ok_or_else(|| OtvetError::parse("profile without an avatar"))?;
        let own_stats = match self.maillogin {
            Some(_) => Some(OwnProfileStats {
                watching_question_count: self
                    .watchcnt
                    .ok_or_else(|| OtvetError::parse("own profile without a watch counter"))?,
                direct_question_count: self.cnt.questions_direct.ok_or_else(|| {
                    OtvetError::parse("own profile without a direct question counter")
                })?,
                removed_question_count: self.cnt.questions_removed.ok_or_else(|| {
                    OtvetError::parse("own profile without a removed question counter")
                })?,
                banned_until: self
                    .ban_until
                    .map(|stamp| {
                        DateTime::<Utc>::from_timestamp(stamp, 0)
                            .ok_or_else(|| OtvetError::parse("ban timestamp out of range"))
                    })
                    .transpose()?,
            }),
            None => None,
        };
        Ok(UserProfile {
            id: user_id,
            name: self.snick,
            avatar: Avatar { filin },
            is_vip: self.vip,
            kpd: self.skpd,
            about: self.description,
            is_expert: self.is_expert,
            points: self.spoints,
            rate,
            is_banned: self.banned,
            is_followed_by_me: self.subscribed,
            is_hidden: self.hidden,
            place: self.place,
            answer_count: self.sans,
            best_answer_count: self.sbans,
            deleted_answer_count: self.cnt.deleted_answers,
            question_count: self.sqst,
            open_question_count: self.cnt.questions_new,
            voting_question_count: self.cnt.questions_voting,
            resolved_question_count: self.cnt.questions_resolved,
            blacklisted_count: self.black_cnt,
            followers_count: self.cnt.followers,
            following_count: self.following,
            week_points: self.weekpoints,
            own_stats,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_user_member_and_brand() {
        let json = r#"[
            {"id": "184548231", "nick": "Вася", "filin": "f1", "lvl": "Гуру"},
            {"id": 900, "nick": "Acme", "filin": "f2",
             "brand_cid": "32", "brand": "Acme support team"}
        ]"#;
        let entries: Vec<WireSmallUser> = serde_json::from_str(json).unwrap();
        let users: Vec<SmallUser> = entries
            .into_iter()
            .map(WireSmallUser::into_small_user)
            .collect::<Result<_, _>>()
            .unwrap();

        match &users[0] {
            SmallUser::Member(member) => {
                assert_eq!(member.id, 184_548_231);
                assert_eq!(member.rate.name, "Гуру");
            }
            SmallUser::Brand(_) => panic!("expected a member"),
        }
        match &users[1] {
            SmallUser::Brand(brand) => {
                assert_eq!(brand.brand_id, 32);
                assert_eq!(brand.brand_description, "Acme support team");
            }
            SmallUser::Member(_) => panic!("expected a brand"),
        }
    }

    #[test]
    fn test_small_user_unknown_rank() {
        let json = r#"{"id": 1, "nick": "x", "filin": "f", "lvl": "Новичок-космонавт"}"#;
        let entry: WireSmallUser = serde_json::from_str(json).unwrap();
        assert!(matches!(
            entry.into_small_user(),
            Err(OtvetError::Parse(_))
        ));
    }

    #[test]
    fn test_voter_requires_email() {
        let json = r#"{"id": 1, "nick": "x", "filin": "f", "lvl": "Ученик"}"#;
        let entry: WireSmallUser = serde_json::from_str(json).unwrap();
        assert!(matches!(entry.into_voter(), Err(OtvetError::Parse(_))));
    }

    #[test]
    fn test_user_without_points_has_no_rate() {
        let json = r#"{"usrid": "5", "nick": "x", "vip": 0, "kpd": "12.5",
                       "about": "", "filin": "f", "is_expert": false}"#;
        let user = serde_json::from_str::<WireUser>(json)
            .unwrap()
            .into_user()
            .unwrap();
        assert_eq!(user.points, None);
        assert_eq!(user.rate, None);
        assert!(user.brand.is_none());
    }

    #[test]
    fn test_user_with_brand_and_avatar_override() {
        let json = r#"{"usrid": 5, "nick": "Acme rep", "vip": 1, "kpd": 44.0,
                       "about": "support", "filin": "small", "ofilin": "big",
                       "is_expert": true, "points": "2600",
                       "brand_url": "acme", "url": "https://acme.example",
                       "brand": "Acme Inc", "role": "support engineer"}"#;
        let user = serde_json::from_str::<WireUser>(json)
            .unwrap()
            .into_user()
            .unwrap();
        assert_eq!(user.avatar.filin, "big");
        assert_eq!(user.rate.unwrap().name, "Гуру");
        let affiliation = user.brand.unwrap();
        assert_eq!(affiliation.brand.urlname, "acme");
        assert_eq!(affiliation.role, "support engineer");
    }

    #[test]
    fn test_empty_brand_url_means_no_brand() {
        let json = r#"{"usrid": 5, "nick": "x", "vip": 0, "kpd": 0,
                       "about": "", "filin": "f", "is_expert": 0, "brand_url": ""}"#;
        let user = serde_json::from_str::<WireUser>(json)
            .unwrap()
            .into_user()
            .unwrap();
        assert!(user.brand.is_none());
    }

    fn profile_json(own: bool) -> String {
        let own_part = if own {
            r#""maillogin": "someone@mail.ru", "watchcnt": 17, "ban_until": 1577836800,"#
        } else {
            ""
        };
        let counters = if own {
            r#"{"deleted_answers": 4, "questions_new": 1, "questions_voting": 0,
                "questions_resolved": 120, "followers": 10,
                "questions_direct": 2, "questions_removed": 1}"#
        } else {
            r#"{"deleted_answers": 4, "questions_new": 1, "questions_voting": 0,
                "questions_resolved": 120, "followers": 10}"#
        };
        format!(
            r#"{{
                "snick": "Вася", "spoints": "5200", "srank": "Мыслитель",
                "description": "обо мне", "skpd": "38.2", "is_expert": false,
                "vip": false, "banned": 0, "subscribed": 1, "hidden": 0,
                "place": "1200", "sans": 3000, "sbans": 1100, "sqst": 140,
                "black_cnt": 2, "following": 8, "weekpoints": 25,
                {own_part}
                "sfilin": "avatar-large",
                "cnt": {counters}
            }}"#
        )
    }

    #[test]
    fn test_foreign_profile() {
        let profile = serde_json::from_str::<WireProfile>(&profile_json(false))
            .unwrap()
            .into_profile(216_185_885)
            .unwrap();
        assert_eq!(profile.id, 216_185_885);
        assert_eq!(profile.rate.name, "Мыслитель");
        assert_eq!(profile.avatar.filin, "avatar-large");
        assert!(profile.is_followed_by_me);
        assert!(profile.own_stats.is_none());
    }

    #[test]
    fn test_own_profile_counters() {
        let profile = serde_json::from_str::<WireProfile>(&profile_json(true))
            .unwrap()
            .into_profile(216_185_885)
            .unwrap();
        let own = profile.own_stats.unwrap();
        assert_eq!(own.watching_question_count, 17);
        assert_eq!(own.direct_question_count, 2);
        assert_eq!(own.removed_question_count, 1);
        let banned_until = own.banned_until.unwrap();
        assert_eq!(banned_until.timestamp(), 1_577_836_800);
    }
}
