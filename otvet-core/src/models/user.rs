//! User-related models.
//!
//! Listings embed users at several levels of detail, from the bare
//! id/name/avatar triple up to the full profile page. Company ("brand")
//! accounts share most fields with regular members but carry extra brand
//! data; where the two shapes diverge they are modeled as distinct types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{Rate, profile_url};
use crate::traits::HasId;

// ============================================================================
// Avatar
// ============================================================================

/// Avatar handle, wrapping the service's `filin` image parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Avatar {
    /// Raw image parameter as returned by the API.
    pub filin: String,
}

impl Avatar {
    /// URL of the avatar image at its default size.
    pub fn url(&self) -> String {
        format!("https://filin.mail.ru/pic?d={}", self.filin)
    }

    /// URL of the avatar image scaled to the given size.
    pub fn url_with_size(&self, width: u32, height: u32) -> String {
        format!("{}&width={width}&height={height}", self.url())
    }
}

impl fmt::Display for Avatar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url())
    }
}

// ============================================================================
// Previews
// ============================================================================

/// Bare author reference: id, name, avatar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MinimalUserPreview {
    /// User id.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Avatar handle.
    pub avatar: Avatar,
}

impl MinimalUserPreview {
    /// Profile page URL.
    pub fn url(&self) -> String {
        profile_url(self.id)
    }
}

/// Compact member reference used in like lists and poll votes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SmallUserPreview {
    /// User id.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Avatar handle.
    pub avatar: Avatar,
    /// Rank shown next to the name.
    pub rate: Rate,
}

impl SmallUserPreview {
    /// Profile page URL.
    pub fn url(&self) -> String {
        profile_url(self.id)
    }
}

/// Compact company-account reference; brands have no rank.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrandSmallUserPreview {
    /// User id of the brand account.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Avatar handle.
    pub avatar: Avatar,
    /// Category id the brand answers in.
    pub brand_id: u64,
    /// Short blurb about the company.
    pub brand_description: String,
}

impl BrandSmallUserPreview {
    /// Profile page URL.
    pub fn url(&self) -> String {
        profile_url(self.id)
    }
}

/// Either kind of compact user reference.
///
/// The wire format carries no discriminator; the mapping layer picks the
/// variant by which brand fields are present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SmallUser {
    /// Regular member.
    Member(SmallUserPreview),
    /// Company account.
    Brand(BrandSmallUserPreview),
}

impl SmallUser {
    /// Display name, whichever variant this is.
    pub fn name(&self) -> &str {
        match self {
            Self::Member(user) => &user.name,
            Self::Brand(user) => &user.name,
        }
    }

    /// Profile page URL.
    pub fn url(&self) -> String {
        profile_url(self.id())
    }
}

impl HasId for SmallUser {
    fn id(&self) -> u64 {
        match self {
            Self::Member(user) => user.id,
            Self::Brand(user) => user.id,
        }
    }
}

/// Author block attached to question previews in listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserPreview {
    /// User id.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Avatar handle.
    pub avatar: Avatar,
    /// Whether the account has VIP status.
    pub is_vip: bool,
    /// Best-answer percentage.
    pub kpd: f64,
    /// Free-text self-description.
    pub about: String,
    /// Whether the service marks this user as an expert.
    pub is_expert: bool,
}

impl UserPreview {
    /// Profile page URL.
    pub fn url(&self) -> String {
        profile_url(self.id)
    }
}

/// Voter entry from a poll's who-voted listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollVoter {
    /// User id.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Avatar handle.
    pub avatar: Avatar,
    /// Rank shown next to the name.
    pub rate: Rate,
    /// Account email; this endpoint exposes it.
    pub email: String,
}

impl PollVoter {
    /// Profile page URL.
    pub fn url(&self) -> String {
        profile_url(self.id)
    }
}

impl HasId for PollVoter {
    fn id(&self) -> u64 {
        self.id
    }
}

// ============================================================================
// Full users and brands
// ============================================================================

/// Company page behind a brand account.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Brand {
    /// Path segment of the brand's page on the service.
    pub urlname: String,
    /// The company's external site.
    pub site_url: String,
    /// Short blurb about the company.
    pub description: String,
}

/// Brand data attached to a user who answers for a company.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrandAffiliation {
    /// The company the user answers for.
    pub brand: Brand,
    /// The user's role at the company, as free text.
    pub role: String,
}

/// Full user as embedded in questions and answers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    /// User id.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Avatar handle.
    pub avatar: Avatar,
    /// Whether the account has VIP status.
    pub is_vip: bool,
    /// Best-answer percentage.
    pub kpd: f64,
    /// Free-text self-description.
    pub about: String,
    /// Whether the service marks this user as an expert.
    pub is_expert: bool,
    /// Points total; some embeddings omit it.
    pub points: Option<u32>,
    /// Rank derived from points and kpd; present iff `points` is.
    pub rate: Option<Rate>,
    /// Present iff this account answers on behalf of a company.
    pub brand: Option<BrandAffiliation>,
}

impl User {
    /// Profile page URL.
    pub fn url(&self) -> String {
        profile_url(self.id)
    }
}

impl HasId for User {
    fn id(&self) -> u64 {
        self.id
    }
}

// ============================================================================
// Profiles
// ============================================================================

/// Counters shown only on the viewer's own profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OwnProfileStats {
    /// Questions the user watches.
    pub watching_question_count: u32,
    /// Direct questions asked to the user.
    pub direct_question_count: u32,
    /// Questions removed by moderators.
    pub removed_question_count: u32,
    /// End of an active ban, if one is running.
    pub banned_until: Option<DateTime<Utc>>,
}

/// User profile page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserProfile {
    /// User id.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Avatar handle.
    pub avatar: Avatar,
    /// Whether the account has VIP status.
    pub is_vip: bool,
    /// Best-answer percentage.
    pub kpd: f64,
    /// Free-text self-description.
    pub about: String,
    /// Whether the service marks this user as an expert.
    pub is_expert: bool,
    /// Points total.
    pub points: u32,
    /// Current rank.
    pub rate: Rate,
    /// Whether the user is banned right now.
    pub is_banned: bool,
    /// Whether the requesting user follows this profile.
    pub is_followed_by_me: bool,
    /// Whether the profile is hidden from listings.
    pub is_hidden: bool,
    /// Place in the overall points rating.
    pub place: u32,
    /// Answers given.
    pub answer_count: u32,
    /// Answers chosen as best.
    pub best_answer_count: u32,
    /// Answers removed by moderators.
    pub deleted_answer_count: u32,
    /// Questions asked.
    pub question_count: u32,
    /// Questions still open.
    pub open_question_count: u32,
    /// Questions in the best-answer vote stage.
    pub voting_question_count: u32,
    /// Questions resolved with a best answer.
    pub resolved_question_count: u32,
    /// Users this profile blacklisted.
    pub blacklisted_count: u32,
    /// Users following this profile.
    pub followers_count: u32,
    /// Users this profile follows.
    pub following_count: u32,
    /// Points earned this week.
    pub week_points: u32,
    /// Present only when the profile belongs to the requesting user.
    pub own_stats: Option<OwnProfileStats>,
}

impl UserProfile {
    /// Profile page URL.
    pub fn url(&self) -> String {
        profile_url(self.id)
    }
}

impl HasId for UserProfile {
    fn id(&self) -> u64 {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_avatar_urls() {
        let avatar = Avatar { filin: "abc123".to_string() };
        assert_eq!(avatar.url(), "https://filin.mail.ru/pic?d=abc123");
        assert_eq!(
            avatar.url_with_size(180, 180),
            "https://filin.mail.ru/pic?d=abc123&width=180&height=180"
        );
        assert_eq!(avatar.to_string(), avatar.url());
    }

    #[test]
    fn test_small_user_dispatch() {
        let member = SmallUser::Member(SmallUserPreview {
            id: 42,
            name: "vasya".to_string(),
            avatar: Avatar { filin: "f".to_string() },
            rate: Rate::by_user_stats(300, 10.0),
        });
        assert_eq!(member.id(), 42);
        assert_eq!(member.name(), "vasya");
        assert_eq!(member.url(), "https://otvet.mail.ru/profile/id42/");

        let brand = SmallUser::Brand(BrandSmallUserPreview {
            id: 7,
            name: "Acme".to_string(),
            avatar: Avatar { filin: "g".to_string() },
            brand_id: 99,
            brand_description: "Acme support".to_string(),
        });
        assert_eq!(brand.id(), 7);
        assert_eq!(brand.name(), "Acme");
    }
}
