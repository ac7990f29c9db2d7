//! Club aggregate and its drafts, patches and queries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use super::ids::ClubId;
use super::membership::MembershipStatus;
use super::moderation::ModerationStatus;
use super::money::Money;
use super::user::{Email, parse_image_url};
use super::validation::{
    LONG_TEXT_MAX, SHORT_TEXT_MAX, ValidationError, optional_text, required_text,
};

/// How new members are admitted to a club.
///
/// Declared per club so the two admission policies never mix silently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinPolicy {
    /// Members are active as soon as they join (after payment for paid clubs).
    #[default]
    Open,
    /// Members start `pending` and the owning manager approves or rejects.
    ManagerApproval,
}

impl JoinPolicy {
    /// Status a brand new membership starts in.
    pub const fn initial_status(self) -> MembershipStatus {
        match self {
            Self::Open => MembershipStatus::Active,
            Self::ManagerApproval => MembershipStatus::Pending,
        }
    }
}

/// A club as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Club {
    /// Backend identifier.
    pub id: ClubId,
    /// Display name, unique across clubs ignoring case.
    pub name: String,
    /// Free-text description shown on the club page.
    pub description: String,
    /// Category used for browsing filters.
    pub category: String,
    /// Where the club meets.
    pub location: String,
    /// Banner shown on cards and the club page.
    pub banner_image: Option<Url>,
    /// Fee per membership; zero means joining is free.
    pub membership_fee: Money,
    /// Manager who submitted the club.
    pub owner_email: Email,
    /// Moderation state. Only approved clubs take members.
    pub status: ModerationStatus,
    /// How new members are admitted.
    pub join_policy: JoinPolicy,
    /// Creation time, when the backend reports one.
    pub created_at: Option<DateTime<Utc>>,
}

impl Club {
    /// Whether members can currently join.
    pub fn is_approved(&self) -> bool {
        self.status == ModerationStatus::Approved
    }

    /// Whether joining goes through the payment sequence.
    pub const fn requires_payment(&self) -> bool {
        !self.membership_fee.is_zero()
    }

    /// Whether `email` owns the club.
    pub fn is_owned_by(&self, email: &Email) -> bool {
        &self.owner_email == email
    }

    /// Apply a validated patch. Status is never touched.
    pub fn apply_patch(&mut self, patch: &ClubPatch) {
        if let Some(name) = &patch.name {
            self.name.clone_from(name);
        }
        if let Some(description) = &patch.description {
            self.description.clone_from(description);
        }
        if let Some(category) = &patch.category {
            self.category.clone_from(category);
        }
        if let Some(location) = &patch.location {
            self.location.clone_from(location);
        }
        if let Some(banner) = &patch.banner_image {
            self.banner_image = Some(banner.clone());
        }
        if let Some(fee) = patch.membership_fee {
            self.membership_fee = fee;
        }
        if let Some(policy) = patch.join_policy {
            self.join_policy = policy;
        }
    }
}

/// Raw club form as entered by a manager.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClubDraft {
    /// Club name.
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// Category.
    pub category: String,
    /// Meeting place.
    pub location: String,
    /// Banner URL as typed; blank means none.
    pub banner_image: Option<String>,
    /// Membership fee.
    pub membership_fee: Money,
    /// Admission policy.
    pub join_policy: JoinPolicy,
}

impl ClubDraft {
    /// Validate the form into a creation request.
    pub fn validate(&self) -> Result<NewClub, ValidationError> {
        let banner_image = match self.banner_image.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(parse_image_url(raw).map_err(|err| ValidationError::Invalid {
                field: "bannerImage",
                reason: err.to_string(),
            })?),
        };
        Ok(NewClub {
            name: required_text("clubName", &self.name, SHORT_TEXT_MAX)?,
            description: required_text("description", &self.description, LONG_TEXT_MAX)?,
            category: required_text("category", &self.category, SHORT_TEXT_MAX)?,
            location: required_text("location", &self.location, SHORT_TEXT_MAX)?,
            banner_image,
            membership_fee: self.membership_fee,
            join_policy: self.join_policy,
        })
    }
}

/// Validated club creation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClub {
    /// Trimmed club name.
    pub name: String,
    /// Trimmed description.
    pub description: String,
    /// Trimmed category.
    pub category: String,
    /// Trimmed meeting place.
    pub location: String,
    /// Parsed banner URL.
    pub banner_image: Option<Url>,
    /// Membership fee.
    pub membership_fee: Money,
    /// Admission policy.
    pub join_policy: JoinPolicy,
}

/// Partial update of a club's content fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClubPatch {
    /// New name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New category.
    pub category: Option<String>,
    /// New meeting place.
    pub location: Option<String>,
    /// New banner.
    pub banner_image: Option<Url>,
    /// New membership fee. Existing memberships keep what they paid.
    pub membership_fee: Option<Money>,
    /// New admission policy; only affects later joins.
    pub join_policy: Option<JoinPolicy>,
}

impl ClubPatch {
    /// Whether the patch changes nothing.
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.location.is_none()
            && self.banner_image.is_none()
            && self.membership_fee.is_none()
            && self.join_policy.is_none()
    }

    /// Trim supplied text fields and reject blanks or empty patches.
    pub fn validate(&self) -> Result<Self, ValidationError> {
        if self.is_empty() {
            return Err(ValidationError::EmptyPatch);
        }
        Ok(Self {
            name: optional_text("clubName", self.name.as_deref(), SHORT_TEXT_MAX)?,
            description: optional_text(
                "description",
                self.description.as_deref(),
                LONG_TEXT_MAX,
            )?,
            category: optional_text("category", self.category.as_deref(), SHORT_TEXT_MAX)?,
            location: optional_text("location", self.location.as_deref(), SHORT_TEXT_MAX)?,
            banner_image: self.banner_image.clone(),
            membership_fee: self.membership_fee,
            join_policy: self.join_policy,
        })
    }
}

/// Ordering for club listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClubSort {
    /// Most recently created first.
    #[default]
    Newest,
    /// Oldest first.
    Oldest,
    /// Cheapest first.
    FeeLowToHigh,
    /// Most expensive first.
    FeeHighToLow,
}

impl ClubSort {
    /// Backend `sort` query parameter.
    pub const fn as_query_value(self) -> &'static str {
        match self {
            Self::Newest => "createdAt:desc",
            Self::Oldest => "createdAt:asc",
            Self::FeeLowToHigh => "membershipFee:asc",
            Self::FeeHighToLow => "membershipFee:desc",
        }
    }

    /// Sort a listing in place.
    pub fn sort(self, clubs: &mut [Club]) {
        match self {
            Self::Newest => clubs.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            Self::Oldest => clubs.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
            Self::FeeLowToHigh => clubs.sort_by_key(|club| club.membership_fee),
            Self::FeeHighToLow => clubs.sort_by(|a, b| b.membership_fee.cmp(&a.membership_fee)),
        }
    }
}

/// Filters for club listings. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ClubQuery {
    /// Only clubs in this moderation state.
    pub status: Option<ModerationStatus>,
    /// Case-insensitive substring of the name.
    pub search: Option<String>,
    /// Category, ignoring ASCII case.
    pub category: Option<String>,
    /// Only clubs owned by this manager.
    pub owner: Option<Email>,
    /// Listing order; newest first when unset.
    pub sort: Option<ClubSort>,
}

impl ClubQuery {
    /// Public directory listing: approved clubs only.
    pub fn approved() -> Self {
        Self {
            status: Some(ModerationStatus::Approved),
            ..Self::default()
        }
    }

    /// Clubs owned by `owner`, any status.
    pub fn owned_by(owner: Email) -> Self {
        Self {
            owner: Some(owner),
            ..Self::default()
        }
    }

    /// Whether `club` passes every filter. Search is a case-insensitive
    /// substring match on the name.
    pub fn matches(&self, club: &Club) -> bool {
        let status_ok = self.status.is_none_or(|status| status == club.status);
        let owner_ok = self.owner.as_ref().is_none_or(|owner| owner == &club.owner_email);
        let category_ok = self
            .category
            .as_deref()
            .is_none_or(|category| category.eq_ignore_ascii_case(&club.category));
        let search_ok = self.search.as_deref().is_none_or(|needle| {
            club.name
                .to_lowercase()
                .contains(needle.trim().to_lowercase().as_str())
        });
        status_ok && owner_ok && category_ok && search_ok
    }
}

/// Finance and membership summary for a club's owning manager.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClubStats {
    /// Payments recorded against the club.
    pub revenue: Money,
    /// Active memberships.
    pub members_total: u64,
    /// Memberships waiting for the manager.
    pub members_pending: u64,
    /// Events still to come.
    pub events_upcoming: u64,
    /// All events, any status.
    pub events_total: u64,
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn draft() -> ClubDraft {
        ClubDraft {
            name: "  Chess Club ".to_owned(),
            description: "Weekly games".to_owned(),
            category: "Sports".to_owned(),
            location: "Library".to_owned(),
            banner_image: Some(String::new()),
            membership_fee: Money::ZERO,
            join_policy: JoinPolicy::Open,
        }
    }

    #[rstest]
    fn drafts_are_trimmed(draft: ClubDraft) {
        let club = draft.validate().expect("valid draft");
        assert_eq!(club.name, "Chess Club");
        assert!(club.banner_image.is_none());
    }

    #[rstest]
    #[case::name(|d: &mut ClubDraft| d.name.clear(), "clubName")]
    #[case::description(|d: &mut ClubDraft| d.description = " ".to_owned(), "description")]
    #[case::category(|d: &mut ClubDraft| d.category.clear(), "category")]
    #[case::location(|d: &mut ClubDraft| d.location.clear(), "location")]
    fn required_fields_are_enforced(
        mut draft: ClubDraft,
        #[case] mutate: fn(&mut ClubDraft),
        #[case] field: &str,
    ) {
        mutate(&mut draft);
        let err = draft.validate().expect_err("missing field");
        assert_eq!(err.field(), Some(field));
    }

    #[rstest]
    fn malformed_banner_is_rejected(mut draft: ClubDraft) {
        draft.banner_image = Some("not a url".to_owned());
        let err = draft.validate().expect_err("bad url");
        assert_eq!(err.field(), Some("bannerImage"));
    }

    #[rstest]
    fn empty_patches_are_rejected() {
        assert_eq!(
            ClubPatch::default().validate(),
            Err(ValidationError::EmptyPatch)
        );
    }

    #[rstest]
    #[case(JoinPolicy::Open, MembershipStatus::Active)]
    #[case(JoinPolicy::ManagerApproval, MembershipStatus::Pending)]
    fn join_policy_picks_initial_status(
        #[case] policy: JoinPolicy,
        #[case] expected: MembershipStatus,
    ) {
        assert_eq!(policy.initial_status(), expected);
    }

    #[rstest]
    #[case(ClubSort::Newest, "createdAt:desc")]
    #[case(ClubSort::FeeHighToLow, "membershipFee:desc")]
    fn sort_uses_backend_parameters(#[case] sort: ClubSort, #[case] expected: &str) {
        assert_eq!(sort.as_query_value(), expected);
    }
}
