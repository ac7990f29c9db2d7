//! Applications to become a club manager.

use chrono::{DateTime, Utc};
use url::Url;

use super::ids::ApplicationId;
use super::moderation::ModerationStatus;
use super::user::{Email, parse_image_url};
use super::validation::{LONG_TEXT_MAX, SHORT_TEXT_MAX, ValidationError, required_text};

/// A stored application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClubManagerApplication {
    /// Backend identifier.
    pub id: ApplicationId,
    /// User asking for the club-manager role.
    pub applicant_email: Email,
    /// Name the applicant gave.
    pub name: String,
    /// Why they want to run clubs.
    pub reason: String,
    /// Profile photo.
    pub photo_url: Option<Url>,
    /// Moderation state; approval promotes the applicant.
    pub status: ModerationStatus,
    /// When the application was filed.
    pub applied_at: DateTime<Utc>,
    /// When a super admin approved it.
    pub approved_at: Option<DateTime<Utc>>,
}

/// Raw application form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationDraft {
    /// Name as typed.
    pub name: String,
    /// Reason as typed.
    pub reason: String,
    /// Photo URL as typed; blank means none.
    pub photo_url: Option<String>,
}

impl ApplicationDraft {
    /// Validate the form for `applicant`.
    pub fn validate(
        &self,
        applicant: Email,
        applied_at: DateTime<Utc>,
    ) -> Result<NewApplication, ValidationError> {
        let photo_url = match self.photo_url.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(parse_image_url(raw).map_err(|err| ValidationError::Invalid {
                field: "photoURL",
                reason: err.to_string(),
            })?),
        };
        Ok(NewApplication {
            applicant_email: applicant,
            name: required_text("name", &self.name, SHORT_TEXT_MAX)?,
            reason: required_text("reason", &self.reason, LONG_TEXT_MAX)?,
            photo_url,
            applied_at,
        })
    }
}

/// Validated application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewApplication {
    /// Signed-in applicant.
    pub applicant_email: Email,
    /// Trimmed name.
    pub name: String,
    /// Trimmed reason.
    pub reason: String,
    /// Parsed photo URL.
    pub photo_url: Option<Url>,
    /// Filing time.
    pub applied_at: DateTime<Utc>,
}
