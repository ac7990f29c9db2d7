//! User data model.
//!
//! Users are keyed by email address. Role and account status are owned by the
//! backend record and only change through super-admin operations.

use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

/// Validation errors returned by the user value constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    /// Email is blank.
    EmptyEmail,
    /// Email does not look like `name@domain`.
    InvalidEmail,
    /// Display name is blank.
    EmptyDisplayName,
    /// Display name is longer than `max` characters.
    DisplayNameTooLong {
        /// Longest accepted length.
        max: usize,
    },
    /// Photo URL is not an absolute http(s) URL.
    InvalidPhotoUrl,
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::InvalidEmail => write!(f, "email must look like name@domain"),
            Self::EmptyDisplayName => write!(f, "display name must not be empty"),
            Self::DisplayNameTooLong { max } => {
                write!(f, "display name must be at most {max} characters")
            }
            Self::InvalidPhotoUrl => write!(f, "photo URL must be an absolute http(s) URL"),
        }
    }
}

impl std::error::Error for UserValidationError {}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        let pattern = r"^[^@\s]+@[^@\s]+$";
        Regex::new(pattern).unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Email address identifying a user.
///
/// ## Invariants
/// - Trimmed and lower-cased.
/// - Exactly one `@` with non-empty local and domain parts.
///
/// # Examples
/// ```
/// use clubhub::domain::Email;
///
/// let email = Email::new("  Ada@Example.COM ").unwrap();
/// assert_eq!(email.as_ref(), "ada@example.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Validate and normalise an email address.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let normalised = raw.as_ref().trim().to_lowercase();
        if normalised.is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }
        if !email_regex().is_match(&normalised) {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(normalised))
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

impl TryFrom<String> for Email {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Maximum allowed length for a display name.
pub const DISPLAY_NAME_MAX: usize = 64;

/// Human readable display name for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DisplayName(String);

impl DisplayName {
    /// Validate and construct a [`DisplayName`], trimming surrounding
    /// whitespace.
    pub fn new(display_name: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let trimmed = display_name.as_ref().trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyDisplayName);
        }
        if trimmed.chars().count() > DISPLAY_NAME_MAX {
            return Err(UserValidationError::DisplayNameTooLong {
                max: DISPLAY_NAME_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Fallback name derived from the local part of an email address.
    pub fn from_email(email: &Email) -> Self {
        let local = email.as_ref().split('@').next().unwrap_or_default();
        Self::new(local).unwrap_or_else(|_| Self(email.as_ref().to_owned()))
    }
}

impl AsRef<str> for DisplayName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<DisplayName> for String {
    fn from(value: DisplayName) -> Self {
        value.0
    }
}

impl TryFrom<String> for DisplayName {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Parse an optional avatar or banner URL.
pub fn parse_image_url(raw: &str) -> Result<Url, UserValidationError> {
    let url = Url::parse(raw.trim()).map_err(|_| UserValidationError::InvalidPhotoUrl)?;
    if matches!(url.scheme(), "http" | "https") {
        Ok(url)
    } else {
        Err(UserValidationError::InvalidPhotoUrl)
    }
}

/// Platform role held by a user record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular member; the default for new sign-ups.
    #[default]
    Member,
    /// Operates one or more clubs.
    ClubManager,
    /// Platform moderator.
    SuperAdmin,
}

impl Role {
    /// Wire value.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::ClubManager => "club_manager",
            Self::SuperAdmin => "super_admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an account may perform mutations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    /// May act.
    #[default]
    Active,
    /// Read-only; every mutating capability is refused.
    Banned,
}

impl AccountStatus {
    /// Wire value.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Banned => "banned",
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backend user record.
///
/// ## Invariants
/// - `email` is the unique key.
/// - `role` and `status` are authoritative; nothing on the client derives
///   them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Unique key.
    pub email: Email,
    /// Name shown to other users.
    pub display_name: DisplayName,
    /// Profile photo.
    pub photo_url: Option<Url>,
    /// Authoritative role.
    pub role: Role,
    /// Authoritative account status.
    pub status: AccountStatus,
    /// Creation time, when the backend reports one.
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    /// A fresh member record as created on first sign-in.
    pub fn new_member(email: Email, display_name: DisplayName, photo_url: Option<Url>) -> Self {
        Self {
            email,
            display_name,
            photo_url,
            role: Role::Member,
            status: AccountStatus::Active,
            created_at: None,
        }
    }
}

/// Self-service profile changes. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilePatch {
    /// New display name.
    pub display_name: Option<DisplayName>,
    /// New photo.
    pub photo_url: Option<Url>,
}

impl ProfilePatch {
    /// Whether the patch changes nothing.
    pub const fn is_empty(&self) -> bool {
        self.display_name.is_none() && self.photo_url.is_none()
    }
}

/// Super-admin changes to a user's role and status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccessUpdate {
    /// New role.
    pub role: Option<Role>,
    /// Ban or unban.
    pub status: Option<AccountStatus>,
}
