//! Authentication inputs handed to the identity provider.
//!
//! Passwords are held in [`Zeroizing`] buffers and never logged.

use std::fmt;

use url::Url;
use zeroize::Zeroizing;

use super::user::{DisplayName, Email, UserValidationError, parse_image_url};

/// Minimum accepted password length for new accounts.
pub const PASSWORD_MIN: usize = 6;

/// Validation errors for sign-in and sign-up forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialsValidationError {
    /// Email was missing or malformed.
    Email(UserValidationError),
    /// Password was blank.
    EmptyPassword,
    /// Password was too short for a new account.
    PasswordTooShort {
        /// Shortest accepted length.
        min: usize,
    },
    /// Password lacks an uppercase or lowercase letter.
    PasswordMissingCase,
    /// Display name or photo URL was invalid.
    Profile(UserValidationError),
}

impl fmt::Display for CredentialsValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Email(err) | Self::Profile(err) => err.fmt(f),
            Self::EmptyPassword => write!(f, "password must not be empty"),
            Self::PasswordTooShort { min } => {
                write!(f, "password must be at least {min} characters")
            }
            Self::PasswordMissingCase => write!(
                f,
                "password must contain an uppercase and a lowercase letter"
            ),
        }
    }
}

impl std::error::Error for CredentialsValidationError {}

/// Validated email/password credentials.
///
/// ## Invariants
/// - `email` is normalised.
/// - `password` is non-empty and keeps caller-provided whitespace.
///
/// # Examples
/// ```
/// use clubhub::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts("Ada@example.com", "pw").unwrap();
/// assert_eq!(creds.email().as_ref(), "ada@example.com");
/// assert_eq!(creds.password(), "pw");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: Email,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw form inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, CredentialsValidationError> {
        let normalised = Email::new(email).map_err(CredentialsValidationError::Email)?;
        if password.is_empty() {
            return Err(CredentialsValidationError::EmptyPassword);
        }
        Ok(Self {
            email: normalised,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Normalised email.
    pub const fn email(&self) -> &Email {
        &self.email
    }

    /// Password provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Validated registration form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpRequest {
    credentials: LoginCredentials,
    display_name: DisplayName,
    photo_url: Option<Url>,
}

impl SignUpRequest {
    /// Validate a registration form. New passwords need at least
    /// [`PASSWORD_MIN`] characters and both letter cases.
    pub fn try_from_parts(
        email: &str,
        password: &str,
        display_name: &str,
        photo_url: Option<&str>,
    ) -> Result<Self, CredentialsValidationError> {
        let credentials = LoginCredentials::try_from_parts(email, password)?;
        if password.chars().count() < PASSWORD_MIN {
            return Err(CredentialsValidationError::PasswordTooShort { min: PASSWORD_MIN });
        }
        let has_upper = password.chars().any(char::is_uppercase);
        let has_lower = password.chars().any(char::is_lowercase);
        if !(has_upper && has_lower) {
            return Err(CredentialsValidationError::PasswordMissingCase);
        }
        let name = DisplayName::new(display_name).map_err(CredentialsValidationError::Profile)?;
        let photo = photo_url
            .filter(|raw| !raw.trim().is_empty())
            .map(parse_image_url)
            .transpose()
            .map_err(CredentialsValidationError::Profile)?;
        Ok(Self {
            credentials,
            display_name: name,
            photo_url: photo,
        })
    }

    /// Email and password.
    pub const fn credentials(&self) -> &LoginCredentials {
        &self.credentials
    }

    /// Display name for the new profile.
    pub const fn display_name(&self) -> &DisplayName {
        &self.display_name
    }

    /// Optional avatar.
    pub const fn photo_url(&self) -> Option<&Url> {
        self.photo_url.as_ref()
    }
}

/// Bearer token issued by the identity provider.
///
/// The value is wiped on drop and redacted from `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(Zeroizing<String>);

impl AccessToken {
    /// Wrap a raw token.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(Zeroizing::new(raw.into()))
    }

    /// The raw token for the `Authorization` header.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "pw")]
    #[case("   ", "pw")]
    #[case("not-an-email", "pw")]
    fn invalid_emails_fail(#[case] email: &str, #[case] password: &str) {
        let err = LoginCredentials::try_from_parts(email, password).expect_err("invalid email");
        assert!(matches!(err, CredentialsValidationError::Email(_)));
    }

    #[rstest]
    fn blank_password_fails() {
        let err = LoginCredentials::try_from_parts("ada@example.com", "")
            .expect_err("blank password");
        assert_eq!(err, CredentialsValidationError::EmptyPassword);
    }

    #[rstest]
    #[case("Ab1", CredentialsValidationError::PasswordTooShort { min: PASSWORD_MIN })]
    #[case("alllower", CredentialsValidationError::PasswordMissingCase)]
    #[case("ALLUPPER", CredentialsValidationError::PasswordMissingCase)]
    fn weak_passwords_fail_sign_up(
        #[case] password: &str,
        #[case] expected: CredentialsValidationError,
    ) {
        let err = SignUpRequest::try_from_parts("ada@example.com", password, "Ada", None)
            .expect_err("weak password");
        assert_eq!(err, expected);
    }

    #[rstest]
    fn access_tokens_are_redacted() {
        let token = AccessToken::new("secret-token");
        assert_eq!(format!("{token:?}"), "AccessToken(<redacted>)");
        assert_eq!(token.expose(), "secret-token");
    }

    #[rstest]
    fn blank_photo_url_is_treated_as_absent() {
        let request =
            SignUpRequest::try_from_parts("ada@example.com", "Secret1", "Ada", Some("  "))
                .expect("valid sign-up");
        assert!(request.photo_url().is_none());
        assert_eq!(request.display_name().as_ref(), "Ada");
    }
}
