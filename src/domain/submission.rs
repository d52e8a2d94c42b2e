use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;
use time::OffsetDateTime;

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex"));

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("All fields are required")]
    MissingFields,
    #[error("Invalid email format")]
    InvalidEmail,
    #[error("Invalid request body")]
    MalformedBody,
}

/// Raw contact form fields as received from a client, before any checks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub message: Option<String>,
}

/// A validated contact submission. Fields are trimmed and the email has the
/// `local@domain.tld` shape; no other constructor exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) message: String,
    pub(crate) created_at: OffsetDateTime,
    pub(crate) updated_at: OffsetDateTime,
}

impl Submission {
    /// Validates a form and stamps it with `now`.
    ///
    /// # Errors
    /// Returns `ValidationError::MissingFields` if any field is absent or blank after
    /// trimming, and `ValidationError::InvalidEmail` if the email has the wrong shape.
    pub fn from_form(form: ContactForm, now: OffsetDateTime) -> Result<Self, ValidationError> {
        let (Some(name), Some(email), Some(message)) =
            (required(form.name.as_deref()), required(form.email.as_deref()), required(form.message.as_deref()))
        else {
            return Err(ValidationError::MissingFields);
        };

        if !is_valid_email(email) {
            return Err(ValidationError::InvalidEmail);
        }

        Ok(Self {
            name: name.to_string(),
            email: email.to_string(),
            message: message.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub const fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    #[must_use]
    pub const fn updated_at(&self) -> OffsetDateTime {
        self.updated_at
    }
}

fn required(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}
