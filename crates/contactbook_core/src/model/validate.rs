//! Field-shape validation for contacts and groups.
//!
//! # Responsibility
//! - Reject malformed input before it reaches the mutation queue.
//!
//! # Invariants
//! - Phone shape: optional leading `+`, then 10..=25 of `[0-9. ()-]`.
//! - Email is optional; when non-blank it must look like `local@domain.tld`.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9. ()\-]{10,25}$").expect("valid phone regex"));
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,6}$").expect("valid email regex")
});

/// Input rejected before any mutation is queued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Contact name is blank after trim.
    EmptyName,
    /// Contact phone is blank after trim.
    EmptyPhone,
    /// Phone does not match the accepted shape.
    InvalidPhone(String),
    /// Non-blank email does not match the accepted shape.
    InvalidEmail(String),
    /// Group name is blank after trim.
    EmptyGroupName,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "contact name must not be blank"),
            Self::EmptyPhone => write!(f, "contact phone must not be blank"),
            Self::InvalidPhone(value) => write!(f, "invalid phone number: `{value}`"),
            Self::InvalidEmail(value) => write!(f, "invalid email address: `{value}`"),
            Self::EmptyGroupName => write!(f, "group name must not be blank"),
        }
    }
}

impl Error for ValidationError {}

pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub(crate) fn validate_contact_fields(
    name: &str,
    phone: &str,
    email: Option<&str>,
) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if phone.trim().is_empty() {
        return Err(ValidationError::EmptyPhone);
    }
    if !is_valid_phone(phone) {
        return Err(ValidationError::InvalidPhone(phone.to_string()));
    }
    if let Some(email) = email.filter(|value| !value.trim().is_empty()) {
        if !is_valid_email(email) {
            return Err(ValidationError::InvalidEmail(email.to_string()));
        }
    }
    Ok(())
}

pub(crate) fn validate_group_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyGroupName);
    }
    Ok(())
}
