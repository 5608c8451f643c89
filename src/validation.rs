//! Server-side checks for feedback submissions.
//!
//! Every entry point that creates feedback goes through [`validate_submission`],
//! so the length, range and format rules cannot be skipped by a client that
//! bypasses the form.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;

use crate::error::FieldErrors;
use crate::models::feedback::SubmissionRequest;

pub const MIN_CONTENT_CHARS: usize = 10;
pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
});
static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[\d\s\-()]+$").expect("phone pattern compiles"));

/// A submission that passed validation, normalised for storage.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidSubmission {
    pub name: Option<String>,
    pub contact: Option<String>,
    pub dining_time: Option<DateTime<Utc>>,
    pub rating: u8,
    pub content: String,
}

pub fn validate_submission(input: &SubmissionRequest) -> Result<ValidSubmission, FieldErrors> {
    let mut errors = FieldErrors::new();

    let content = input.content.as_deref().map(str::trim).unwrap_or_default();
    if content.is_empty() {
        errors.add("content", "Feedback is required");
    } else if content.chars().count() < MIN_CONTENT_CHARS {
        errors.add(
            "content",
            format!("Feedback must be at least {MIN_CONTENT_CHARS} characters"),
        );
    }

    let rating = match input.rating {
        None => {
            errors.add("rating", "Rating is required");
            None
        }
        Some(r) if !(MIN_RATING..=MAX_RATING).contains(&r) => {
            errors.add("rating", "Rating must be between 1 and 5");
            None
        }
        Some(r) => u8::try_from(r).ok(),
    };

    let contact = non_blank(input.contact.as_deref());
    if let Some(contact) = contact {
        if !is_valid_contact(contact) {
            errors.add("contact", "Please enter a valid email or phone number");
        }
    }

    let dining_time = match non_blank(input.dining_time.as_deref()) {
        None => None,
        Some(raw) => match parse_dining_time(raw) {
            Some(when) => Some(when),
            None => {
                errors.add("diningTime", "Dining time must be a valid date and time");
                None
            }
        },
    };

    match rating {
        Some(rating) if errors.is_empty() => Ok(ValidSubmission {
            name: non_blank(input.name.as_deref()).map(str::to_string),
            contact: contact.map(str::to_string),
            dining_time,
            rating,
            content: content.to_string(),
        }),
        _ => Err(errors),
    }
}

/// Loose email-or-phone shape check; not RFC validation.
pub fn is_valid_contact(contact: &str) -> bool {
    EMAIL.is_match(contact) || PHONE.is_match(contact)
}

/// Accepts RFC 3339 or the `YYYY-MM-DDTHH:MM[:SS]` value a datetime-local
/// input sends; the latter is taken as UTC.
pub fn parse_dining_time(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(when) = DateTime::parse_from_rfc3339(raw) {
        return Some(when.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
