//! Common validation utilities.

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use validator::{ValidateEmail, ValidationError};

/// Maximum length of an instance identifier (URL, hostname, machine ID).
pub const MAX_INSTANCE_IDENTIFIER_LENGTH: usize = 500;

/// Maximum length of a customer email after normalization.
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Maximum length of a free-text reason attached to a lifecycle change.
pub const MAX_REASON_LENGTH: usize = 500;

lazy_static! {
    /// Lowercase ASCII words separated by single hyphens.
    static ref SLUG_RE: Regex = Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap();
}

/// Validates a URL-friendly slug such as `wp-rocket` or `rankmath-pro`.
pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    if SLUG_RE.is_match(slug) {
        Ok(())
    } else {
        let mut err = ValidationError::new("invalid_slug");
        err.message = Some(
            "Slug may only contain lowercase letters, digits, and single hyphens".into(),
        );
        Err(err)
    }
}

/// Validates an instance identifier claimed by an activation.
pub fn validate_instance_identifier(identifier: &str) -> Result<(), ValidationError> {
    if identifier.trim().is_empty() {
        let mut err = ValidationError::new("instance_identifier_blank");
        err.message = Some("Instance identifier cannot be blank".into());
        return Err(err);
    }

    if identifier.chars().count() > MAX_INSTANCE_IDENTIFIER_LENGTH {
        let mut err = ValidationError::new("instance_identifier_length");
        err.message = Some("Instance identifier cannot exceed 500 characters".into());
        return Err(err);
    }

    if identifier.chars().any(char::is_control) {
        let mut err = ValidationError::new("instance_identifier_chars");
        err.message = Some("Instance identifier cannot contain control characters".into());
        return Err(err);
    }

    Ok(())
}

/// Validates a customer email in its normalized form, so surrounding
/// whitespace and letter case never cause a rejection.
pub fn validate_customer_email(email: &str) -> Result<(), ValidationError> {
    let email = normalize_email(email);

    if email.chars().count() > MAX_EMAIL_LENGTH {
        let mut err = ValidationError::new("email_length");
        err.message = Some("Email cannot exceed 254 characters".into());
        return Err(err);
    }

    if !email.validate_email() {
        let mut err = ValidationError::new("email");
        err.message = Some("Invalid email format".into());
        return Err(err);
    }

    Ok(())
}

/// Validates that a seat total is non-negative.
pub fn validate_total_seats(total_seats: i32) -> Result<(), ValidationError> {
    if total_seats >= 0 {
        Ok(())
    } else {
        let mut err = ValidationError::new("total_seats_range");
        err.message = Some("Total seats must be zero or greater".into());
        Err(err)
    }
}

/// Validates that a free-text reason is not blank.
pub fn validate_reason(reason: &str) -> Result<(), ValidationError> {
    if reason.trim().is_empty() {
        let mut err = ValidationError::new("reason_blank");
        err.message = Some("Reason cannot be blank".into());
        Err(err)
    } else {
        Ok(())
    }
}

/// Validates that a timestamp lies in the future.
pub fn validate_future_timestamp(timestamp: &DateTime<Utc>) -> Result<(), ValidationError> {
    validate_future_timestamp_at(timestamp, Utc::now())
}

/// Validates that a timestamp lies after `now`.
///
/// Useful for testing with fixed timestamps.
pub fn validate_future_timestamp_at(
    timestamp: &DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<(), ValidationError> {
    if *timestamp > now {
        Ok(())
    } else {
        let mut err = ValidationError::new("timestamp_not_future");
        err.message = Some("Expiration date must be in the future".into());
        Err(err)
    }
}

/// Canonical form of a customer email: trimmed and lowercased.
///
/// Keys are looked up by email, so every write and lookup goes through this.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
