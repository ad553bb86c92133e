//! Input validation for entity fields.

use std::fmt;

/// Validation error types.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Invalid email format.
    InvalidEmail(String),
    /// Value too long.
    TooLong { field: String, max: usize, actual: usize },
    /// Value too short.
    TooShort { field: String, min: usize, actual: usize },
    /// Empty value where one is required.
    Empty(String),
    /// Numeric value outside its allowed range.
    OutOfRange { field: String, min: f64, max: f64, actual: f64 },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidEmail(msg) => write!(f, "Invalid email: {}", msg),
            ValidationError::TooLong { field, max, actual } => {
                write!(f, "{} is too long ({} chars, max {})", field, actual, max)
            }
            ValidationError::TooShort { field, min, actual } => {
                write!(f, "{} is too short ({} chars, min {})", field, actual, min)
            }
            ValidationError::Empty(field) => write!(f, "{} cannot be empty", field),
            ValidationError::OutOfRange {
                field,
                min,
                max,
                actual,
            } => write!(f, "{} must be between {} and {} (got {})", field, min, max, actual),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Maximum allowed length for email addresses.
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Maximum allowed length for claim numbers.
pub const MAX_CLAIM_NUMBER_LENGTH: usize = 100;

/// Maximum allowed length for phone numbers.
pub const MAX_MOBILE_LENGTH: usize = 20;

/// Maximum allowed length for short free-text fields (names, cities).
pub const MAX_NAME_LENGTH: usize = 120;

/// Minimum password length at registration.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Validate an email address (basic RFC 5322 format check).
///
/// This is a basic validation that checks:
/// - Contains exactly one @
/// - Has at least one character before @
/// - Has at least one character after @
/// - Has at least one dot after @
/// - Is not too long
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Empty("email".to_string()));
    }

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong {
            field: "email".to_string(),
            max: MAX_EMAIL_LENGTH,
            actual: email.len(),
        });
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return Err(ValidationError::InvalidEmail(
            "must contain exactly one @ symbol".to_string(),
        ));
    }

    let (local, domain) = (parts[0], parts[1]);

    if local.is_empty() {
        return Err(ValidationError::InvalidEmail(
            "missing local part (before @)".to_string(),
        ));
    }

    if domain.is_empty() {
        return Err(ValidationError::InvalidEmail(
            "missing domain (after @)".to_string(),
        ));
    }

    if !domain.contains('.') {
        return Err(ValidationError::InvalidEmail(
            "domain must contain at least one dot".to_string(),
        ));
    }

    if domain.starts_with('.') || domain.ends_with('.') {
        return Err(ValidationError::InvalidEmail(
            "domain cannot start or end with a dot".to_string(),
        ));
    }

    if domain.contains("..") {
        return Err(ValidationError::InvalidEmail(
            "domain cannot contain consecutive dots".to_string(),
        ));
    }

    Ok(())
}

/// Validate a required text field: non-empty after trimming and bounded.
pub fn validate_required(field: &str, value: &str, max: usize) -> Result<(), ValidationError> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Empty(field.to_string()));
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
            actual: value.chars().count(),
        });
    }

    Ok(())
}

/// Validate a password at registration time.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: MIN_PASSWORD_LENGTH,
            actual: len,
        });
    }
    Ok(())
}

fn validate_range(field: &str, value: f64, min: f64, max: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min,
            max,
            actual: value,
        });
    }
    Ok(())
}

/// Latitude in decimal degrees.
pub fn validate_latitude(latitude: f64) -> Result<(), ValidationError> {
    validate_range("latitude", latitude, -90.0, 90.0)
}

/// Longitude in decimal degrees.
pub fn validate_longitude(longitude: f64) -> Result<(), ValidationError> {
    validate_range("longitude", longitude, -180.0, 180.0)
}

/// Non-negative measurement such as accuracy in meters or a duration.
pub fn validate_non_negative(field: &str, value: f64) -> Result<(), ValidationError> {
    validate_range(field, value, 0.0, f64::MAX)
}
