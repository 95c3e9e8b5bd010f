use lazy_static::lazy_static;
use regex::Regex;

use crate::error::FieldError;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Pushes an error unless `value` is present and `min..=max` characters long.
pub(crate) fn check_length(
    errors: &mut Vec<FieldError>,
    field: &'static str,
    value: Option<&str>,
    min: usize,
    max: usize,
) {
    match value {
        None => errors.push(FieldError::new(field, format!("{field} is required"))),
        Some(v) => {
            let len = v.chars().count();
            if len < min || len > max {
                errors.push(FieldError::new(
                    field,
                    format!("{field} must be between {min} and {max} characters"),
                ));
            }
        }
    }
}

/// Like `check_length` but an absent value is fine.
pub(crate) fn check_optional_length(
    errors: &mut Vec<FieldError>,
    field: &'static str,
    value: Option<&str>,
    max: usize,
) {
    if let Some(v) = value {
        if v.chars().count() > max {
            errors.push(FieldError::new(
                field,
                format!("{field} must be at most {max} characters"),
            ));
        }
    }
}

/// Trims and drops empty strings.
pub(crate) fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// `normalize` for a patch field: absent stays `None` (leave the column
/// alone), blank becomes `Some(None)` (clear it).
pub(crate) fn normalize_patch(value: Option<String>) -> Option<Option<String>> {
    value.map(|v| normalize(Some(v)))
}
