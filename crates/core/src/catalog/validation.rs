//! Input validation shared by catalog create/update payloads.

use rust_decimal::Decimal;

/// A payload field that failed validation.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
    #[error("{field} cannot be negative")]
    Negative { field: &'static str },
    #[error("{field} is invalid: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Maximum length of names and titles.
pub const MAX_NAME_LENGTH: usize = 200;

/// Maximum length of free-text descriptions.
pub const MAX_DESCRIPTION_LENGTH: usize = 10_000;

pub(crate) fn text(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty { field });
    }
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}

pub(crate) fn optional_text(
    field: &'static str,
    value: Option<&str>,
    max: usize,
) -> Result<(), ValidationError> {
    value.map_or(Ok(()), |v| text(field, v, max))
}

pub(crate) fn long_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(ValidationError::TooLong {
            field,
            max: MAX_DESCRIPTION_LENGTH,
        });
    }
    Ok(())
}

pub(crate) fn price(field: &'static str, value: Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::Negative { field });
    }
    Ok(())
}

pub(crate) fn count(field: &'static str, value: i32) -> Result<(), ValidationError> {
    if value < 0 {
        return Err(ValidationError::Negative { field });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_rejects_blank_and_long() {
        assert_eq!(
            text("name", "  ", MAX_NAME_LENGTH),
            Err(ValidationError::Empty { field: "name" })
        );
        assert!(matches!(
            text("name", &"x".repeat(201), MAX_NAME_LENGTH),
            Err(ValidationError::TooLong { .. })
        ));
        assert!(text("name", "Nocturne", MAX_NAME_LENGTH).is_ok());
    }

    #[test]
    fn test_price_allows_zero() {
        assert!(price("price", Decimal::ZERO).is_ok());
        assert!(price("price", Decimal::new(-1, 2)).is_err());
    }
}
