pub mod alert;
pub mod auth;
pub mod catalog;
pub mod client;
pub mod inbound;
pub mod material;
pub mod outbound;
pub mod report;
pub mod reservation;
pub mod user;

use almacen_core::error::CoreError;
use validator::ValidationError;

use crate::error::{AppError, AppResult};

/// Take a field that `Validate` has already checked with `required`.
pub(crate) fn required<T>(value: Option<T>, field: &'static str) -> AppResult<T> {
    value.ok_or_else(|| {
        AppError::Core(CoreError::Validation(format!("{field} is required")))
    })
}

/// `#[validate(custom)]` hook rejecting whitespace-only text.
pub(crate) fn non_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Trim optional free text, mapping blank input to `None`.
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_text_drops_blank() {
        assert_eq!(optional_text(Some("  ".into())), None);
        assert_eq!(optional_text(Some(" OS-1 ".into())), Some("OS-1".into()));
        assert_eq!(optional_text(None), None);
    }

    #[test]
    fn blank_text_fails_validation() {
        assert!(non_blank("   ").is_err());
        assert!(non_blank("x").is_ok());
    }
}
