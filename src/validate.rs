//! Shared field validation helpers used by checkout, applications and
//! profile updates.

use email_address::EmailAddress;

use crate::error::{AppError, AppResult};

pub fn is_valid_email(value: &str) -> bool {
    EmailAddress::is_valid(value)
}

/// Check that every named field is non-empty after trimming, and that the
/// field named `email` (when present) parses as an email address. Returns
/// `ValidationFailed` listing every offending field at once.
pub fn require_fields(fields: &[(&str, &str)]) -> AppResult<()> {
    let mut missing = Vec::new();
    for (name, value) in fields {
        let value = value.trim();
        if value.is_empty() {
            missing.push((*name).to_string());
        } else if *name == "email" && !is_valid_email(value) {
            missing.push("email".to_string());
        }
    }
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::ValidationFailed(missing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_when_all_present() {
        assert!(require_fields(&[("name", "Asha"), ("email", "a@b.com")]).is_ok());
    }

    #[test]
    fn collects_every_missing_field() {
        let err = require_fields(&[("name", "  "), ("email", ""), ("phone", "123")]).unwrap_err();
        match err {
            AppError::ValidationFailed(fields) => {
                assert_eq!(fields, vec!["name".to_string(), "email".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn malformed_email_fails() {
        let err = require_fields(&[("email", "not-an-email")]).unwrap_err();
        assert!(matches!(err, AppError::ValidationFailed(ref f) if f == &["email".to_string()]));
    }

    #[test]
    fn email_rule_only_applies_to_email_field() {
        assert!(require_fields(&[("reason", "not-an-email")]).is_ok());
    }
}
