// Presence validation. All violations for a request are collected into one
// aggregated error before any database access happens.
use std::collections::BTreeMap;

use uuid::Uuid;

pub type FieldErrors = BTreeMap<String, String>;

/// Require a non-empty text field; records a violation and yields `None`
/// otherwise. Values are trimmed.
pub fn require_text(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<String>,
    message: &str,
) -> Option<String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Some(v.to_string()),
        _ => {
            errors.insert(field.to_string(), message.to_string());
            None
        }
    }
}

/// Require a reference field carrying a UUID.
pub fn require_ref(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<String>,
    message: &str,
) -> Option<Uuid> {
    let raw = require_text(errors, field, value, message)?;
    match Uuid::parse_str(&raw) {
        Ok(id) => Some(id),
        Err(_) => {
            errors.insert(field.to_string(), format!("{field} reference must be a UUID"));
            None
        }
    }
}

/// Normalize an optional text field: trimmed, with empty treated as absent.
pub fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_violations_are_collected() {
        let mut errors = FieldErrors::new();
        let name = require_text(&mut errors, "name", None, "Region name is empty");
        let code = require_text(&mut errors, "code", Some("  ".to_string()), "Region code is empty");

        assert!(name.is_none());
        assert!(code.is_none());
        assert_eq!(errors.len(), 2);
        assert_eq!(errors["name"], "Region name is empty");
        assert_eq!(errors["code"], "Region code is empty");
    }

    #[test]
    fn refs_must_be_uuids() {
        let mut errors = FieldErrors::new();
        let ok = require_ref(
            &mut errors,
            "branch",
            Some(Uuid::new_v4().to_string()),
            "Branch reference is empty",
        );
        assert!(ok.is_some());
        assert!(errors.is_empty());

        let bad = require_ref(
            &mut errors,
            "branch",
            Some("branch-1".to_string()),
            "Branch reference is empty",
        );
        assert!(bad.is_none());
        assert_eq!(errors["branch"], "branch reference must be a UUID");
    }

    #[test]
    fn optional_text_drops_empty_values() {
        assert_eq!(optional_text(Some(" VI ".to_string())).as_deref(), Some("VI"));
        assert_eq!(optional_text(Some("   ".to_string())), None);
        assert_eq!(optional_text(None), None);
    }
}
