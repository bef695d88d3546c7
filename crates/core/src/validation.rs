//! Field-level validation errors shared by every form flow.

use std::collections::BTreeMap;

use serde::Serialize;

/// A set of field-level validation failures.
///
/// Keys are the camelCase field names used on the wire so clients can show
/// the message next to the right input. Multiple messages per field are kept
/// in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    /// Create an empty error set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure for `field`.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    /// Record a failure if `condition` holds.
    pub fn add_if(&mut self, condition: bool, field: &str, message: &str) {
        if condition {
            self.add(field, message);
        }
    }

    /// Require a non-blank string of at most `max` characters.
    pub fn require_text(&mut self, field: &str, value: &str, max: usize) {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.add(field, "is required");
        } else if trimmed.chars().count() > max {
            self.add(field, format!("must be at most {max} characters"));
        }
    }

    /// Limit an optional string to `max` characters.
    pub fn limit_text(&mut self, field: &str, value: Option<&str>, max: usize) {
        if value.is_some_and(|v| v.trim().chars().count() > max) {
            self.add(field, format!("must be at most {max} characters"));
        }
    }

    /// Whether no failures were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages recorded for a field.
    #[must_use]
    pub fn field(&self, field: &str) -> &[String] {
        self.0.get(field).map_or(&[], Vec::as_slice)
    }

    /// Whether a field has at least one failure.
    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Number of fields with failures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Convert into a `Result`, yielding `value` when there are no failures.
    ///
    /// # Errors
    ///
    /// Returns `self` if any failure was recorded.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }

    /// Single-line summary such as `email: is required; phone: ...`.
    #[must_use]
    pub fn summary(&self) -> String {
        self.0
            .iter()
            .map(|(field, messages)| format!("{field}: {}", messages.join(", ")))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "validation failed ({})", self.summary())
    }
}

impl std::error::Error for ValidationErrors {}

/// Trim each entry, drop blanks and duplicates (case-insensitive), keep order.
///
/// Used for array-valued admin fields such as tags and ingredients.
#[must_use]
pub fn normalize_list(values: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .filter(|v| seen.insert(v.to_lowercase()))
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_require_text() {
        let mut errors = ValidationErrors::new();
        errors.require_text("name", "   ", 10);
        errors.require_text("notes", "abcdefghijk", 10);
        errors.require_text("ok", "fine", 10);
        assert_eq!(errors.field("name"), ["is required"]);
        assert_eq!(errors.field("notes"), ["must be at most 10 characters"]);
        assert!(!errors.has("ok"));
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_into_result() {
        assert_eq!(ValidationErrors::new().into_result(5), Ok(5));
        let mut errors = ValidationErrors::new();
        errors.add("email", "is invalid");
        assert!(errors.into_result(5).is_err());
    }

    #[test]
    fn test_serializes_as_field_map() {
        let mut errors = ValidationErrors::new();
        errors.add("email", "is invalid");
        errors.add("email", "is required");
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json, serde_json::json!({ "email": ["is invalid", "is required"] }));
        assert_eq!(errors.summary(), "email: is invalid, is required");
    }

    #[test]
    fn test_normalize_list() {
        let input = vec![
            " Maple ".to_owned(),
            String::new(),
            "maple".to_owned(),
            "Rosewood".to_owned(),
        ];
        assert_eq!(normalize_list(&input), ["Maple", "Rosewood"]);
    }
}
