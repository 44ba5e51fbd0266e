//! Form field validation shared by the login, signup and assessment forms.
//!
//! Failures are collected per field so a form can show every message inline
//! at once. Nothing is submitted while any field has an error.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Field name → message, ordered by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `message` for `field`. The first message for a field wins.
    pub fn add(&mut self, field: &str, message: &str) {
        self.0
            .entry(field.to_owned())
            .or_insert_with(|| message.to_owned());
    }

    /// Record `message` for `field` when `value` is blank.
    pub fn require(&mut self, field: &str, value: &str, message: &str) {
        if value.trim().is_empty() {
            self.add(field, message);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Message recorded for `field`, if any.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Iterate `(field, message)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `Ok(())` when no field failed, otherwise the collected errors.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one field failed.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

/// `local@domain.tld` shape: one `@`, no whitespace, a non-empty local part,
/// and a dot in the domain with text on both sides.
pub fn is_valid_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

/// At least six characters drawn from digits, `+`, `-`, `(`, `)` and spaces.
pub fn is_valid_phone(value: &str) -> bool {
    value.chars().count() >= 6
        && value
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '(' | ')') || c.is_whitespace())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("a@gmail.com"));
        assert!(is_valid_email("first.last@sub.example.ae"));
        assert!(!is_valid_email("a@gmail"));
        assert!(!is_valid_email("@gmail.com"));
        assert!(!is_valid_email("a@.com"));
        assert!(!is_valid_email("a@gmail."));
        assert!(!is_valid_email("a b@gmail.com"));
        assert!(!is_valid_email("a@b@c.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn phone_shapes() {
        assert!(is_valid_phone("+971 50 123 4567"));
        assert!(is_valid_phone("(04) 123-456"));
        assert!(!is_valid_phone("12345"));
        assert!(!is_valid_phone("050-CALL-ME"));
    }

    #[test]
    fn first_message_per_field_wins() {
        let mut errors = FieldErrors::new();
        errors.add("email", "Email is required");
        errors.add("email", "Please enter a valid email address");
        assert_eq!(errors.get("email"), Some("Email is required"));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn require_flags_blank_values() {
        let mut errors = FieldErrors::new();
        errors.require("fullName", "   ", "Full name is required");
        errors.require("companyName", "Emaar", "Company name is required");
        assert_eq!(errors.iter().collect::<Vec<_>>(), vec![("fullName", "Full name is required")]);
        assert!(errors.into_result().is_err());
    }
}
