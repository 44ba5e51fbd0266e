//! The signed-in user.

use serde::{Deserialize, Serialize};

/// A user produced by the mock auth service.
///
/// Serialized in camelCase, the shape mirrored into session storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_authenticated: Option<bool>,
}

impl User {
    #[must_use]
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            email: email.into(),
            business_name: None,
            phone: None,
            is_authenticated: None,
        }
    }

    /// The same user, marked as holding an active session.
    #[must_use]
    pub fn authenticated(self) -> Self {
        Self {
            is_authenticated: Some(true),
            ..self
        }
    }

    /// First word of the display name, for greetings.
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }
}
