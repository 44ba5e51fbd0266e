//! Mock authentication.
//!
//! No backend is contacted. Login accepts a single demo credential; signup
//! accepts any well-formed form. Both wait a fixed delay first so the UI can
//! show a pending state.

use std::time::Duration;

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::AuthError;
use crate::user::User;
use crate::validation::{FieldErrors, is_valid_email, is_valid_phone};

pub const DEMO_EMAIL: &str = "a@gmail.com";
pub const DEMO_PASSWORD: &str = "Asdf@1234";
pub const DEFAULT_AUTH_DELAY: Duration = Duration::from_millis(300);

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl LoginRequest {
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        check_credentials(&mut errors, &self.email, &self.password);
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[serde(default)]
    pub business_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl SignupRequest {
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require("businessName", &self.business_name, "Business name is required");
        check_credentials(&mut errors, &self.email, &self.password);
        if let Some(phone) = self.phone.as_deref().filter(|p| !p.is_empty()) {
            if !is_valid_phone(phone) {
                errors.add("phone", "Please enter a valid phone number");
            }
        }
        errors.into_result()
    }
}

fn check_credentials(errors: &mut FieldErrors, email: &str, password: &str) {
    if !is_valid_email(email) {
        errors.add("email", "Please enter a valid email address");
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.add("password", "Password must be at least 6 characters");
    }
}

/// The simulated auth backend.
#[derive(Debug, Clone)]
pub struct MockAuthService {
    delay: Duration,
}

impl Default for MockAuthService {
    fn default() -> Self {
        Self::new(DEFAULT_AUTH_DELAY)
    }
}

impl MockAuthService {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Validate, wait, then accept only the demo credential.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Validation`] before any delay if a field is malformed.
    /// - [`AuthError::InvalidCredentials`] for anything but the demo pair.
    pub async fn login(&self, request: &LoginRequest) -> Result<User, AuthError> {
        request.validate().map_err(AuthError::Validation)?;
        tokio::time::sleep(self.delay).await;

        if request.email == DEMO_EMAIL && request.password == DEMO_PASSWORD {
            info!(email = %request.email, "login accepted");
            Ok(User::new("Demo User", request.email.clone()))
        } else {
            warn!(email = %request.email, "login rejected");
            Err(AuthError::InvalidCredentials)
        }
    }

    /// Validate, wait, then create a user named after the business.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] before any delay if a field is
    /// malformed.
    pub async fn signup(&self, request: &SignupRequest) -> Result<User, AuthError> {
        request.validate().map_err(AuthError::Validation)?;
        tokio::time::sleep(self.delay).await;

        info!(email = %request.email, business = %request.business_name, "signup accepted");
        let phone = request.phone.clone().filter(|p| !p.is_empty());
        Ok(User {
            business_name: Some(request.business_name.clone()),
            phone,
            ..User::new(request.business_name.clone(), request.email.clone())
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]

    use super::*;

    fn login(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.into(),
            password: password.into(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn demo_credential_is_accepted_after_delay() {
        let auth = MockAuthService::default();
        let started = tokio::time::Instant::now();
        let user = auth.login(&login(DEMO_EMAIL, DEMO_PASSWORD)).await.unwrap();
        assert_eq!(user.name, "Demo User");
        assert_eq!(user.email, DEMO_EMAIL);
        assert!(started.elapsed() >= DEFAULT_AUTH_DELAY);
    }

    #[tokio::test(start_paused = true)]
    async fn wrong_password_gets_generic_message() {
        let auth = MockAuthService::default();
        let err = auth.login(&login(DEMO_EMAIL, "Asdf@12345")).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        assert_eq!(
            err.to_string(),
            "Invalid email or password. Use a@gmail.com / Asdf@1234"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn validation_fails_without_waiting() {
        let auth = MockAuthService::new(Duration::from_secs(60));
        let started = tokio::time::Instant::now();
        let err = auth.login(&login("not-an-email", "123")).await.unwrap_err();
        let fields = match err {
            AuthError::Validation(fields) => fields,
            other => panic!("expected validation error, got {other:?}"),
        };
        assert_eq!(fields.len(), 2);
        assert!(fields.get("email").is_some());
        assert!(fields.get("password").is_some());
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn signup_returns_business_user() {
        let auth = MockAuthService::default();
        let request = SignupRequest {
            business_name: "Gulf Trading LLC".into(),
            email: "ops@gulf.ae".into(),
            password: "secret1".into(),
            phone: Some(String::new()),
        };
        let user = auth.signup(&request).await.unwrap();
        assert_eq!(user.name, "Gulf Trading LLC");
        assert_eq!(user.business_name.as_deref(), Some("Gulf Trading LLC"));
        assert_eq!(user.phone, None);
    }

    #[test]
    fn signup_field_rules() {
        let request = SignupRequest {
            business_name: " ".into(),
            email: "ops@gulf.ae".into(),
            password: "secret1".into(),
            phone: Some("12ab".into()),
        };
        let fields = request.validate().unwrap_err();
        assert_eq!(fields.get("businessName"), Some("Business name is required"));
        assert_eq!(fields.get("phone"), Some("Please enter a valid phone number"));
        assert_eq!(fields.len(), 2);
    }
}
