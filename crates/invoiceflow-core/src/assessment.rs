//! Free compliance assessment booking.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::AssessmentError;
use crate::validation::{FieldErrors, is_valid_email};

pub const DEFAULT_ASSESSMENT_DELAY: Duration = Duration::from_millis(1500);

/// Next steps shown after a successful booking.
pub const NEXT_STEPS: [&str; 4] = [
    "We'll review your ERP and invoice volume",
    "A specialist will call you to schedule a convenient time",
    "During the call, we'll assess your compliance readiness",
    "You'll receive a custom implementation roadmap",
];

/// The e-invoicing mandate start date, midnight UTC.
pub fn compliance_deadline() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(2026, 6, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
        .and_utc()
}

/// Whole days left until the deadline, rounded up. Negative once passed.
pub fn days_until_deadline(now: DateTime<Utc>) -> i64 {
    const DAY_MS: i64 = 24 * 60 * 60 * 1000;
    let remaining = (compliance_deadline() - now).num_milliseconds();
    remaining.div_euclid(DAY_MS) + i64::from(remaining.rem_euclid(DAY_MS) != 0)
}

/// The booking form. Absent fields read as empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssessmentRequest {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub company_name: String,
    pub job_title: String,
    pub employee_count: String,
    #[serde(rename = "currentERP", alias = "currentErp")]
    pub current_erp: String,
    pub invoices_per_month: String,
    pub currently_compliant: String,
    pub preferred_date: String,
    pub additional_notes: String,
}

impl AssessmentRequest {
    /// # Errors
    ///
    /// Returns every failing field, keyed by its form name.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require("fullName", &self.full_name, "Full name is required");
        if self.email.trim().is_empty() {
            errors.add("email", "Email is required");
        } else if !is_valid_email(&self.email) {
            errors.add("email", "Please enter a valid email address");
        }
        errors.require("phone", &self.phone, "Phone number is required");
        errors.require("companyName", &self.company_name, "Company name is required");
        if self.current_erp.is_empty() {
            errors.add("currentERP", "Please select your current ERP");
        }
        if self.invoices_per_month.is_empty() {
            errors.add("invoicesPerMonth", "Please select your invoice volume");
        }
        errors.into_result()
    }

    pub fn first_name(&self) -> &str {
        self.full_name.split(' ').next().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentConfirmation {
    pub first_name: String,
    pub message: String,
    pub next_steps: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct AssessmentService {
    delay: Duration,
}

impl Default for AssessmentService {
    fn default() -> Self {
        Self::new(DEFAULT_ASSESSMENT_DELAY)
    }
}

impl AssessmentService {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Validate, wait, then confirm.
    ///
    /// # Errors
    ///
    /// Returns [`AssessmentError::Validation`] without waiting if any field
    /// fails.
    pub async fn book(
        &self,
        request: &AssessmentRequest,
    ) -> Result<AssessmentConfirmation, AssessmentError> {
        request.validate().map_err(AssessmentError::Validation)?;
        tokio::time::sleep(self.delay).await;

        let first_name = request.first_name().to_owned();
        info!(
            company = %request.company_name,
            erp = %request.current_erp,
            volume = %request.invoices_per_month,
            "assessment booked"
        );
        Ok(AssessmentConfirmation {
            message: format!(
                "Thank you, {first_name}! Our compliance specialist will contact you within \
                 24 hours to schedule your free 15-minute assessment."
            ),
            first_name,
            next_steps: NEXT_STEPS.iter().map(|s| (*s).to_owned()).collect(),
        })
    }
}
