//! Invoice records and the demo seed set.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

/// Workflow status of an invoice row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowStatus {
    Sent,
    Validated,
    Pending,
    Rejected,
}

impl RowStatus {
    pub const ALL: [Self; 4] = [Self::Sent, Self::Validated, Self::Pending, Self::Rejected];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Validated => "validated",
            Self::Pending => "pending",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }
}

impl fmt::Display for RowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status reported by the Federal Tax Authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FtaStatus {
    Approved,
    Pending,
    Rejected,
    Validated,
}

impl FtaStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Approved => "Approved",
            Self::Pending => "Pending",
            Self::Rejected => "Rejected",
            Self::Validated => "Validated",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// One invoice. Amounts stay display strings such as `"AED 12,500"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: String,
    pub invoice_number: String,
    pub client: String,
    pub customer_name: String,
    pub amount: String,
    pub invoice_date: String,
    pub status: RowStatus,
    pub fta_status: FtaStatus,
    pub validation_score: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Keep the values that deserialize as invoices with a score in 0..=100.
pub fn from_values(values: Vec<Value>) -> Vec<Invoice> {
    values
        .into_iter()
        .enumerate()
        .filter_map(|(i, value)| match serde_json::from_value::<Invoice>(value) {
            Ok(invoice) if invoice.validation_score <= 100 => Some(invoice),
            Ok(invoice) => {
                debug!(index = i, id = %invoice.id, "dropping invoice with out-of-range score");
                None
            }
            Err(e) => {
                debug!(index = i, error = %e, "dropping malformed invoice");
                None
            }
        })
        .collect()
}

/// The eight demo invoices.
pub fn seed() -> Vec<Invoice> {
    from_values(vec![
        json!({
            "id": "1", "invoiceNumber": "INV-2024-001", "client": "Al Futtaim Group",
            "customerName": "Ahmed Al Rashid", "amount": "AED 12,500", "invoiceDate": "2024-09-15",
            "status": "validated", "ftaStatus": "Approved", "validationScore": 98,
            "items": 5, "tax": "AED 625", "total": "AED 13,125",
            "notes": "Quarterly services invoice", "priority": "high", "tags": ["urgent", "quarterly"]
        }),
        json!({
            "id": "2", "invoiceNumber": "INV-2024-002", "client": "Emirates NBD",
            "customerName": "Fatima Hassan", "amount": "AED 8,750", "invoiceDate": "2024-09-14",
            "status": "sent", "ftaStatus": "Validated", "validationScore": 95,
            "items": 3, "tax": "AED 437.50", "total": "AED 9,187.50",
            "notes": "Monthly consulting fees", "priority": "medium", "tags": ["recurring"]
        }),
        json!({
            "id": "3", "invoiceNumber": "INV-2024-003", "client": "Dubai Airports",
            "customerName": "Mohammed Al Maktoum", "amount": "AED 25,000", "invoiceDate": "2024-09-13",
            "status": "pending", "ftaStatus": "Pending", "validationScore": 87,
            "items": 8, "tax": "AED 1,250", "total": "AED 26,250",
            "notes": "Annual maintenance contract", "priority": "high", "tags": ["annual", "contract"]
        }),
        json!({
            "id": "4", "invoiceNumber": "INV-2024-004", "client": "Emaar Properties",
            "customerName": "Layla Ahmed", "amount": "AED 15,200", "invoiceDate": "2024-09-12",
            "status": "rejected", "ftaStatus": "Rejected", "validationScore": 45,
            "items": 4, "tax": "AED 760", "total": "AED 15,960",
            "notes": "Missing required documentation", "priority": "low", "tags": ["needs-review"]
        }),
        json!({
            "id": "5", "invoiceNumber": "INV-2024-005", "client": "DP World",
            "customerName": "Omar Said", "amount": "AED 18,900", "invoiceDate": "2024-09-11",
            "status": "validated", "ftaStatus": "Approved", "validationScore": 99,
            "items": 6, "tax": "AED 945", "total": "AED 19,845",
            "notes": "Logistics services rendered", "priority": "medium", "tags": ["logistics"]
        }),
        json!({
            "id": "6", "invoiceNumber": "INV-2024-006", "client": "Etisalat",
            "customerName": "Aisha Rahman", "amount": "AED 9,500", "invoiceDate": "2024-09-10",
            "status": "sent", "ftaStatus": "Validated", "validationScore": 92,
            "items": 2, "tax": "AED 475", "total": "AED 9,975",
            "notes": "Telecom infrastructure setup", "priority": "medium", "tags": ["tech"]
        }),
        json!({
            "id": "7", "invoiceNumber": "INV-2024-007", "client": "ADNOC",
            "customerName": "Khalid Ibrahim", "amount": "AED 32,000", "invoiceDate": "2024-09-09",
            "status": "pending", "ftaStatus": "Pending", "validationScore": 78,
            "items": 12, "tax": "AED 1,600", "total": "AED 33,600",
            "notes": "Equipment procurement", "priority": "high", "tags": ["procurement", "urgent"]
        }),
        json!({
            "id": "8", "invoiceNumber": "INV-2024-008", "client": "Majid Al Futtaim",
            "customerName": "Noura Ali", "amount": "AED 14,300", "invoiceDate": "2024-09-08",
            "status": "validated", "ftaStatus": "Approved", "validationScore": 96,
            "items": 7, "tax": "AED 715", "total": "AED 15,015",
            "notes": "Retail consulting services", "priority": "low", "tags": ["consulting"]
        }),
    ])
}

/// Parse a display amount by keeping digits and `.`; unparsable → 0.
pub fn parse_amount(amount: &str) -> f64 {
    let digits: String = amount
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    digits.parse().unwrap_or(0.0)
}
