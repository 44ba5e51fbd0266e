//! Core library for `InvoiceFlow`.
//!
//! Holds the application state of the e-invoicing demo dashboard without any
//! rendering: the session store over pluggable Web Storage, the top-level view
//! router, the dashboard's hash sub-router and keyboard shell, the event bus,
//! and the invoice list view engine. Every "service" here is an in-memory mock
//! with a fixed delay; nothing talks to a real backend.

pub mod assessment;
pub mod auth;
pub mod bulk;
pub mod bus;
pub mod clock;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod hash_route;
pub mod invoice;
pub mod list_view;
pub mod router;
pub mod session;
pub mod shortcuts;
pub mod user;
pub mod validation;
