//! `InvoiceFlow` HTTP server.
//!
//! Hosts the dashboard's application state for any number of "tabs". Each
//! tab has its own session scope, view router and dashboard; all tabs share
//! one persistent store, the way browser tabs share `localStorage`.

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod tab;
