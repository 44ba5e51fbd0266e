//! Server configuration for `InvoiceFlow`.
//!
//! Loads configuration from environment variables with sensible defaults.
//! All settings can be overridden via `INVOICEFLOW_*` environment variables.

use std::net::SocketAddr;
use std::time::Duration;

use invoiceflow_core::auth::DEFAULT_AUTH_DELAY;
use invoiceflow_core::assessment::DEFAULT_ASSESSMENT_DELAY;
use invoiceflow_core::session::ExpiryPolicy;

const DEFAULT_PORT: u16 = 8300;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to.
    pub bind_addr: SocketAddr,
    /// Where the shared persistent scope lives.
    pub storage_backend: StorageBackendType,
    /// Log level filter (e.g., `info`, `debug`, `warn`).
    pub log_level: String,
    /// Session expiry applied to every tab.
    pub session_expiry: ExpiryPolicy,
    /// Simulated latency of the mock auth service.
    pub auth_delay: Duration,
    /// Simulated latency of assessment booking.
    pub assessment_delay: Duration,
    /// Tabs untouched for this long are closed.
    pub tab_idle_timeout: Duration,
    /// How often idle tabs are looked for.
    pub tab_sweep_interval: Duration,
}

/// Supported storage backend types for the persistent scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackendType {
    /// In-memory (lost on restart).
    Memory,
    /// Redb file storage.
    Redb { path: String },
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `PORT`: port to bind on (binds to `0.0.0.0`)
    /// - `INVOICEFLOW_BIND_ADDR`: full bind address (overrides `PORT`, default: `127.0.0.1:8300`)
    /// - `INVOICEFLOW_STORAGE`: `memory` or `redb` (default: `memory`)
    /// - `INVOICEFLOW_STORAGE_PATH`: path for the redb file (default: `./data`)
    /// - `INVOICEFLOW_LOG_LEVEL`: log filter (default: `info`)
    /// - `INVOICEFLOW_SESSION_EXPIRY`: `never` or a duration like `24h`, `30m`, `90s`, `7d` (default: `24h`)
    /// - `INVOICEFLOW_AUTH_DELAY_MS`: mock login latency (default: `300`)
    /// - `INVOICEFLOW_ASSESSMENT_DELAY_MS`: booking latency (default: `1500`)
    /// - `INVOICEFLOW_TAB_IDLE_SECS`: idle tab lifetime (default: `3600`)
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        // Priority: INVOICEFLOW_BIND_ADDR > PORT > default 127.0.0.1:8300
        let bind_addr = if let Some(addr) = var("INVOICEFLOW_BIND_ADDR") {
            addr.parse()
                .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)))
        } else if let Some(port_str) = var("PORT") {
            let port: u16 = port_str.parse().unwrap_or(DEFAULT_PORT);
            SocketAddr::from(([0, 0, 0, 0], port))
        } else {
            SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT))
        };

        let storage_path = var("INVOICEFLOW_STORAGE_PATH").unwrap_or_else(|| "./data".to_owned());

        let storage_backend = match var("INVOICEFLOW_STORAGE")
            .unwrap_or_else(|| "memory".to_owned())
            .to_lowercase()
            .as_str()
        {
            "redb" => StorageBackendType::Redb { path: storage_path },
            _ => StorageBackendType::Memory,
        };

        let log_level = var("INVOICEFLOW_LOG_LEVEL").unwrap_or_else(|| "info".to_owned());

        let session_expiry = var("INVOICEFLOW_SESSION_EXPIRY")
            .and_then(|v| parse_expiry(&v))
            .unwrap_or_default();

        let millis = |key: &str, default: Duration| {
            var(key)
                .and_then(|v| v.parse().ok())
                .map_or(default, Duration::from_millis)
        };

        let tab_idle_timeout = var("INVOICEFLOW_TAB_IDLE_SECS")
            .and_then(|v| v.parse().ok())
            .map_or(Duration::from_secs(3600), Duration::from_secs);

        Self {
            bind_addr,
            storage_backend,
            log_level,
            session_expiry,
            auth_delay: millis("INVOICEFLOW_AUTH_DELAY_MS", DEFAULT_AUTH_DELAY),
            assessment_delay: millis("INVOICEFLOW_ASSESSMENT_DELAY_MS", DEFAULT_ASSESSMENT_DELAY),
            tab_idle_timeout,
            tab_sweep_interval: Duration::from_secs(60),
        }
    }
}

/// `never`, or a positive count followed by `s`, `m`, `h` or `d`.
pub fn parse_expiry(value: &str) -> Option<ExpiryPolicy> {
    let value = value.trim().to_lowercase();
    if value == "never" {
        return Some(ExpiryPolicy::Never);
    }
    let unit_at = value.len().checked_sub(1)?;
    let (count, unit) = value.split_at(unit_at);
    let count: i64 = count.parse().ok().filter(|n| *n > 0)?;
    let window = match unit {
        "s" => chrono::Duration::try_seconds(count),
        "m" => chrono::Duration::try_minutes(count),
        "h" => chrono::Duration::try_hours(count),
        "d" => chrono::Duration::try_days(count),
        _ => None,
    }?;
    Some(ExpiryPolicy::Window(window))
}
