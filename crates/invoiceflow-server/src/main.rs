//! `InvoiceFlow` server entry point.
//!
//! Bootstraps the persistent storage scope and the shared state, then starts
//! the Axum HTTP server with graceful shutdown. A background worker closes
//! idle tabs and is cancelled on shutdown.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

use invoiceflow_storage::{MemoryBackend, StorageBackend};

use invoiceflow_server::config::{ServerConfig, StorageBackendType};
use invoiceflow_server::routes::build_router;
use invoiceflow_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env();

    // Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .json()
        .init();

    info!(storage = ?config.storage_backend, "InvoiceFlow starting");

    let persistent = open_storage(&config)?;
    let state = Arc::new(AppState::new(persistent, &config));

    // Shutdown signal channel.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let reaper_handle = {
        let state = Arc::clone(&state);
        let mut rx = shutdown_rx.clone();
        let idle = config.tab_idle_timeout;
        let every = config.tab_sweep_interval;
        tokio::spawn(async move {
            idle_tab_worker(state, &mut rx, idle, every).await;
        })
    };

    let app = build_router(Arc::clone(&state));

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind_addr))?;

    info!(addr = %config.bind_addr, "InvoiceFlow server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .await
        .context("server error")?;

    info!("waiting for background workers to stop");
    let _ = tokio::time::timeout(Duration::from_secs(10), reaper_handle).await;

    info!("InvoiceFlow server stopped");
    Ok(())
}

/// Open the persistent scope shared by every tab.
fn open_storage(config: &ServerConfig) -> anyhow::Result<Arc<dyn StorageBackend>> {
    let storage: Arc<dyn StorageBackend> = match &config.storage_backend {
        StorageBackendType::Memory => {
            info!("using in-memory storage (sessions will not survive a restart)");
            Arc::new(MemoryBackend::new())
        }
        #[cfg(feature = "redb-backend")]
        StorageBackendType::Redb { path } => {
            info!(path = %path, "using redb storage");
            Arc::new(
                invoiceflow_storage::RedbBackend::open(path)
                    .context("failed to open redb storage")?,
            )
        }
        #[cfg(not(feature = "redb-backend"))]
        StorageBackendType::Redb { .. } => {
            anyhow::bail!(
                "redb storage requested but the redb-backend feature is not enabled; \
                 rebuild with --features redb-backend"
            );
        }
    };
    Ok(storage)
}

/// Background worker that closes tabs nobody has used for `idle`.
async fn idle_tab_worker(
    state: Arc<AppState>,
    shutdown: &mut watch::Receiver<bool>,
    idle: Duration,
    every: Duration,
) {
    let mut interval = tokio::time::interval(every);
    info!(idle_secs = idle.as_secs(), "idle tab worker started");

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let closed = state.close_idle_tabs(idle).await;
                if closed > 0 {
                    info!(closed, "closed idle tabs");
                }
            }
            _ = shutdown.changed() => {
                info!("idle tab worker shutting down");
                return;
            }
        }
    }
}

async fn shutdown_signal(shutdown_tx: watch::Sender<bool>) {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        if let Ok(mut sig) =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        {
            sig.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received, stopping server");
    let _ = shutdown_tx.send(true);
}
