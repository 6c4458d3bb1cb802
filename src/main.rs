// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use newworld_server::{
    api::{router, DOCS_PATH},
    auth::{GoogleProvider, IdentityBridge, IdentityProvider, TokenVerifier},
    config::{Config, LogFormat, DEFAULT_LOG_FILTER},
    relations::Reconciler,
    state::AppState,
    storage::{DocumentStore, FsStore, MemoryStore, StoragePaths},
};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
    shutdown.cancel();
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = Config::from_env()?;
    init_tracing(config.log_format);

    let store: Arc<dyn DocumentStore> = match &config.data_dir {
        Some(dir) => {
            tracing::info!(data_dir = %dir.display(), "Using file document store");
            Arc::new(FsStore::open(StoragePaths::new(dir))?)
        }
        None => {
            tracing::warn!("DATA_DIR not set; documents are kept in memory only");
            Arc::new(MemoryStore::new())
        }
    };

    let provider: Option<Arc<dyn IdentityProvider>> = match config.google.clone() {
        Some(google) => Some(Arc::new(GoogleProvider::new(google)?)),
        None => {
            tracing::warn!("Google OAuth not configured; external login disabled");
            None
        }
    };

    let bridge = IdentityBridge::new(
        provider,
        &config.jwt_secret,
        config.token_ttl_secs,
        config.redirects.clone(),
    );
    let state = AppState::new(store.clone(), TokenVerifier::new(&config.jwt_secret), bridge);

    let shutdown = CancellationToken::new();
    let reconciler = match config.reconcile_interval {
        Some(interval) => {
            let reconciler = Reconciler::new(store).with_interval(interval);
            Some(tokio::spawn(reconciler.run(shutdown.clone())))
        }
        None => {
            tracing::info!("Link reconciliation disabled");
            None
        }
    };

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!(
        addr = %config.bind_addr,
        docs = DOCS_PATH,
        "New World server listening"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;

    shutdown.cancel();
    if let Some(handle) = reconciler {
        if let Err(e) = handle.await {
            tracing::warn!(error = %e, "Reconciler task ended abnormally");
        }
    }

    tracing::info!("Server stopped");
    Ok(())
}
