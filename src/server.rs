//! Process startup: wire the real backends into the router and serve.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use crate::app::{app, AppState};
use crate::auth::TokenCodec;
use crate::config::AppConfig;
use crate::database::manager::{connect, run_migrations};
use crate::database::PgStore;
use crate::proxmox::ProxmoxClient;
use crate::services::bootstrap::ensure_first_superuser;

pub async fn serve(config: AppConfig) -> anyhow::Result<()> {
    info!("Starting {} in {:?} mode", config.api.project_name, config.environment);

    let codec = TokenCodec::from_config(&config.security)?;

    let pool = connect(&config.database).await?;
    run_migrations(&pool).await?;
    let store = PgStore::new(pool);

    let state = AppState::new(
        Arc::new(config.clone()),
        Arc::new(codec),
        Arc::new(store),
        Arc::new(ProxmoxClient::from_config(&config.proxmox)?),
    );
    ensure_first_superuser(
        state.store.as_ref(),
        &config.bootstrap,
        state.password_params,
    )
    .await?;

    let addr: SocketAddr = format!("{}:{}", config.api.host, config.api.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", config.api.host, config.api.port))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!("Listening on http://{}{}", addr, config.api.prefix);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown signal received");
}
