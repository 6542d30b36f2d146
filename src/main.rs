use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use rdlm::config::ServerConfig;
use rdlm::{gateway, telemetry, ExpiryReaper, LockManager, ResourceTable};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::parse();
    telemetry::init_tracing(&config.log).context("failed to initialise logging")?;

    let table = Arc::new(ResourceTable::new());
    let reaper = ExpiryReaper::spawn(table.clone(), config.reaper_interval());
    let manager = LockManager::new(table);

    let listener = TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("failed to bind {}", config.listen))?;
    tracing::info!(
        addr = %config.listen,
        max_wait = config.max_wait,
        max_lifetime = config.max_lifetime,
        "rdlm listening"
    );

    gateway::serve_with_shutdown(listener, manager, config.limits(), shutdown_signal())
        .await
        .context("http gateway failed")?;

    let stats = reaper.stop();
    tracing::info!(
        sweeps = stats.sweeps,
        expired = stats.locks_expired,
        "rdlm stopped"
    );
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "cannot listen for ctrl-c, running until killed");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
