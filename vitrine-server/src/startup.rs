//! Server startup and shutdown

use anyhow::Context;
use tracing::{error, info, warn};

use crate::services::ServiceContainer;
use vitrine_config::VitrineConfig;
use vitrine_rest_api::create_rest_app;

/// Build services, start the provisioning worker, and serve HTTP until
/// interrupted.
pub async fn run_server(config: VitrineConfig) -> anyhow::Result<()> {
    if config.billing.webhook_secret_missing() {
        // Deployment error: unsigned webhook processing is not a supported
        // mode, only a staging convenience
        error!("STRIPE_WEBHOOK_SECRET is not configured; webhook deliveries will be processed UNVERIFIED");
    }
    if !config.billing.is_configured() {
        warn!("billing provider credentials missing; billing endpoints will answer BILLING_NOT_CONFIGURED");
    }

    let container = ServiceContainer::build(config.clone())
        .await
        .context("failed to build service container")?;

    let engine = container.engine.clone();
    let worker = tokio::spawn(async move {
        if let Err(e) = engine.start().await {
            error!(error = %e, "provisioning engine terminated with error");
        }
    });

    let app = create_rest_app(container.app_context());
    let addr = config.server.socket_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "vitrine server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("shutting down");
    container.engine.stop();
    worker.abort();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
    }
}
