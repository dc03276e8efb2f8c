use anyhow::{Context, Result};
use hooklog::api::{create_router, AppState};
use hooklog::config::ServiceConfig;
use hooklog::store::MessageLog;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hooklog=info,tower_http=info".into()),
        )
        .init();

    info!("Hooklog starting...");

    let config = ServiceConfig::from_env().context("Failed to load configuration")?;
    info!(
        bind_addr = %config.server.bind_addr,
        log_path = %config.log.path.display(),
        fsync = config.log.fsync,
        body_limit_bytes = config.server.body_limit_bytes,
        "Configuration loaded"
    );
    if config.webhook.verify_token.is_none() {
        warn!("No verify token configured; subscription handshakes will be refused");
    }

    let message_log = Arc::new(MessageLog::new(&config.log.path, config.log.fsync));
    message_log
        .ensure_header()
        .context("Failed to initialize message log")?;

    let state = AppState {
        message_log,
        verify_token: config.webhook.verify_token.clone(),
        signature_verifier: None,
        body_limit_bytes: config.server.body_limit_bytes,
    };
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind_addr))?;
    info!(addr = %config.server.bind_addr, "Webhook endpoint listening on /webhook");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Hooklog stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for ctrl_c signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
