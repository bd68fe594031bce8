//! Mastokey server entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use mastokey_api::{AppState, router as api_router};
use mastokey_common::Config;
use mastokey_misskey::{ClientOptions, MisskeyClient};
use tokio::signal;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Largest request body accepted, sized for avatar and header uploads.
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mastokey=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting mastokey server...");

    // Load configuration
    let config = match std::env::var("MASTOKEY_CONFIG") {
        Ok(path) => Config::from_file(&path),
        Err(_) => Config::load(),
    }
    .context("failed to load configuration")?;

    let client = MisskeyClient::new(&ClientOptions {
        timeout: Duration::from_secs(config.proxy.timeout_secs),
        connect_timeout: Duration::from_secs(config.proxy.connect_timeout_secs),
        user_agent: config.proxy.user_agent.clone(),
    })
    .context("failed to build Misskey client")?;

    match &config.proxy.fallback_server {
        Some(server) => info!(server = %server, "Using fallback server"),
        None => info!("No fallback server configured; requests must send X-Proxy-Server"),
    }

    let state = AppState::new(Arc::new(client), config.proxy.fallback_server.clone());

    // Build router
    let app = api_router()
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("invalid server address")?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
