//! Application startup and server initialization.
//!
//! Builds the GoCardless client, the metrics registry and the membership
//! collector from the configuration, then serves the router until a
//! shutdown signal arrives.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::client::GoCardlessClient;
use crate::config::Config;
use crate::metrics::{MembershipCollector, Metrics};
use crate::routes;
use crate::state::AppState;

/// Wires the collector and registry together from the configuration.
pub fn build_state(config: Arc<Config>) -> Result<AppState, Box<dyn std::error::Error>> {
    let client = GoCardlessClient::with_base_url(
        config.base_url(),
        config.token.expose(),
        config.request_timeout(),
    )?;
    let metrics = Metrics::new()?;
    let collector = Arc::new(MembershipCollector::new(
        Arc::new(client),
        config.page_limit,
        metrics.clone(),
    ));

    Ok(AppState {
        config,
        collector,
        metrics,
    })
}

/// Initializes and runs the metrics server.
///
/// # Errors
///
/// Returns an error if the client or registry cannot be built, or the server
/// fails to bind to the configured address.
pub async fn run(config: Arc<Config>) -> Result<(), Box<dyn std::error::Error>> {
    let state = build_state(config.clone())?;
    let app = routes::create_router(state);

    info!(
        environment = ?config.environment,
        page_limit = config.page_limit,
        "Starting metrics server on {}",
        config.bind_address
    );
    let listener = TcpListener::bind(&config.bind_address).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Metrics server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
