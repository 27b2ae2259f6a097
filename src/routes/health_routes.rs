//! Health check endpoint.

use crate::client::Environment;
use crate::state::AppState;
use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

#[derive(Serialize)]
struct Health {
    status: &'static str,
    environment: Environment,
    version: &'static str,
}

/// Registers health check routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// Liveness only: reports OK without contacting GoCardless.
async fn health_check(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "OK",
        environment: state.config.environment,
        version: env!("CARGO_PKG_VERSION"),
    })
}
