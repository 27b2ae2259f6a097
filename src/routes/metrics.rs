//! Metrics exposition endpoint.

use crate::state::AppState;
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use tracing::error;

pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Creates the metrics route.
pub fn routes() -> Router<AppState> {
    Router::new().route("/metrics", get(metrics_handler))
}

/// Handler for the /metrics endpoint.
///
/// Every request runs a fresh collection cycle against GoCardless before
/// rendering, so the response reflects the provider's state at scrape time.
async fn metrics_handler(State(state): State<AppState>) -> Response {
    let scraped = state.collector.collect().await;

    match state.metrics.render(scraped) {
        Ok(metrics_text) => (
            StatusCode::OK,
            [("Content-Type", CONTENT_TYPE)],
            metrics_text,
        )
            .into_response(),
        Err(e) => {
            error!(
                event_name = "routes.metrics.encode_failed",
                event_domain = "routes",
                error = %e,
                "failed to encode metrics"
            );
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode metrics").into_response()
        }
    }
}
