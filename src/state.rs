//! Shared application state.
//!
//! Contains the state that is shared across all request handlers:
//! the configuration, the membership collector and the metrics registry.

use crate::config::Config;
use crate::metrics::{MembershipCollector, Metrics};
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded at startup.
    pub config: Arc<Config>,
    /// Runs one collection cycle per scrape.
    pub collector: Arc<MembershipCollector>,
    /// Registry for metrics that outlive a single scrape.
    pub metrics: Metrics,
}
