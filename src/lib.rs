//! Library exports for the GoCardless exporter, shared between the binary and tests.

pub mod client;
pub mod config;
pub mod metrics;
pub mod models;
pub mod routes;
pub mod startup;
pub mod state;
pub mod utils;
