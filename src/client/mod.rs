//! Read-only client for the GoCardless REST API.

pub mod base;
pub mod gocardless_client;

pub use base::*;
pub use gocardless_client::GoCardlessClient;
