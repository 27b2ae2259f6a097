use std::fmt;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Mandate, Subscription};

pub const LIVE_BASE_URL: &str = "https://api.gocardless.com";
pub const SANDBOX_BASE_URL: &str = "https://api-sandbox.gocardless.com";

/// Which GoCardless deployment the exporter talks to.
#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Live,
    Sandbox,
}

impl Environment {
    pub fn base_url(self) -> &'static str {
        match self {
            Environment::Live => LIVE_BASE_URL,
            Environment::Sandbox => SANDBOX_BASE_URL,
        }
    }
}

/// The two collections the exporter reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Subscriptions,
    Mandates,
}

impl ResourceKind {
    /// Path segment, which is also the key of the list envelope in the response.
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Subscriptions => "subscriptions",
            ResourceKind::Mandates => "mandates",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record type that can be listed from the provider.
pub trait Resource: DeserializeOwned + Send {
    const KIND: ResourceKind;
}

impl Resource for Subscription {
    const KIND: ResourceKind = ResourceKind::Subscriptions;
}

impl Resource for Mandate {
    const KIND: ResourceKind = ResourceKind::Mandates;
}

/// Query filters for a list request. The limit is sent as given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListFilters {
    pub status: String,
    pub limit: u32,
}

impl ListFilters {
    pub fn active(limit: u32) -> Self {
        Self {
            status: "active".to_string(),
            limit,
        }
    }

    pub fn as_query(&self) -> [(&'static str, String); 2] {
        [
            ("status", self.status.clone()),
            ("limit", self.limit.to_string()),
        ]
    }
}

/// A single page of records along with the limit that was requested.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub limit: u32,
}

impl<T> Page<T> {
    /// A full page means later records may have been cut off.
    pub fn is_truncated(&self) -> bool {
        self.items.len() as u64 >= u64::from(self.limit)
    }
}

/// Why a list request produced no usable collection.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {resource} failed: {source}")]
    Transport {
        resource: ResourceKind,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {resource} timed out")]
    Timeout { resource: ResourceKind },

    #[error("{resource} returned status {status}: {message}")]
    Status {
        resource: ResourceKind,
        status: u16,
        message: String,
    },

    #[error("{resource} returned provider error ({error_type}): {message}")]
    Provider {
        resource: ResourceKind,
        error_type: String,
        message: String,
    },

    #[error("could not decode {resource} response: {message}")]
    Decode {
        resource: ResourceKind,
        message: String,
    },
}

impl FetchError {
    pub fn resource(&self) -> ResourceKind {
        match self {
            FetchError::Transport { resource, .. }
            | FetchError::Timeout { resource }
            | FetchError::Status { resource, .. }
            | FetchError::Provider { resource, .. }
            | FetchError::Decode { resource, .. } => *resource,
        }
    }
}

/// Read access to the billing provider, as needed by one scrape cycle.
#[async_trait]
pub trait BillingApi: Send + Sync {
    async fn subscriptions(&self, filters: &ListFilters) -> Result<Page<Subscription>, FetchError>;
    async fn mandates(&self, filters: &ListFilters) -> Result<Page<Mandate>, FetchError>;
}
