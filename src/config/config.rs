use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use thiserror::Error;

use super::logging::LoggingConfig;
use crate::client::Environment;

/// Environment variable prefix for every setting.
pub const ENV_PREFIX: &str = "GOCARDLESS_";
/// Overrides the location of the YAML configuration file.
pub const CONFIG_PATH_ENV: &str = "GOCARDLESS_EXPORTER_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "./config.yaml";

/// Errors that stop the exporter before it starts serving.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("error loading configuration: {0}")]
    Load(String),

    #[error("no GoCardless access token configured (set GOCARDLESS_TOKEN or token_file)")]
    MissingToken,

    #[error("could not read token file {path}: {source}")]
    TokenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Access token for the provider API. Never printed.
#[derive(Deserialize, JsonSchema, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    pub fn new(token: impl Into<String>) -> Self {
        Token(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(<redacted>)")
    }
}

/// Exporter configuration, built once at startup.
#[derive(Deserialize, Debug, JsonSchema, Clone)]
pub struct Config {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub token: Token,
    /// File holding the token, e.g. a mounted secret. Used when `token` is unset.
    #[serde(default)]
    pub token_file: Option<PathBuf>,
    /// Replaces the environment's API host.
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_bind_address() -> String {
    "0.0.0.0:5002".to_string()
}

fn default_page_limit() -> u32 {
    500
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

impl Config {
    /// The API host requests are sent to.
    pub fn base_url(&self) -> &str {
        self.api_base_url
            .as_deref()
            .unwrap_or_else(|| self.environment.base_url())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    fn resolve_token(&mut self) -> Result<(), ConfigError> {
        if self.token.is_empty() {
            if let Some(path) = &self.token_file {
                let contents =
                    std::fs::read_to_string(path).map_err(|source| ConfigError::TokenFile {
                        path: path.clone(),
                        source,
                    })?;
                self.token = Token::new(contents.trim());
            }
        }
        if self.token.is_empty() {
            return Err(ConfigError::MissingToken);
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.page_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "page_limit",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        self.bind_address
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue {
                field: "bind_address",
                reason: e.to_string(),
            })?;
        Ok(())
    }
}

/// Figment reading the YAML file (if any), overridden by `GOCARDLESS_*` variables.
///
/// Nested keys use a double underscore, e.g. `GOCARDLESS_LOGGING__LEVEL`.
pub fn figment() -> Figment {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    Figment::new()
        .merge(Yaml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

/// Loads and validates the configuration from file and environment.
pub fn load_config() -> Result<Config, ConfigError> {
    from_figment(figment())
}

/// Extracts a validated configuration, resolving the token from its file if needed.
pub fn from_figment(figment: Figment) -> Result<Config, ConfigError> {
    let mut config: Config = figment
        .extract()
        .map_err(|e| ConfigError::Load(e.to_string()))?;
    config.resolve_token()?;
    config.validate()?;
    Ok(config)
}

/// Print the JSON schema for the configuration to stdout.
pub fn print_schema() -> Result<(), serde_json::Error> {
    let schema = schema_for!(Config);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
