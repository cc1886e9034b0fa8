//! Layered application configuration.
//!
//! Values resolve in order: built-in defaults, then an optional TOML
//! file (path from `EMBER_CONFIG`, default `ember.toml`), then
//! `EMBER__`-prefixed environment variables with `__` separating
//! nesting levels, e.g. `EMBER__CHAIN__RPC_URL`.

use crate::cache::CacheSettings;
use crate::events::ContractAddresses;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "ember.toml";
const CONFIG_PATH_VAR: &str = "EMBER_CONFIG";
const ENV_PREFIX: &str = "EMBER";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_bind_port")]
    pub bind_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            bind_port: default_bind_port(),
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_bind_port() -> u16 {
    8090
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    #[serde(default)]
    pub rpc_url: String,
    #[serde(default = "default_poll_interval_seconds")]
    pub poll_interval_seconds: u64,
    #[serde(default = "default_fetch_timeout_seconds")]
    pub fetch_timeout_seconds: u64,
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
    #[serde(default)]
    pub contracts: ContractAddresses,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: String::new(),
            poll_interval_seconds: default_poll_interval_seconds(),
            fetch_timeout_seconds: default_fetch_timeout_seconds(),
            request_timeout_seconds: default_request_timeout_seconds(),
            contracts: ContractAddresses::default(),
        }
    }
}

fn default_poll_interval_seconds() -> u64 {
    10
}

fn default_fetch_timeout_seconds() -> u64 {
    5
}

fn default_request_timeout_seconds() -> u64 {
    15
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CursorConfig {
    #[serde(default = "default_cursor_path")]
    pub path: String,
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            path: default_cursor_path(),
        }
    }
}

fn default_cursor_path() -> String {
    "data/cursor.json".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// `pretty` for humans, `json` for log shippers.
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub cursor: CursorConfig,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Loads configuration from defaults, file and environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a source cannot be read, a value
    /// cannot be deserialized, or validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        let path =
            std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(&path)
    }

    /// Loads configuration with an explicit file path.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load).
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;
        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the assembled configuration for operator mistakes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first problem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chain.rpc_url.is_empty() {
            return Err(ConfigError::Invalid("chain.rpc_url must be set".to_string()));
        }
        if !self.chain.rpc_url.starts_with("http://") && !self.chain.rpc_url.starts_with("https://")
        {
            return Err(ConfigError::Invalid(format!(
                "chain.rpc_url must be an http(s) url, got {}",
                self.chain.rpc_url
            )));
        }
        if self.chain.poll_interval_seconds == 0 {
            return Err(ConfigError::Invalid(
                "chain.poll_interval_seconds must be positive".to_string(),
            ));
        }
        if self.chain.fetch_timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "chain.fetch_timeout_seconds must be positive".to_string(),
            ));
        }
        self.server
            .bind_address
            .parse::<IpAddr>()
            .map_err(|_| {
                ConfigError::Invalid(format!(
                    "server.bind_address is not an ip address: {}",
                    self.server.bind_address
                ))
            })?;
        match self.logging.format.as_str() {
            "pretty" | "json" => {}
            other => {
                return Err(ConfigError::Invalid(format!(
                    "logging.format must be pretty or json, got {other}"
                )))
            }
        }
        self.cache
            .validate()
            .map_err(|error| ConfigError::Invalid(error.to_string()))?;
        Ok(())
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.chain.poll_interval_seconds)
    }

    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.chain.fetch_timeout_seconds)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.chain.request_timeout_seconds)
    }

    /// Admin API bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the bind address failed to
    /// parse, which [`validate`](Self::validate) would have caught.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self.server.bind_address.parse().map_err(|_| {
            ConfigError::Invalid(format!(
                "server.bind_address is not an ip address: {}",
                self.server.bind_address
            ))
        })?;
        Ok(SocketAddr::new(ip, self.server.bind_port))
    }
}
