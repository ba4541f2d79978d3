use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::domain::{BranchDescriptor, Category};
use crate::error::{BranchwatchError, Result};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub fanout: FanOutConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Branch directory used when `registry.source = "static"`
    #[serde(default)]
    pub branches: Vec<BranchDescriptor>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RegistrySource {
    #[default]
    Static,
    Postgres,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub source: RegistrySource,
    /// Central directory database (postgres source only)
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Category tags branches must carry to be listed
    #[serde(default = "default_categories")]
    pub categories: Vec<Category>,
}

fn default_max_connections() -> u32 {
    2
}

fn default_categories() -> Vec<Category> {
    Category::ALL.to_vec()
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            source: RegistrySource::Static,
            url: None,
            max_connections: default_max_connections(),
            categories: default_categories(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FanOutConfig {
    /// Deadline for opening one branch connection
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,
    /// Deadline for the category query, independent of the connect deadline
    #[serde(default = "default_query_timeout")]
    pub query_timeout_ms: u64,
    /// Tax factor backed out of gross sales on the sales-ledger shape
    #[serde(default = "default_vat_factor")]
    pub vat_factor: Decimal,
}

fn default_connect_timeout() -> u64 {
    1500
}

fn default_query_timeout() -> u64 {
    2000
}

fn default_vat_factor() -> Decimal {
    Decimal::new(119, 2)
}

impl FanOutConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }
}

impl Default for FanOutConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout(),
            query_timeout_ms: default_query_timeout(),
            vat_factor: default_vat_factor(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProbeConfig {
    /// Timeout for each network liveness attempt
    #[serde(default = "default_liveness_timeout")]
    pub liveness_timeout_ms: u64,
    #[serde(default = "default_liveness_attempts")]
    pub liveness_attempts: u32,
    /// Successful attempts required to call a host reachable
    #[serde(default = "default_liveness_min_replies")]
    pub liveness_min_replies: u32,
    /// Budget for database open + round trip
    #[serde(default = "default_database_timeout")]
    pub database_timeout_ms: u64,
}

fn default_liveness_timeout() -> u64 {
    1000
}

fn default_liveness_attempts() -> u32 {
    2
}

fn default_liveness_min_replies() -> u32 {
    1
}

fn default_database_timeout() -> u64 {
    3000
}

impl ProbeConfig {
    pub fn liveness_timeout(&self) -> Duration {
        Duration::from_millis(self.liveness_timeout_ms)
    }

    pub fn database_timeout(&self) -> Duration {
        Duration::from_millis(self.database_timeout_ms)
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            liveness_timeout_ms: default_liveness_timeout(),
            liveness_attempts: default_liveness_attempts(),
            liveness_min_replies: default_liveness_min_replies(),
            database_timeout_ms: default_database_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
    /// Directory for the rotating log file; file logging is off when unset
    #[serde(default)]
    pub dir: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            dir: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> std::result::Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> std::result::Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with default values
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            .set_default("fanout.connect_timeout_ms", default_connect_timeout())?
            .set_default("fanout.query_timeout_ms", default_query_timeout())?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("BRANCHWATCH_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (BRANCHWATCH_REGISTRY__URL, etc.)
            .add_source(
                Environment::with_prefix("BRANCHWATCH")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Sanity-check values the deserializer cannot
    pub fn validate(&self) -> Result<()> {
        if self.fanout.connect_timeout_ms == 0 || self.fanout.query_timeout_ms == 0 {
            return Err(BranchwatchError::InvalidConfig(
                "fan-out deadlines must be non-zero".into(),
            ));
        }
        if self.fanout.vat_factor <= Decimal::ZERO {
            return Err(BranchwatchError::InvalidConfig(
                "vat_factor must be positive".into(),
            ));
        }
        if self.probe.liveness_timeout_ms == 0 || self.probe.database_timeout_ms == 0 {
            return Err(BranchwatchError::InvalidConfig(
                "probe timeouts must be non-zero".into(),
            ));
        }
        if self.probe.liveness_attempts == 0
            || self.probe.liveness_min_replies > self.probe.liveness_attempts
        {
            return Err(BranchwatchError::InvalidConfig(format!(
                "liveness_min_replies ({}) must be within 1..={} attempts",
                self.probe.liveness_min_replies, self.probe.liveness_attempts
            )));
        }
        if self.registry.source == RegistrySource::Postgres && self.registry.url.is_none() {
            return Err(BranchwatchError::InvalidConfig(
                "registry.url is required for the postgres registry".into(),
            ));
        }
        if self.registry.categories.is_empty() {
            return Err(BranchwatchError::InvalidConfig(
                "registry.categories must list at least one category".into(),
            ));
        }
        Ok(())
    }
}
