//! Configuration loading and typed config structures for the tracker.
//!
//! The canonical configuration lives in `incursion-config.yaml` at the
//! working directory (or wherever `INCURSION_CONFIG` points). Every field
//! has a default, so a missing file or a partial one is fine.
//!
//! Environment variables override infrastructure values:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `DATABASE_URL` | `database.url` |
//! | `ESI_BASE_URL` | `feed.base_url` |
//! | `BIND_HOST` | `server.host` |
//! | `BIND_PORT` | `server.port` |

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use incursion_db::SqliteConfig;
use incursion_esi::EsiConfig;
use incursion_ledger::SecurityPolicy;
use incursion_types::PerTier;

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "INCURSION_CONFIG";

/// Config file used when `INCURSION_CONFIG` is unset.
pub const DEFAULT_CONFIG_PATH: &str = "incursion-config.yaml";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but makes no sense.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level tracker configuration.
///
/// Mirrors the structure of `incursion-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TrackerConfig {
    /// `SQLite` store settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Feed client settings.
    #[serde(default)]
    pub feed: EsiConfig,

    /// HTTP bind address for the read API.
    #[serde(default)]
    pub server: HttpConfig,

    /// Reconciliation cycle settings.
    #[serde(default)]
    pub reconcile: ReconcileConfig,

    /// Security status classification thresholds.
    #[serde(default)]
    pub security: SecurityPolicy,

    /// Per-tier capacity of the recent-history view.
    #[serde(default)]
    pub timers: TimerConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TrackerConfig {
    /// Load from `INCURSION_CONFIG` or [`DEFAULT_CONFIG_PATH`].
    ///
    /// A missing file yields the defaults (with environment overrides).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file exists but cannot be read,
    /// parsed or validated.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
        if path.exists() {
            Self::from_file(&path)
        } else {
            tracing::info!(path = %path.display(), "Config file not found, using defaults");
            let mut config = Self::default();
            config.apply_env_overrides();
            config.validate()?;
            Ok(config)
        }
    }

    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Override infrastructure values from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Override infrastructure values from `lookup`.
    ///
    /// An unparseable `BIND_PORT` is ignored with a warning.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("DATABASE_URL") {
            self.database.url = val;
        }
        if let Some(val) = lookup("ESI_BASE_URL") {
            self.feed.base_url = val;
        }
        if let Some(val) = lookup("BIND_HOST") {
            self.server.host = val;
        }
        if let Some(val) = lookup("BIND_PORT") {
            match val.parse() {
                Ok(port) => self.server.port = port,
                Err(e) => tracing::warn!(value = %val, error = %e, "Ignoring invalid BIND_PORT"),
            }
        }
    }

    /// Reject values that would make the tracker misbehave.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reconcile.interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "reconcile.interval_secs must be at least 1".to_owned(),
            ));
        }
        if self.feed.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "feed.timeout_secs must be at least 1".to_owned(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be at least 1".to_owned(),
            ));
        }
        self.security
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

/// `SQLite` store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DatabaseConfig {
    /// Connection URL.
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Maximum pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl DatabaseConfig {
    /// Pool settings for the data layer.
    pub fn sqlite(&self) -> SqliteConfig {
        SqliteConfig::new(&self.url)
            .with_max_connections(self.max_connections)
            .with_busy_timeout(Duration::from_millis(self.busy_timeout_ms))
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

/// HTTP bind address.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HttpConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Reconciliation cycle configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReconcileConfig {
    /// Whether the server runs the periodic scheduler.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Seconds between cycle starts.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Abort a cycle on any unusable feed entry (except duplicates).
    #[serde(default = "default_true")]
    pub strict: bool,
}

impl ReconcileConfig {
    /// Interval as a [`Duration`].
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: default_interval_secs(),
            strict: true,
        }
    }
}

/// Per-tier capacity of the recent-history view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TimerConfig {
    /// High-security capacity.
    #[serde(default = "default_high_capacity")]
    pub high: usize,

    /// Low-security capacity.
    #[serde(default = "default_low_capacity")]
    pub low: usize,

    /// Null-security capacity.
    #[serde(default = "default_null_capacity")]
    pub null: usize,
}

impl TimerConfig {
    /// Capacities as a [`PerTier`].
    pub const fn capacity(&self) -> PerTier<usize> {
        PerTier::new(self.high, self.low, self.null)
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            high: default_high_capacity(),
            low: default_low_capacity(),
            null: default_null_capacity(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Plain,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_database_url() -> String {
    "sqlite://incursion.db".to_owned()
}

const fn default_max_connections() -> u32 {
    5
}

const fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_port() -> u16 {
    3000
}

const fn default_true() -> bool {
    true
}

const fn default_interval_secs() -> u64 {
    300
}

const fn default_high_capacity() -> usize {
    1
}

const fn default_low_capacity() -> usize {
    1
}

const fn default_null_capacity() -> usize {
    3
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn empty_yaml_gives_defaults() {
        let config: TrackerConfig = serde_yml::from_str("{}").unwrap();
        assert_eq!(config, TrackerConfig::default());
        assert_eq!(config.timers.capacity(), PerTier::new(1, 1, 3));
        assert_eq!(config.server.port, 3000);
        assert!(config.reconcile.strict);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let yaml = r"
database:
  url: sqlite://data/tracker.db
reconcile:
  strict: false
  interval_secs: 60
security:
  null_below: 0.0
timers:
  null: 5
logging:
  format: json
";
        let config: TrackerConfig = serde_yml::from_str(yaml).unwrap();
        assert_eq!(config.database.url, "sqlite://data/tracker.db");
        assert_eq!(config.database.max_connections, 5);
        assert!(!config.reconcile.strict);
        assert!(config.reconcile.enabled);
        assert_eq!(config.reconcile.interval(), Duration::from_secs(60));
        assert_eq!(config.security.null_below, Decimal::ZERO);
        assert_eq!(config.security.low_below, Decimal::new(5, 1));
        assert_eq!(config.timers.capacity(), PerTier::new(1, 1, 5));
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.feed.datasource, "tranquility");
    }

    #[test]
    fn overrides_replace_infrastructure_values() {
        let mut config = TrackerConfig::default();
        config.apply_overrides(|key| match key {
            "DATABASE_URL" => Some("sqlite::memory:".to_owned()),
            "ESI_BASE_URL" => Some("http://localhost:9999".to_owned()),
            "BIND_PORT" => Some("8081".to_owned()),
            _ => None,
        });
        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.feed.base_url, "http://localhost:9999");
        assert_eq!(config.server.port, 8081);
        assert_eq!(config.server.host, "0.0.0.0");
    }

    #[test]
    fn bad_port_override_is_ignored() {
        let mut config = TrackerConfig::default();
        config.apply_overrides(|key| (key == "BIND_PORT").then(|| "eighty".to_owned()));
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn zero_interval_is_rejected() {
        let mut config = TrackerConfig::default();
        config.reconcile.interval_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn inverted_thresholds_are_rejected() {
        let mut config = TrackerConfig::default();
        config.security.null_below = Decimal::ONE;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        assert!(matches!(
            TrackerConfig::parse("reconcile: [1, 2"),
            Err(ConfigError::Yaml { .. })
        ));
    }
}
