// Configuration management for the discovery terminal

use crate::ledger::{ParsePolicy, DEFAULT_COMMISSION_RATE};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

pub const ENV_API_URL: &str = "QDT_API_URL";
pub const ENV_LOG_LEVEL: &str = "QDT_LOG_LEVEL";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub replay: ReplayConfig,
    #[serde(default)]
    pub backtest: BacktestDefaults,
    #[serde(default)]
    pub audit: AuditConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayConfig {
    #[serde(default = "default_starting_cash")]
    pub starting_cash: f64,
    #[serde(default = "default_commission_rate")]
    pub commission_rate: f64,
    /// Reject lines with unknown sides or non-numeric fields
    #[serde(default)]
    pub strict: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestDefaults {
    #[serde(default = "default_symbol")]
    pub symbol: String,
    #[serde(default = "default_timeframe")]
    pub timeframe: String,
    #[serde(default = "default_strategy")]
    pub strategy: String,
    #[serde(default = "default_starting_cash")]
    pub initial_capital: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// Default value functions
fn default_base_url() -> String { "http://localhost:8000".to_string() }
fn default_timeout() -> u64 { 60 }
fn default_starting_cash() -> f64 { 10000.0 }
fn default_commission_rate() -> f64 { DEFAULT_COMMISSION_RATE }
fn default_symbol() -> String { "BTC/USDT".to_string() }
fn default_timeframe() -> String { "1h".to_string() }
fn default_strategy() -> String { "SmaCrossover".to_string() }
fn default_tolerance() -> f64 { 0.01 }
fn default_log_level() -> String { "info".to_string() }

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            starting_cash: default_starting_cash(),
            commission_rate: default_commission_rate(),
            strict: false,
        }
    }
}

impl ReplayConfig {
    pub fn policy(&self) -> ParsePolicy {
        if self.strict {
            ParsePolicy::Strict
        } else {
            ParsePolicy::Lenient
        }
    }
}

impl Default for BacktestDefaults {
    fn default() -> Self {
        Self {
            symbol: default_symbol(),
            timeframe: default_timeframe(),
            strategy: default_strategy(),
            initial_capital: default_starting_cash(),
            scenario_id: None,
        }
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            tolerance: default_tolerance(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileRead(format!("{}: {}", path.as_ref().display(), e)))?;

        let config = Self::from_toml_str(&content)?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;

        fs::write(path, content)
            .map_err(|e| ConfigError::FileWrite(e.to_string()))?;

        Ok(())
    }

    /// Load configuration from file, falling back to defaults when the file
    /// does not exist. Environment overrides are applied either way.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = if path.as_ref().exists() {
            Self::from_file(&path)?
        } else {
            debug!("No config at {}, using defaults", path.as_ref().display());
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// `QDT_API_URL` and `QDT_LOG_LEVEL` win over the file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(ENV_API_URL) {
            if !url.trim().is_empty() {
                self.api.base_url = url.trim().to_string();
            }
        }
        if let Ok(level) = std::env::var(ENV_LOG_LEVEL) {
            if !level.trim().is_empty() {
                self.logging.log_level = level.trim().to_lowercase();
            }
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.api.base_url.starts_with("http://") || self.api.base_url.starts_with("https://")) {
            return Err(ConfigError::Validation(format!(
                "api.base_url must start with http:// or https:// (got '{}')",
                self.api.base_url
            )));
        }

        if self.api.timeout_seconds == 0 {
            return Err(ConfigError::Validation("api.timeout_seconds must be greater than 0".to_string()));
        }

        if !(self.replay.starting_cash.is_finite() && self.replay.starting_cash > 0.0) {
            return Err(ConfigError::Validation("replay.starting_cash must be positive".to_string()));
        }

        if !(0.0..1.0).contains(&self.replay.commission_rate) {
            return Err(ConfigError::Validation("replay.commission_rate must be between 0 and 1".to_string()));
        }

        if !(self.backtest.initial_capital.is_finite() && self.backtest.initial_capital > 0.0) {
            return Err(ConfigError::Validation("backtest.initial_capital must be positive".to_string()));
        }

        if !(self.audit.tolerance.is_finite() && self.audit.tolerance >= 0.0) {
            return Err(ConfigError::Validation("audit.tolerance must be non-negative".to_string()));
        }

        if !LOG_LEVELS.contains(&self.logging.log_level.as_str()) {
            return Err(ConfigError::Validation(format!(
                "logging.log_level must be one of {:?}",
                LOG_LEVELS
            )));
        }

        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(String),

    #[error("Failed to write config file: {0}")]
    FileWrite(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Failed to serialize config: {0}")]
    Serialize(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}
