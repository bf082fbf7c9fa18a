//! Bridge configuration
//!
//! Loaded from TOML, with environment overrides:
//!
//! ```toml
//! overflow = "terminate"      # or "reject"
//! default_stream = "stdout"   # or "stderr"
//!
//! [logging]
//! level = "info"
//! json = false
//! spans = false
//! file = "vabridge.log"
//! ```

use crate::logging::LogConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracing::Level;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub overflow: OverflowPolicy,

    #[serde(default)]
    pub default_stream: DefaultStream,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// What a guest call does when its format implies too many arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// End the process with the overflow exit status
    #[default]
    Terminate,
    /// Return an error to the caller
    Reject,
}

/// Stream used by calls that name no explicit destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefaultStream {
    #[default]
    Stdout,
    Stderr,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default)]
    pub json: bool,

    #[serde(default)]
    pub spans: bool,

    #[serde(default)]
    pub file: Option<String>,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
            spans: false,
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Convert into a subscriber configuration
    pub fn to_log_config(&self) -> Result<LogConfig, ConfigError> {
        let level = Level::from_str(&self.level).map_err(|_| ConfigError::InvalidValue {
            key: "logging.level",
            value: self.level.clone(),
        })?;

        Ok(LogConfig {
            level,
            log_path: self.file.clone(),
            json_format: self.json,
            show_spans: self.spans,
        })
    }
}

impl FromStr for OverflowPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "terminate" => Ok(Self::Terminate),
            "reject" => Ok(Self::Reject),
            _ => Err(ConfigError::InvalidValue {
                key: "overflow",
                value: s.to_string(),
            }),
        }
    }
}

impl FromStr for DefaultStream {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stdout" => Ok(Self::Stdout),
            "stderr" => Ok(Self::Stderr),
            _ => Err(ConfigError::InvalidValue {
                key: "default_stream",
                value: s.to_string(),
            }),
        }
    }
}

impl BridgeConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Defaults plus environment overrides
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }

    /// Apply `VABRIDGE_OVERFLOW` and `VABRIDGE_DEFAULT_STREAM`
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(value) = lookup("VABRIDGE_OVERFLOW") {
            self.overflow = value.parse()?;
        }
        if let Some(value) = lookup("VABRIDGE_DEFAULT_STREAM") {
            self.default_stream = value.parse()?;
        }
        Ok(self)
    }
}
