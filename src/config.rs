//! Layered configuration
//!
//! Sources, lowest priority first:
//!
//! 1. Built-in defaults
//! 2. `.env` file (loaded into the environment)
//! 3. `cadence.toml` in the working directory, or an explicit file
//! 4. `CADENCE_*` environment variables (`CADENCE_ENGINE__MAX_DEPTH`, ...)
//! 5. Builder overrides
//!
//! # Example
//!
//! ```rust,no_run
//! use cadence_core::config::Config;
//!
//! let config = Config::builder()
//!     .config_path("cadence.toml")
//!     .max_depth(500)
//!     .build()?;
//! # Ok::<(), cadence_core::config::ConfigError>(())
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::executor::process::DEFAULT_MAX_DEPTH;

const DEFAULT_CONFIG_FILE: &str = "cadence";
const ENV_PREFIX: &str = "CADENCE";
const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub engine: EngineConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum number of frames per process
    pub max_depth: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default tracing filter, used when `RUST_LOG` is unset
    pub level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: EngineConfig {
                max_depth: DEFAULT_MAX_DEPTH,
            },
            logging: LoggingConfig {
                level: DEFAULT_LOG_LEVEL.to_string(),
            },
        }
    }
}

impl Config {
    /// Load from the default sources
    pub fn load() -> Result<Self, ConfigError> {
        Self::builder().build()
    }

    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.engine.max_depth < 1 {
            return Err(ConfigError::Invalid(
                "engine.max_depth must be at least 1".to_string(),
            ));
        }
        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::Invalid("logging.level must not be empty".to_string()));
        }
        Ok(self)
    }

    /// Effective configuration as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

/// Builder for a `Config` with explicit overrides
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config_path: Option<String>,
    max_depth: Option<usize>,
    log_level: Option<String>,
}

impl ConfigBuilder {
    /// Config file path (overrides default search; the file must exist)
    pub fn config_path(mut self, path: impl Into<String>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }

    pub fn build(self) -> Result<Config, ConfigError> {
        // A missing .env file is fine
        let _ = dotenvy::dotenv();

        let defaults = Config::default();
        let file = match &self.config_path {
            Some(path) => ::config::File::with_name(path).required(true),
            None => ::config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };
        let mut builder = ::config::Config::builder()
            .set_default("engine.max_depth", defaults.engine.max_depth as u64)?
            .set_default("logging.level", defaults.logging.level)?
            .add_source(file)
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        if let Some(max_depth) = self.max_depth {
            builder = builder.set_override("engine.max_depth", max_depth as u64)?;
        }
        if let Some(level) = self.log_level {
            builder = builder.set_override("logging.level", level)?;
        }

        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.engine.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_builder_overrides() {
        let config = Config::builder()
            .max_depth(64)
            .log_level("debug")
            .build()
            .expect("config should build");
        assert_eq!(config.engine.max_depth, 64);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_zero_depth_is_rejected() {
        let result = Config::builder().max_depth(0).build();
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result = Config::builder().config_path("does-not-exist.toml").build();
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }

    #[test]
    fn test_toml_output() {
        let text = Config::default().to_toml().expect("serializable");
        assert!(text.contains("[engine]"));
        assert!(text.contains("max_depth = 10000"));
        let parsed: Config = toml::from_str(&text).expect("round trip");
        assert_eq!(parsed, Config::default());
    }
}
