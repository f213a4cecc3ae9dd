//! Configuration System
//!
//! Layered configuration built with the `config` crate. Precedence, lowest
//! to highest: built-in defaults, `config/ripple.toml`, `config/{RIPPLE_ENV}.toml`,
//! then `RIPPLE__SECTION__KEY` environment variables.

use crate::error::ConfigError;
use crate::logging::LoggingConfig;
use crate::types::EntryPointId;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RippleConfig {
    /// Session-wide propagation settings
    #[serde(default)]
    pub session: SessionConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Session settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Entry point used when a caller does not name one
    #[serde(default = "default_entry_point")]
    pub default_entry_point: String,

    /// First propagation number handed out by a new session
    #[serde(default = "default_first_propagation_number")]
    pub first_propagation_number: u64,

    /// Type declaration file loaded into the session's registry
    #[serde(default)]
    pub declarations: Option<PathBuf>,
}

fn default_entry_point() -> String {
    EntryPointId::DEFAULT_NAME.to_string()
}

fn default_first_propagation_number() -> u64 {
    1
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_entry_point: default_entry_point(),
            first_propagation_number: default_first_propagation_number(),
            declarations: None,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.default_entry_point.trim().is_empty() {
            return Err("Default entry point cannot be empty".to_string());
        }
        if self.first_propagation_number == 0 {
            return Err("First propagation number must be positive".to_string());
        }
        if let Some(path) = &self.declarations {
            if path.as_os_str().is_empty() {
                return Err("Declarations path cannot be empty".to_string());
            }
        }
        Ok(())
    }

    pub fn entry_point(&self) -> EntryPointId {
        EntryPointId::new(self.default_entry_point.clone())
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Session(String),
    Logging(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Session(msg) => write!(f, "Session: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl RippleConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.session.validate() {
            errors.push(ValidationError::Session(e));
        }

        if !matches!(self.logging.format.as_str(), "json" | "text") {
            errors.push(ValidationError::Logging(format!(
                "Invalid log format '{}'",
                self.logging.format
            )));
        }
        if !matches!(self.logging.output.as_str(), "stdout" | "stderr" | "file") {
            errors.push(ValidationError::Logging(format!(
                "Invalid log output '{}'",
                self.logging.output
            )));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Loads [`RippleConfig`] from files and the environment
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace root.
    pub fn load(workspace_root: &Path) -> Result<RippleConfig, ConfigError> {
        let config_dir = workspace_root.join("config");
        let env_name = std::env::var("RIPPLE_ENV").unwrap_or_else(|_| "development".to_string());

        let builder = builder_with_defaults()?
            .add_source(File::from(config_dir.join("ripple.toml")).required(false))
            .add_source(File::from(config_dir.join(format!("{}.toml", env_name))).required(false));

        finish(builder)
    }

    /// Load configuration from an explicit file (must exist).
    pub fn load_from_file(path: &Path) -> Result<RippleConfig, ConfigError> {
        let builder = builder_with_defaults()?.add_source(File::from(path).required(true));
        finish(builder)
    }
}

fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(Config::builder()
        .set_default("session.default_entry_point", EntryPointId::DEFAULT_NAME)?
        .set_default("session.first_propagation_number", 1_i64)?)
}

fn finish(builder: ConfigBuilder<DefaultState>) -> Result<RippleConfig, ConfigError> {
    let config: RippleConfig = builder
        .add_source(
            Environment::with_prefix("RIPPLE")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()?;

    config.validate().map_err(|errors| {
        let msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        ConfigError::Invalid(format!(
            "Configuration validation failed:\n{}",
            msgs.join("\n")
        ))
    })?;

    debug!(
        entry_point = %config.session.default_entry_point,
        first_propagation_number = config.session.first_propagation_number,
        "Configuration loaded"
    );
    Ok(config)
}
