//! Error types for the propagation core.

use thiserror::Error;

/// Errors raised while building, adapting or draining a propagation context
#[derive(Debug, Error)]
pub enum PropagationError {
    #[error("Unknown propagation event kind: {0}")]
    UnknownEventKind(i32),

    #[error("Type adaptation unsupported: no property ordering for {package}.{class}")]
    TypeAdaptationUnsupported { package: String, class: String },

    #[error("Action failed: {0}")]
    Action(#[from] ActionError),
}

/// Failure raised by a working-memory action while it executes.
///
/// The scheduler never inspects or retries these; they abort the drain.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("{0}")]
    Failed(String),

    #[error("Nested propagation failed: {0}")]
    Propagation(Box<PropagationError>),
}

impl ActionError {
    pub fn failed(msg: impl Into<String>) -> Self {
        ActionError::Failed(msg.into())
    }
}

impl From<PropagationError> for ActionError {
    fn from(err: PropagationError) -> Self {
        ActionError::Propagation(Box::new(err))
    }
}

/// Persisted context record errors
#[derive(Debug, Error)]
pub enum MarshalError {
    #[error("Failed to encode propagation context: {0}")]
    Encode(String),

    #[error("Failed to decode propagation context: {0}")]
    Decode(String),

    #[error("Unknown propagation event kind in record: {0}")]
    UnknownEventKind(i32),
}

impl From<bincode::Error> for MarshalError {
    fn from(err: bincode::Error) -> Self {
        MarshalError::Decode(err.to_string())
    }
}

/// Configuration and declaration-loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse type declarations: {0}")]
    Parse(String),

    #[error("Configuration I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::Load(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}
