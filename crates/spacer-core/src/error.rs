//! Error types for spacer-core

use thiserror::Error;

/// Result type alias using spacer-core's configuration error
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Configuration errors raised while assembling the process settings
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required environment variable is absent or empty
    #[error("Missing required environment variable: {name}")]
    MissingVar { name: String },

    /// A variable is present but cannot be interpreted
    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },

    /// An explicitly requested env file could not be loaded
    #[error("Failed to load env file {path}: {source}")]
    EnvFile {
        path: String,
        #[source]
        source: dotenvy::Error,
    },
}

impl ConfigError {
    /// Create a missing variable error
    pub fn missing_var(name: impl Into<String>) -> Self {
        Self::MissingVar { name: name.into() }
    }

    /// Create an invalid value error
    pub fn invalid_value(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
