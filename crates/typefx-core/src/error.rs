//! Core error types for typefx-core.
//!
//! Runtime effect operations never fail; only loading configuration and
//! rule tables can. This module defines that error hierarchy with thiserror.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for typefx-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Rule table errors
    #[error("Rule table error: {0}")]
    Rules(#[from] RuleError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// Failed to serialize configuration
    #[error("Failed to serialize configuration: {0}")]
    SerializeFailed(String),

    /// Failed to access the configuration directory
    #[error("Failed to access config directory: {0}")]
    DataDir(String),
}

/// Errors raised while loading or validating a rule table.
#[derive(Error, Debug)]
pub enum RuleError {
    #[error("Failed to read rule table {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse rule table TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Unsupported rule table version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("Duplicate rule id '{0}'")]
    DuplicateId(String),

    #[error("Invalid rule '{id}': {message}")]
    InvalidRule { id: String, message: String },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
