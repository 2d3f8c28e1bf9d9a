//! Core error types for breathe-core.
//!
//! Engine and configuration errors are surfaced synchronously to the caller.
//! Cue playback errors are only ever logged by the session driver.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for breathe-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Session lifecycle errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors returned when starting a session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// `start` was called while a session is running.
    #[error("a breathing session is already running")]
    AlreadyRunning,

    /// The session configuration was rejected.
    #[error("invalid session configuration: {0}")]
    InvalidConfig(#[from] ValidationError),
}

/// Validation errors for patterns and session configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Pattern without phases
    #[error("pattern must contain at least one phase")]
    EmptyPattern,

    /// Phase with a zero duration
    #[error("phase {index} has a zero duration")]
    ZeroDuration { index: usize },

    /// Finite session without any cycles to run
    #[error("cycle target must be at least 1 unless the session is infinite")]
    ZeroCycleTarget,

    /// Value outside its allowed range
    #[error("{field} must be between {min} and {max} (got {value})")]
    OutOfRange {
        field: String,
        value: u64,
        min: u64,
        max: u64,
    },
}

impl ValidationError {
    pub(crate) fn check_range(field: &str, value: u64, min: u64, max: u64) -> Result<(), Self> {
        if (min..=max).contains(&value) {
            Ok(())
        } else {
            Err(ValidationError::OutOfRange {
                field: field.to_string(),
                value,
                min,
                max,
            })
        }
    }
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

    /// Key not present in the configuration
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Cue playback errors. Never fatal to a session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CueError {
    /// No sound is mapped to this cue name
    #[error("no sound mapped for cue '{0}'")]
    UnknownCue(String),

    /// The playback backend is gone or never came up
    #[error("cue player unavailable: {0}")]
    Unavailable(String),

    /// The sound could not be decoded or played
    #[error("failed to play cue '{cue}': {message}")]
    Playback { cue: String, message: String },
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseFailed(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
