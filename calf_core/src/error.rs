//! Error types for the calf_core library.

use crate::types::{Sex, Status};
use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for calf_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Rejected user input (missing identification, bad weight, over-long tag)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Operation referenced an animal id that is not in the store
    #[error("No animal with id '{0}'")]
    NotFound(String),

    /// Status is not in the allowed set for the animal's sex
    #[error("Status '{status}' is not allowed for sex '{sex}'")]
    InvalidStatus { status: Status, sex: Sex },

    /// Unrecognised token or malformed date in user input
    #[error("Parse error: {0}")]
    Parse(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
