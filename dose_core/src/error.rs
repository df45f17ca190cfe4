//! Error types for the dose_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for dose_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Filter pattern failed to compile
    #[error("Invalid filter pattern: {0}")]
    InvalidFilter(#[from] regex::Error),

    /// Configuration or option validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Timezone name could not be resolved
    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),

    /// No record carries the requested position
    #[error("No dose found at position {0}")]
    PositionNotFound(i64),

    /// An operation needed at least one record
    #[error("There are no doses to {0}")]
    EmptyLog(&'static str),

    /// A required field was not provided
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Date/time input did not match any accepted layout
    #[error("Failed to parse time: {0}")]
    TimeParse(String),

    /// Remote store request failed
    #[error("HTTP error: {0}")]
    Http(String),

    /// The primary file was written but a secondary rendering was not
    #[error("Saved {} but failed to save the text rendering: {reason}", saved.join(", "))]
    PartialSave { saved: Vec<String>, reason: String },

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Error::Http(format!("request timed out: {}", e))
        } else if e.is_connect() {
            Error::Http(format!("failed to connect: {}", e))
        } else {
            Error::Http(e.to_string())
        }
    }
}
