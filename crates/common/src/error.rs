//! Error types for Seatwise

use thiserror::Error;

/// Result type alias using Seatwise Error
pub type Result<T> = std::result::Result<T, Error>;

/// Seatwise error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid date: {0} (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("Invalid time: {0} (expected HH:MM)")]
    InvalidTime(String),

    #[error("Unknown {kind} status: {value}")]
    UnknownStatus { kind: &'static str, value: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
