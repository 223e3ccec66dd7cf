//! Seatwise Common Library
//!
//! Reservation and table types, display formatters, and the client-side
//! validation rules shared by the CLI and the end-to-end suite.

pub mod config;
pub mod error;
pub mod format;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use types::*;
pub use validation::{CourseForm, StudentForm, ValidationError};

/// Seatwise version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
