//! Seatwise CLI
//!
//! Host-stand interface for booking reservations and seating them at
//! courses, backed by the reservation REST API.

pub mod client;
pub mod commands;
pub mod output;

pub use client::{ApiClient, ApiError, ApiResult};
pub use commands::{ActionOutcome, FormOutcome, ViewScope};
