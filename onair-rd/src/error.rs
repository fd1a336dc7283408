//! Error types for onair-rd
//!
//! Module-specific error types using thiserror for clear error propagation.

use onair_common::clock::format_clock;
use thiserror::Error;

/// Main error type for the onair-rd daemon
#[derive(Error, Debug)]
pub enum Error {
    /// Shared library errors
    #[error(transparent)]
    Common(#[from] onair_common::Error),

    /// Database connection or query errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Two schedule entries overlap; rejected before any write
    #[error("Schedule conflict: \"{first_title}\" overlaps \"{second_title}\" for {}", format_clock(*overlap_seconds))]
    ScheduleConflict {
        first_title: String,
        second_title: String,
        /// Start of the overlap window, epoch seconds
        overlap_start: i64,
        /// Length of the overlap window
        overlap_seconds: u32,
    },

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience Result type using the onair-rd Error
pub type Result<T> = std::result::Result<T, Error>;
