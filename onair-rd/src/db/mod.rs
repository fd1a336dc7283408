//! Database access layer
//!
//! SQLite-backed storage for the schedule, the filler pool, and the
//! settings key-value table.

pub mod filler;
pub mod init;
pub mod schedule;
pub mod settings;
