//! # OnAir Common Library
//!
//! Shared code for the OnAir radio daemon including:
//! - Data model (schedule entries, filler tracks)
//! - Event types (RadioEvent enum) and EventBus
//! - Sink command/event wire types
//! - Clock utilities and bulk-ingest time parsing
//! - Bootstrap configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod model;

pub use error::{Error, Result};
pub use model::{FillerEntry, ScheduleEntry};
