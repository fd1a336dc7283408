//! Data model for the OnAir schedule and filler rotation
//!
//! Entries are immutable value types. The repository replaces whole
//! collections on every change; nothing here is mutated in place.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One scheduled program (sermon/show with a fixed start time).
///
/// Occupies the half-open interval `[start_time, start_time + duration_seconds)`
/// in seconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// Stable unique identifier, preserved across repository snapshots
    pub id: Uuid,
    /// Display title (opaque to the core)
    pub title: String,
    /// Display artist/preacher (opaque to the core)
    pub artist: String,
    /// Playable source URL; never parsed by the core
    pub audio_url: String,
    /// Absolute start time, seconds since Unix epoch
    pub start_time: i64,
    /// Program length in seconds
    pub duration_seconds: u32,
}

impl ScheduleEntry {
    /// End of the entry's interval (exclusive), seconds since epoch
    pub fn end_time(&self) -> i64 {
        self.start_time + i64::from(self.duration_seconds)
    }

    /// Whether `now` falls inside the entry's half-open interval.
    ///
    /// A zero-duration entry has an empty interval and never covers any
    /// instant.
    pub fn covers(&self, now: i64) -> bool {
        self.start_time <= now && now < self.end_time()
    }

    /// Whether the entry has fully ended at `now` (no longer visible)
    pub fn has_ended(&self, now: i64) -> bool {
        self.end_time() <= now
    }
}

/// One track in the filler (worship) rotation pool.
///
/// Filler tracks carry no temporal fields; they form an unordered pool the
/// rotation picker draws from when nothing is on-air.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillerEntry {
    /// Stable unique identifier
    pub id: Uuid,
    /// Display title
    pub title: String,
    /// Display artist
    pub artist: String,
    /// Playable source URL
    pub audio_url: String,
}
