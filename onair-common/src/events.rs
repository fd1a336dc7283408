//! Event types for the OnAir event system
//!
//! Provides the shared event definitions and the EventBus used across the
//! daemon.
//!
//! # Architecture
//!
//! OnAir uses hybrid communication:
//! - **EventBus** (tokio::broadcast): one-to-many event broadcasting, also
//!   serialized onto the SSE stream for connected browsers
//! - **Command channels** (tokio::mpsc): controller → sink commands and
//!   sink → controller event reports
//! - **Snapshot channels** (tokio::watch): repository → controller schedule
//!   and filler snapshots

use crate::model::{FillerEntry, ScheduleEntry};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Playback mode of the station
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayMode {
    /// Nothing loaded yet (startup, or filler pool empty with nothing on-air)
    Idle,
    /// A scheduled program is on-air
    Live,
    /// Filler rotation is playing
    Filler,
}

/// Command issued by the mode controller to the audio sink.
///
/// In production the sink is the listener's browser audio element; commands
/// are relayed to it over the SSE stream. Tests drive the same channel with a
/// scripted sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum SinkCommand {
    /// Load a new source. Playback must not start until the sink reports
    /// `MetadataLoaded` for this URL.
    Load { url: String },
    /// Seek to an absolute position in seconds. Only valid after metadata
    /// readiness for the loaded source.
    Seek { seconds: u32 },
    /// Start or resume playback
    Play,
    /// Pause playback
    Pause,
    /// Set volume (0.0-1.0)
    SetVolume { volume: f32 },
    /// Mute or unmute
    SetMuted { muted: bool },
}

/// Event reported by the audio sink back to the mode controller.
///
/// These mirror the media-element event set the controller cares about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SinkEvent {
    /// Enough metadata loaded to allow seeking on the named source
    MetadataLoaded { url: String },
    /// Playback is progressing (clears buffering)
    Playing,
    /// Playback stalled waiting for data
    Waiting,
    /// Playback paused
    Paused,
    /// The loaded source played to its end
    Ended,
}

/// OnAir event types
///
/// Events are broadcast via EventBus and serialized for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RadioEvent {
    /// Playback mode changed (Idle/Live/Filler)
    PlayModeChanged {
        mode: PlayMode,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The on-air program changed (entry present) or ended (None)
    OnAirChanged {
        entry: Option<ScheduleEntry>,
        /// Seconds elapsed since the entry's start; 0 when no entry
        offset_seconds: u32,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A new filler track started in rotation
    FillerStarted {
        entry: FillerEntry,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The visible (not-yet-ended) schedule changed
    ScheduleChanged {
        visible: Vec<ScheduleEntry>,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// An entry was removed from the repository
    EntryDeleted {
        id: Uuid,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Sink command relayed to the browser audio element
    Sink {
        command: SinkCommand,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Playing/buffering flags changed (mirrors of sink events)
    PlaybackStateChanged {
        playing: bool,
        buffering: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Volume or mute changed
    VolumeChanged {
        volume: f32,
        muted: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Listener presence count changed
    ListenerCountChanged {
        count: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Initial state sent once on SSE connection.
    ///
    /// Carries the loaded source so a client connecting mid-track can start
    /// playback without waiting for the next command or rotation event.
    InitialState {
        mode: PlayMode,
        on_air: Option<ScheduleEntry>,
        offset_seconds: u32,
        visible: Vec<ScheduleEntry>,
        /// Source the sink should have loaded right now, if any
        loaded_url: Option<String>,
        /// Filler track behind `loaded_url` when in Filler mode
        current_filler: Option<FillerEntry>,
        playing: bool,
        volume: f32,
        muted: bool,
        listener_count: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl RadioEvent {
    /// Event type string used as the SSE `event:` field
    pub fn type_str(&self) -> &'static str {
        match self {
            RadioEvent::PlayModeChanged { .. } => "PlayModeChanged",
            RadioEvent::OnAirChanged { .. } => "OnAirChanged",
            RadioEvent::FillerStarted { .. } => "FillerStarted",
            RadioEvent::ScheduleChanged { .. } => "ScheduleChanged",
            RadioEvent::EntryDeleted { .. } => "EntryDeleted",
            RadioEvent::Sink { .. } => "Sink",
            RadioEvent::PlaybackStateChanged { .. } => "PlaybackStateChanged",
            RadioEvent::VolumeChanged { .. } => "VolumeChanged",
            RadioEvent::ListenerCountChanged { .. } => "ListenerCountChanged",
            RadioEvent::InitialState { .. } => "InitialState",
        }
    }
}

/// One-to-many event broadcaster backed by `tokio::sync::broadcast`.
///
/// Slow subscribers may lag and drop old events; emitters never block.
pub struct EventBus {
    tx: broadcast::Sender<RadioEvent>,
    capacity: usize,
}

impl EventBus {
    /// Create a new EventBus with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events.
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<RadioEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers.
    ///
    /// Returns the subscriber count, or an error when nobody is listening.
    pub fn emit(&self, event: RadioEvent) -> Result<usize, broadcast::error::SendError<RadioEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring the no-subscribers case.
    ///
    /// Use for periodic or best-effort events where an empty audience is
    /// normal (e.g. nobody connected to the SSE stream yet).
    pub fn emit_lossy(&self, event: RadioEvent) {
        let _ = self.tx.send(event);
    }

    /// Number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
