//! Shared playback state
//!
//! Thread-safe mirror of the playback session, written by the mode
//! controller (single writer) and read by the HTTP handlers and the SSE
//! initial-state event. The controller never reads its own decisions back
//! out of here; this exists for observers.

use crate::playback::resolver::ResolvedState;
use onair_common::events::PlayMode;
use onair_common::FillerEntry;
use serde::Serialize;
use tokio::sync::RwLock;

/// Observable playback session state
#[derive(Debug, Clone, Serialize)]
pub struct PlaybackSessionState {
    /// Current playback mode
    pub mode: PlayMode,
    /// URL currently loaded into the sink, if any
    pub loaded_url: Option<String>,
    /// Filler track presently playing; only meaningful in Filler mode
    pub current_filler: Option<FillerEntry>,
    /// Sink is producing audio
    pub is_playing: bool,
    /// Sink stalled waiting for data
    pub is_buffering: bool,
    /// Volume (0.0-1.0)
    pub volume: f32,
    /// Mute flag
    pub is_muted: bool,
}

impl PlaybackSessionState {
    fn initial(volume: f32, muted: bool) -> Self {
        Self {
            mode: PlayMode::Idle,
            loaded_url: None,
            current_filler: None,
            is_playing: false,
            is_buffering: false,
            volume,
            is_muted: muted,
        }
    }
}

/// Shared state accessible by all components
pub struct SharedState {
    session: RwLock<PlaybackSessionState>,
    resolved: RwLock<ResolvedState>,
}

impl SharedState {
    /// Create shared state with restored volume/mute settings
    pub fn new(volume: f32, muted: bool) -> Self {
        Self {
            session: RwLock::new(PlaybackSessionState::initial(volume, muted)),
            resolved: RwLock::new(ResolvedState::default()),
        }
    }

    /// Current session state snapshot
    pub async fn session(&self) -> PlaybackSessionState {
        self.session.read().await.clone()
    }

    /// Latest resolver output
    pub async fn resolved(&self) -> ResolvedState {
        self.resolved.read().await.clone()
    }

    /// Replace the latest resolver output
    pub async fn set_resolved(&self, resolved: ResolvedState) {
        *self.resolved.write().await = resolved;
    }

    /// Set the playback mode
    pub async fn set_mode(&self, mode: PlayMode) {
        self.session.write().await.mode = mode;
    }

    /// Record the loaded source and (for Filler mode) the current track
    pub async fn set_source(&self, loaded_url: Option<String>, current_filler: Option<FillerEntry>) {
        let mut session = self.session.write().await;
        session.loaded_url = loaded_url;
        session.current_filler = current_filler;
    }

    /// Mirror the sink's playing flag
    pub async fn set_playing(&self, playing: bool) {
        self.session.write().await.is_playing = playing;
    }

    /// Mirror the sink's buffering flag
    pub async fn set_buffering(&self, buffering: bool) {
        self.session.write().await.is_buffering = buffering;
    }

    /// Set volume (clamped) and mute together
    pub async fn set_volume(&self, volume: f32, muted: bool) {
        let mut session = self.session.write().await;
        session.volume = volume.clamp(0.0, 1.0);
        session.is_muted = muted;
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new(1.0, false)
    }
}
