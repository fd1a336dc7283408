//! Audio sink seam
//!
//! The mode controller owns exactly one sink; nothing else issues commands
//! to it. The sink itself is the listener's browser audio element, reached
//! through channels: commands flow out over an mpsc and are relayed to the
//! browser as SSE events; the browser reports element events back through
//! the `/player/event` endpoint into the controller's event channel.
//!
//! Tests attach a scripted sink to the same channels.

use onair_common::events::{EventBus, RadioEvent, SinkCommand, SinkEvent};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Sending half of the sink command channel.
///
/// Cheap to clone; command failures (receiver gone) are logged and swallowed
/// so a sink outage never crashes the controller loop — the next tick
/// retries naturally.
#[derive(Clone)]
pub struct SinkHandle {
    cmd_tx: mpsc::UnboundedSender<SinkCommand>,
}

impl SinkHandle {
    /// Create a sink command channel
    pub fn channel() -> (SinkHandle, mpsc::UnboundedReceiver<SinkCommand>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        (SinkHandle { cmd_tx }, cmd_rx)
    }

    fn send(&self, command: SinkCommand) {
        debug!("Sink command: {:?}", command);
        if self.cmd_tx.send(command).is_err() {
            warn!("Sink command channel closed; command dropped");
        }
    }

    /// Load a new source. The sink must answer with
    /// `SinkEvent::MetadataLoaded` before any seek is valid.
    pub fn load(&self, url: &str) {
        self.send(SinkCommand::Load {
            url: url.to_string(),
        });
    }

    /// Seek to an absolute position (seconds). Only issued after metadata
    /// readiness for the loaded source.
    pub fn seek(&self, seconds: u32) {
        self.send(SinkCommand::Seek { seconds });
    }

    /// Start or resume playback
    pub fn play(&self) {
        self.send(SinkCommand::Play);
    }

    /// Pause playback
    pub fn pause(&self) {
        self.send(SinkCommand::Pause);
    }

    /// Set volume (0.0-1.0)
    pub fn set_volume(&self, volume: f32) {
        self.send(SinkCommand::SetVolume {
            volume: volume.clamp(0.0, 1.0),
        });
    }

    /// Mute or unmute
    pub fn set_muted(&self, muted: bool) {
        self.send(SinkCommand::SetMuted { muted });
    }
}

/// Forward sink commands onto the event bus as `RadioEvent::Sink` so the
/// connected browser executes them on its audio element.
///
/// Runs until the command channel closes. Emission is lossy: with no browser
/// connected there is nobody to play audio anyway, and the controller's
/// state is re-sent on the next SSE connection as `InitialState`.
pub async fn run_web_bridge(mut cmd_rx: mpsc::UnboundedReceiver<SinkCommand>, bus: Arc<EventBus>) {
    while let Some(command) = cmd_rx.recv().await {
        bus.emit_lossy(RadioEvent::Sink {
            command,
            timestamp: chrono::Utc::now(),
        });
    }
    debug!("Sink web bridge stopped");
}

/// Sending half of the sink event channel (browser reports → controller)
pub type SinkEventSender = mpsc::UnboundedSender<SinkEvent>;

/// Create the sink event channel
pub fn event_channel() -> (SinkEventSender, mpsc::UnboundedReceiver<SinkEvent>) {
    mpsc::unbounded_channel()
}
