//! Playback mode controller
//!
//! The state machine at the center of playback continuity. Three external
//! event sources drive it, serialized through one `select!` loop so
//! `PlaybackSessionState` has a single writer:
//!
//! 1. a one-second tick, re-running the resolver against the wall clock
//! 2. repository snapshot pushes (schedule and filler pool)
//! 3. sink event reports (metadata-ready, playing, waiting, paused, ended)
//!
//! Transition rules:
//! - `* -> Live` when the resolver finds an on-air entry whose source is not
//!   the loaded one: load it, and only after the sink reports metadata
//!   readiness, seek to the wall-clock offset and play. Readiness reports
//!   for sources no longer wanted are discarded.
//! - `Live -> Filler` when the resolver reports off-air: pick a filler
//!   track and play it from the top.
//! - Within Filler, a sink `Ended` report immediately picks the next track;
//!   rotation is continuous. In Live mode `Ended` just stops playback and
//!   the next tick decides what follows.
//!
//! A subscription failure leaves the controller running on its last-known
//! snapshot; it is never treated as an empty schedule.

use crate::playback::resolver::{resolve, ResolvedState};
use crate::playback::rotation;
use crate::playback::sink::SinkHandle;
use crate::repo::{FillerSnapshot, ScheduleSnapshot};
use crate::state::SharedState;
use onair_common::clock;
use onair_common::events::{EventBus, PlayMode, RadioEvent, SinkEvent};
use onair_common::FillerEntry;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, Duration};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A load request awaiting the sink's metadata readiness.
///
/// `seek_to` carries the live offset for scheduled programs; filler tracks
/// start from the top.
#[derive(Debug, Clone, PartialEq)]
struct PendingLoad {
    url: String,
    seek_to: Option<u32>,
}

/// Mode controller: owns the sink, drives all transitions
pub struct ModeController {
    state: Arc<SharedState>,
    bus: Arc<EventBus>,
    sink: SinkHandle,

    schedule_rx: watch::Receiver<ScheduleSnapshot>,
    filler_rx: watch::Receiver<FillerSnapshot>,
    sink_events: mpsc::UnboundedReceiver<SinkEvent>,

    /// Last-known snapshots; retained across subscription hiccups
    schedule: ScheduleSnapshot,
    filler: FillerSnapshot,
    schedule_subscribed: bool,
    filler_subscribed: bool,

    mode: PlayMode,
    /// Source most recently requested from the sink
    loaded_url: Option<String>,
    current_filler: Option<FillerEntry>,
    pending_load: Option<PendingLoad>,
    last_on_air: Option<Uuid>,
}

impl ModeController {
    /// Create a controller wired to the repository and sink channels
    pub fn new(
        state: Arc<SharedState>,
        bus: Arc<EventBus>,
        sink: SinkHandle,
        mut schedule_rx: watch::Receiver<ScheduleSnapshot>,
        mut filler_rx: watch::Receiver<FillerSnapshot>,
        sink_events: mpsc::UnboundedReceiver<SinkEvent>,
    ) -> Self {
        let schedule = schedule_rx.borrow_and_update().clone();
        let filler = filler_rx.borrow_and_update().clone();

        Self {
            state,
            bus,
            sink,
            schedule_rx,
            filler_rx,
            sink_events,
            schedule,
            filler,
            schedule_subscribed: true,
            filler_subscribed: true,
            mode: PlayMode::Idle,
            loaded_url: None,
            current_filler: None,
            pending_load: None,
            last_on_air: None,
        }
    }

    /// Run the controller loop until the process shuts down.
    ///
    /// One event is processed at a time, in arrival order; a tick fully
    /// resolves the schedule before any transition decision is made.
    pub async fn run(mut self) {
        info!("Mode controller started");
        let mut tick = interval(Duration::from_secs(1));

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    self.handle_tick(clock::now_seconds()).await;
                }

                changed = self.schedule_rx.changed(), if self.schedule_subscribed => {
                    match changed {
                        Ok(()) => {
                            let snapshot = self.schedule_rx.borrow_and_update().clone();
                            self.handle_schedule_update(snapshot, clock::now_seconds()).await;
                        }
                        Err(_) => {
                            warn!("Schedule subscription ended; continuing on last snapshot");
                            self.schedule_subscribed = false;
                        }
                    }
                }

                changed = self.filler_rx.changed(), if self.filler_subscribed => {
                    match changed {
                        Ok(()) => {
                            let snapshot = self.filler_rx.borrow_and_update().clone();
                            self.handle_filler_update(snapshot).await;
                        }
                        Err(_) => {
                            warn!("Filler subscription ended; continuing on last snapshot");
                            self.filler_subscribed = false;
                        }
                    }
                }

                event = self.sink_events.recv() => {
                    match event {
                        Some(event) => self.handle_sink_event(event).await,
                        None => {
                            warn!("Sink event channel closed");
                            break;
                        }
                    }
                }
            }
        }
        info!("Mode controller stopped");
    }

    /// One resolver tick: resolve at `now`, publish the result, and apply
    /// any mode transition it implies.
    pub async fn handle_tick(&mut self, now: i64) {
        let resolved = resolve(now, &self.schedule);
        self.publish_resolved(&resolved).await;
        self.apply(resolved).await;
    }

    /// Repository pushed a new schedule snapshot: replace wholesale and
    /// re-resolve at `now` immediately rather than waiting out the tick.
    pub async fn handle_schedule_update(&mut self, snapshot: ScheduleSnapshot, now: i64) {
        debug!("Schedule snapshot replaced: {} entries", snapshot.len());
        self.schedule = snapshot;

        let resolved = resolve(now, &self.schedule);
        self.bus.emit_lossy(RadioEvent::ScheduleChanged {
            visible: resolved.visible.clone(),
            timestamp: clock::now(),
        });
        self.publish_resolved(&resolved).await;
        self.apply(resolved).await;
    }

    /// Repository pushed a new filler snapshot. The running track keeps
    /// playing even if it left the pool; an empty-pool Filler mode retries
    /// selection on the next tick.
    pub async fn handle_filler_update(&mut self, snapshot: FillerSnapshot) {
        debug!("Filler snapshot replaced: {} tracks", snapshot.len());
        self.filler = snapshot;
    }

    /// Process one sink event report
    pub async fn handle_sink_event(&mut self, event: SinkEvent) {
        match event {
            SinkEvent::MetadataLoaded { url } => self.on_metadata_loaded(url).await,
            SinkEvent::Playing => {
                self.state.set_playing(true).await;
                self.state.set_buffering(false).await;
                self.emit_playback_state(true, false);
            }
            SinkEvent::Waiting => {
                self.state.set_buffering(true).await;
                let playing = self.state.session().await.is_playing;
                self.emit_playback_state(playing, true);
            }
            SinkEvent::Paused => {
                self.state.set_playing(false).await;
                self.emit_playback_state(false, false);
            }
            SinkEvent::Ended => self.on_ended().await,
        }
    }

    /// Apply resolver output to the state machine
    async fn apply(&mut self, resolved: ResolvedState) {
        match resolved.on_air {
            Some(entry) => {
                // Already playing this source: stay put. In particular, do
                // not reseek on every tick, and do not reseek after a user
                // pause/resume.
                if self.loaded_url.as_deref() == Some(entry.audio_url.as_str()) {
                    return;
                }
                self.enter_live(entry.audio_url.clone(), resolved.offset_seconds, &entry)
                    .await;
            }
            None => {
                match self.mode {
                    PlayMode::Live | PlayMode::Idle => self.enter_filler().await,
                    PlayMode::Filler => {
                        // Idle-in-filler (empty pool earlier): retry the pick
                        if self.current_filler.is_none() && self.pending_load.is_none() {
                            self.start_filler_track().await;
                        }
                    }
                }
            }
        }
    }

    /// Enter Live for an on-air entry: load, then seek-and-play once the
    /// sink reports metadata readiness for this source.
    async fn enter_live(&mut self, url: String, offset_seconds: u32, entry: &onair_common::ScheduleEntry) {
        info!(
            "Going live: '{}' at offset {}s",
            entry.title, offset_seconds
        );

        self.set_mode(PlayMode::Live).await;
        self.current_filler = None;
        self.pending_load = Some(PendingLoad {
            url: url.clone(),
            seek_to: Some(offset_seconds),
        });
        self.loaded_url = Some(url.clone());
        self.state.set_source(Some(url.clone()), None).await;
        self.sink.load(&url);
    }

    /// Enter Filler mode and start a track if none is playing
    async fn enter_filler(&mut self) {
        self.set_mode(PlayMode::Filler).await;
        // A load still pending from Live is stale once the program is off-air
        self.pending_load = None;
        if self.current_filler.is_none() {
            self.start_filler_track().await;
        }
    }

    /// Pick and load the next filler track from offset 0.
    ///
    /// With an empty pool this is a no-op; the controller stays idle in
    /// Filler mode and the next tick or end event retries.
    async fn start_filler_track(&mut self) {
        let Some(track) = rotation::pick(&self.filler).cloned() else {
            debug!("Filler pool empty; staying idle");
            self.loaded_url = None;
            self.current_filler = None;
            self.state.set_source(None, None).await;
            return;
        };

        info!("Filler rotation: '{}'", track.title);
        self.pending_load = Some(PendingLoad {
            url: track.audio_url.clone(),
            seek_to: None,
        });
        self.loaded_url = Some(track.audio_url.clone());
        self.current_filler = Some(track.clone());
        self.state
            .set_source(Some(track.audio_url.clone()), Some(track.clone()))
            .await;
        self.bus.emit_lossy(RadioEvent::FillerStarted {
            entry: track,
            timestamp: clock::now(),
        });
    }

    /// Metadata readiness from the sink. Seeking is gated on this signal;
    /// a report for a source we no longer want is stale and discarded.
    async fn on_metadata_loaded(&mut self, url: String) {
        match self.pending_load.take() {
            Some(pending) if pending.url == url => {
                if let Some(offset) = pending.seek_to {
                    self.sink.seek(offset);
                }
                self.sink.play();
            }
            Some(pending) => {
                debug!(
                    "Discarding stale metadata readiness for '{}' (waiting on '{}')",
                    url, pending.url
                );
                self.pending_load = Some(pending);
            }
            None => {
                debug!("Ignoring metadata readiness for '{}' with no pending load", url);
            }
        }
    }

    /// Track-end from the sink. Filler rotates immediately; Live stops and
    /// leaves the next move to the resolver tick.
    async fn on_ended(&mut self) {
        self.state.set_playing(false).await;
        match self.mode {
            PlayMode::Filler => {
                debug!("Filler track ended; rotating");
                self.current_filler = None;
                self.loaded_url = None;
                self.start_filler_track().await;
            }
            PlayMode::Live => {
                debug!("Live program audio ended; awaiting next tick");
                self.emit_playback_state(false, false);
            }
            PlayMode::Idle => {}
        }
    }

    /// Record a mode change and announce it; no-op when unchanged
    async fn set_mode(&mut self, mode: PlayMode) {
        if self.mode != mode {
            info!("Play mode: {:?} -> {:?}", self.mode, mode);
            self.mode = mode;
            self.state.set_mode(mode).await;
            self.bus.emit_lossy(RadioEvent::PlayModeChanged {
                mode,
                timestamp: clock::now(),
            });
        }
    }

    async fn publish_resolved(&mut self, resolved: &ResolvedState) {
        let on_air_id = resolved.on_air.as_ref().map(|e| e.id);
        if on_air_id != self.last_on_air {
            self.last_on_air = on_air_id;
            self.bus.emit_lossy(RadioEvent::OnAirChanged {
                entry: resolved.on_air.clone(),
                offset_seconds: resolved.offset_seconds,
                timestamp: clock::now(),
            });
        }
        self.state.set_resolved(resolved.clone()).await;
    }

    fn emit_playback_state(&self, playing: bool, buffering: bool) {
        self.bus.emit_lossy(RadioEvent::PlaybackStateChanged {
            playing,
            buffering,
            timestamp: clock::now(),
        });
    }
}
