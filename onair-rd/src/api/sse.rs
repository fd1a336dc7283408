//! Server-Sent Events stream
//!
//! Streams `RadioEvent`s to connected browsers. Each connection first
//! receives an `InitialState` snapshot, then the live event feed. The
//! connection holds a presence registration for its lifetime, so the
//! listener count follows SSE connections exactly.

use crate::api::server::AppContext;
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{self, Stream, StreamExt};
use onair_common::clock;
use onair_common::events::RadioEvent;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};

/// GET /events - SSE event stream
pub async fn event_stream(
    State(ctx): State<AppContext>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // Subscribe before snapshotting so nothing falls between the two
    let rx = ctx.bus.subscribe();
    let guard = ctx.presence.register();
    debug!("New SSE client connected");

    let initial = initial_event(&ctx).await;

    let first = stream::iter(encode(&initial).into_iter().map(Ok::<Event, Infallible>));
    let live = BroadcastStream::new(rx).filter_map(|result| async move {
        match result {
            Ok(event) => encode(&event).map(Ok),
            Err(e) => {
                // Lagged subscriber: skip the dropped events and carry on
                warn!("SSE subscriber lagged: {:?}", e);
                None
            }
        }
    });

    // The map closure owns the presence guard; it deregisters when the
    // client disconnects and the stream is dropped.
    let stream = first.chain(live).map(move |item| {
        let _presence = &guard;
        item
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Snapshot the session as the first event of a connection.
///
/// Includes the loaded source and current filler track: sink commands
/// emitted before this client subscribed are gone, so the snapshot is the
/// only way a mid-track joiner learns what to load.
async fn initial_event(ctx: &AppContext) -> RadioEvent {
    let session = ctx.state.session().await;
    let resolved = ctx.state.resolved().await;

    RadioEvent::InitialState {
        mode: session.mode,
        on_air: resolved.on_air,
        offset_seconds: resolved.offset_seconds,
        visible: resolved.visible,
        loaded_url: session.loaded_url,
        current_filler: session.current_filler,
        playing: session.is_playing,
        volume: session.volume,
        muted: session.is_muted,
        listener_count: ctx.presence.count(),
        timestamp: clock::now(),
    }
}

fn encode(event: &RadioEvent) -> Option<Event> {
    match serde_json::to_string(event) {
        Ok(json) => Some(Event::default().event(event.type_str()).data(json)),
        Err(e) => {
            warn!("Failed to serialize event: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::initialize_database;
    use crate::playback::sink::{self, SinkHandle};
    use crate::presence::PresenceCounter;
    use crate::repo::ScheduleRepository;
    use crate::state::SharedState;
    use onair_common::events::{EventBus, PlayMode};
    use onair_common::FillerEntry;
    use sqlx::sqlite::SqlitePoolOptions;
    use std::sync::Arc;
    use uuid::Uuid;

    async fn test_ctx() -> AppContext {
        let pool = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .unwrap();
        initialize_database(&pool).await.unwrap();
        let bus = Arc::new(EventBus::new(16));
        let (sink, _cmd_rx) = SinkHandle::channel();
        let (sink_events, _event_rx) = sink::event_channel();

        AppContext {
            state: Arc::new(SharedState::default()),
            repo: Arc::new(ScheduleRepository::new(pool.clone()).await.unwrap()),
            bus: Arc::clone(&bus),
            sink,
            sink_events,
            presence: Arc::new(PresenceCounter::new(bus)),
            db_pool: pool,
            admin_token: "testtoken".to_string(),
        }
    }

    #[tokio::test]
    async fn test_initial_event_names_filler_source() {
        // A client joining mid-rotation must learn the playing source from
        // the snapshot; the load command predates its subscription.
        let ctx = test_ctx().await;
        let track = FillerEntry {
            id: Uuid::from_u128(10),
            title: "hymn-10".to_string(),
            artist: "Choir".to_string(),
            audio_url: "https://archive.org/hymn-10.mp3".to_string(),
        };

        ctx.state.set_mode(PlayMode::Filler).await;
        ctx.state
            .set_source(Some(track.audio_url.clone()), Some(track.clone()))
            .await;
        ctx.state.set_playing(true).await;

        match initial_event(&ctx).await {
            RadioEvent::InitialState {
                mode,
                loaded_url,
                current_filler,
                playing,
                ..
            } => {
                assert_eq!(mode, PlayMode::Filler);
                assert_eq!(loaded_url.as_deref(), Some("https://archive.org/hymn-10.mp3"));
                assert_eq!(current_filler.unwrap().id, track.id);
                assert!(playing);
            }
            other => panic!("wrong event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_initial_event_idle_carries_no_source() {
        let ctx = test_ctx().await;

        match initial_event(&ctx).await {
            RadioEvent::InitialState {
                mode,
                loaded_url,
                current_filler,
                playing,
                listener_count,
                ..
            } => {
                assert_eq!(mode, PlayMode::Idle);
                assert!(loaded_url.is_none());
                assert!(current_filler.is_none());
                assert!(!playing);
                assert_eq!(listener_count, 0);
            }
            other => panic!("wrong event: {:?}", other),
        }
    }
}
