//! HTTP request handlers
//!
//! Listener surface plus the admin write contract. Admin writes go through
//! the repository, which republishes snapshots; playback controls go
//! straight to the sink and never touch the schedule.

use crate::api::auth::RequireAdmin;
use crate::api::server::AppContext;
use crate::db;
use crate::error::Error;
use crate::playback::resolver::resolve;
use crate::repo::{NewEntry, NewFiller};
use crate::state::PlaybackSessionState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use onair_common::clock;
use onair_common::events::{RadioEvent, SinkEvent};
use onair_common::{FillerEntry, ScheduleEntry};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    status: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    conflict: Option<ConflictInfo>,
}

/// Overlap details for a rejected schedule write
#[derive(Debug, Serialize)]
pub struct ConflictInfo {
    first_title: String,
    second_title: String,
    overlap_start: i64,
    overlap_seconds: u32,
}

#[derive(Debug, Serialize)]
pub struct StateResponse {
    session: PlaybackSessionState,
    on_air: Option<ScheduleEntry>,
    offset_seconds: u32,
    next: Option<ScheduleEntry>,
    listener_count: usize,
}

#[derive(Debug, Serialize)]
pub struct ScheduleResponse {
    entries: Vec<ScheduleEntry>,
}

#[derive(Debug, Serialize)]
pub struct FillerResponse {
    entries: Vec<FillerEntry>,
}

#[derive(Debug, Deserialize)]
pub struct CreateEntryRequest {
    title: String,
    artist: String,
    audio_url: String,
    /// Start time, seconds since the Unix epoch
    start_time: i64,
    /// Duration in seconds; takes precedence over `duration_minutes`
    duration_seconds: Option<u32>,
    /// Duration in whole minutes (the admin form's unit)
    duration_minutes: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct BulkCreateRequest {
    entries: Vec<BulkEntry>,
}

/// One row of the bulk-ingest mini-format
#[derive(Debug, Deserialize)]
pub struct BulkEntry {
    title: String,
    artist: String,
    audio_url: String,
    /// `DD/MM/YYYY | HH:MM AM` (or `PM`), interpreted as UTC
    start_time: String,
    /// `HH:MM:SS` or `MM:SS`
    duration: String,
}

#[derive(Debug, Serialize)]
pub struct BulkCreateResponse {
    created: Vec<ScheduleEntry>,
}

#[derive(Debug, Deserialize)]
pub struct CreateFillerRequest {
    title: String,
    artist: String,
    audio_url: String,
}

#[derive(Debug, Deserialize)]
pub struct VolumeRequest {
    /// Volume on the sink's 0.0-1.0 scale
    volume: f32,
}

#[derive(Debug, Deserialize)]
pub struct MuteRequest {
    muted: bool,
}

#[derive(Debug, Serialize)]
pub struct ListenersResponse {
    count: usize,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Map a daemon error onto an HTTP status and response body
fn error_response(err: Error) -> ApiError {
    let status = match &err {
        Error::ScheduleConflict { .. } => StatusCode::CONFLICT,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::BadRequest(_) => StatusCode::BAD_REQUEST,
        Error::Common(onair_common::Error::TimeParse(_)) => StatusCode::BAD_REQUEST,
        _ => {
            error!("Request failed: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let conflict = match &err {
        Error::ScheduleConflict {
            first_title,
            second_title,
            overlap_start,
            overlap_seconds,
        } => Some(ConflictInfo {
            first_title: first_title.clone(),
            second_title: second_title.clone(),
            overlap_start: *overlap_start,
            overlap_seconds: *overlap_seconds,
        }),
        _ => None,
    };

    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            conflict,
        }),
    )
}

fn ok() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok".to_string(),
    })
}

// ============================================================================
// Health and Read Surface
// ============================================================================

/// GET /health - Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "onair-rd".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /state - Session state plus the latest resolver output
pub async fn get_state(State(ctx): State<AppContext>) -> Json<StateResponse> {
    let session = ctx.state.session().await;
    let resolved = ctx.state.resolved().await;

    Json(StateResponse {
        session,
        on_air: resolved.on_air,
        offset_seconds: resolved.offset_seconds,
        next: resolved.next,
        listener_count: ctx.presence.count(),
    })
}

/// GET /schedule - Visible schedule (entries whose end is still in the
/// future), start-time ascending
pub async fn get_schedule(State(ctx): State<AppContext>) -> Json<ScheduleResponse> {
    let snapshot = ctx.repo.schedule();
    let resolved = resolve(clock::now_seconds(), &snapshot);

    Json(ScheduleResponse {
        entries: resolved.visible,
    })
}

/// GET /listeners - Current listener count
pub async fn get_listeners(State(ctx): State<AppContext>) -> Json<ListenersResponse> {
    Json(ListenersResponse {
        count: ctx.presence.count(),
    })
}

// ============================================================================
// Schedule Management (admin)
// ============================================================================

/// POST /schedule - Create one entry
pub async fn create_entry(
    _admin: RequireAdmin,
    State(ctx): State<AppContext>,
    Json(req): Json<CreateEntryRequest>,
) -> Result<Json<ScheduleEntry>, ApiError> {
    let duration_seconds = req
        .duration_seconds
        .or(req.duration_minutes.map(|m| m * 60))
        .ok_or_else(|| {
            error_response(Error::BadRequest(
                "either duration_seconds or duration_minutes is required".to_string(),
            ))
        })?;

    let entry = ctx
        .repo
        .create_entry(NewEntry {
            title: req.title,
            artist: req.artist,
            audio_url: req.audio_url,
            start_time: req.start_time,
            duration_seconds,
        })
        .await
        .map_err(error_response)?;

    Ok(Json(entry))
}

/// POST /schedule/bulk - Batch create with pre-commit conflict validation.
///
/// Start times and durations arrive in the bulk-ingest string formats; the
/// whole batch is rejected if any parse fails or any two intervals overlap
/// (including overlap with existing entries).
pub async fn create_bulk(
    _admin: RequireAdmin,
    State(ctx): State<AppContext>,
    Json(req): Json<BulkCreateRequest>,
) -> Result<Json<BulkCreateResponse>, ApiError> {
    let mut batch = Vec::with_capacity(req.entries.len());
    for row in req.entries {
        let start_time = clock::parse_start_time(&row.start_time)
            .map_err(|e| error_response(Error::BadRequest(format!("'{}': {}", row.title, e))))?;
        let duration_seconds = clock::parse_duration(&row.duration)
            .map_err(|e| error_response(Error::BadRequest(format!("'{}': {}", row.title, e))))?;

        batch.push(NewEntry {
            title: row.title,
            artist: row.artist,
            audio_url: row.audio_url,
            start_time,
            duration_seconds,
        });
    }

    let created = ctx.repo.create_batch(batch).await.map_err(error_response)?;
    info!("Bulk ingest accepted {} entries", created.len());

    Ok(Json(BulkCreateResponse { created }))
}

/// DELETE /schedule/:id - Delete one entry
pub async fn delete_entry(
    _admin: RequireAdmin,
    State(ctx): State<AppContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<StatusResponse>, ApiError> {
    let removed = ctx.repo.delete_entry(id).await.map_err(error_response)?;
    if !removed {
        return Err(error_response(Error::NotFound(format!(
            "schedule entry {}",
            id
        ))));
    }

    ctx.bus.emit_lossy(RadioEvent::EntryDeleted {
        id,
        timestamp: clock::now(),
    });
    Ok(ok())
}

// ============================================================================
// Filler Pool Management (admin)
// ============================================================================

/// GET /filler - Full filler pool
pub async fn get_filler(
    _admin: RequireAdmin,
    State(ctx): State<AppContext>,
) -> Json<FillerResponse> {
    Json(FillerResponse {
        entries: ctx.repo.filler().to_vec(),
    })
}

/// POST /filler - Add a track to the rotation pool
pub async fn create_filler(
    _admin: RequireAdmin,
    State(ctx): State<AppContext>,
    Json(req): Json<CreateFillerRequest>,
) -> Result<Json<FillerEntry>, ApiError> {
    let entry = ctx
        .repo
        .create_filler(NewFiller {
            title: req.title,
            artist: req.artist,
            audio_url: req.audio_url,
        })
        .await
        .map_err(error_response)?;

    Ok(Json(entry))
}

/// DELETE /filler/:id - Remove a track from the pool.
///
/// A track currently playing finishes; it just stops being picked.
pub async fn delete_filler(
    _admin: RequireAdmin,
    State(ctx): State<AppContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<StatusResponse>, ApiError> {
    let removed = ctx.repo.delete_filler(id).await.map_err(error_response)?;
    if !removed {
        return Err(error_response(Error::NotFound(format!(
            "filler track {}",
            id
        ))));
    }
    Ok(ok())
}

// ============================================================================
// Playback Controls (listener)
// ============================================================================

/// POST /playback/play - Resume the sink; the mode is untouched
pub async fn play(State(ctx): State<AppContext>) -> Json<StatusResponse> {
    ctx.sink.play();
    ok()
}

/// POST /playback/pause - Pause the sink; the mode is untouched
pub async fn pause(State(ctx): State<AppContext>) -> Json<StatusResponse> {
    ctx.sink.pause();
    ok()
}

/// POST /playback/volume - Set volume, persist it, and announce the change
pub async fn set_volume(
    State(ctx): State<AppContext>,
    Json(req): Json<VolumeRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    let volume = req.volume.clamp(0.0, 1.0);

    ctx.sink.set_volume(volume);
    db::settings::set_volume(&ctx.db_pool, volume)
        .await
        .map_err(error_response)?;

    let muted = ctx.state.session().await.is_muted;
    ctx.state.set_volume(volume, muted).await;
    ctx.bus.emit_lossy(RadioEvent::VolumeChanged {
        volume,
        muted,
        timestamp: clock::now(),
    });

    Ok(ok())
}

/// POST /playback/mute - Set the mute flag, persist it, and announce
pub async fn set_muted(
    State(ctx): State<AppContext>,
    Json(req): Json<MuteRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    ctx.sink.set_muted(req.muted);
    db::settings::set_muted(&ctx.db_pool, req.muted)
        .await
        .map_err(error_response)?;

    let volume = ctx.state.session().await.volume;
    ctx.state.set_volume(volume, req.muted).await;
    ctx.bus.emit_lossy(RadioEvent::VolumeChanged {
        volume,
        muted: req.muted,
        timestamp: clock::now(),
    });

    Ok(ok())
}

// ============================================================================
// Sink Event Reports
// ============================================================================

/// POST /player/event - Browser audio element event report, forwarded into
/// the controller's sink event channel
pub async fn sink_event_report(
    State(ctx): State<AppContext>,
    Json(event): Json<SinkEvent>,
) -> Result<Json<StatusResponse>, ApiError> {
    ctx.sink_events.send(event).map_err(|_| {
        error_response(Error::Internal(
            "playback controller unavailable".to_string(),
        ))
    })?;
    Ok(ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::initialize_database;
    use crate::playback::sink::{self, SinkHandle};
    use crate::presence::PresenceCounter;
    use crate::repo::ScheduleRepository;
    use crate::state::SharedState;
    use onair_common::events::{EventBus, SinkCommand};
    use sqlx::sqlite::SqlitePoolOptions;
    use std::sync::Arc;
    use tokio::sync::mpsc::UnboundedReceiver;

    struct TestApi {
        ctx: AppContext,
        cmd_rx: UnboundedReceiver<SinkCommand>,
        event_rx: UnboundedReceiver<SinkEvent>,
    }

    async fn test_api() -> TestApi {
        let pool = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .unwrap();
        initialize_database(&pool).await.unwrap();
        let bus = Arc::new(EventBus::new(64));
        let (sink, cmd_rx) = SinkHandle::channel();
        let (sink_events, event_rx) = sink::event_channel();

        let ctx = AppContext {
            state: Arc::new(SharedState::default()),
            repo: Arc::new(ScheduleRepository::new(pool.clone()).await.unwrap()),
            bus: Arc::clone(&bus),
            sink,
            sink_events,
            presence: Arc::new(PresenceCounter::new(bus)),
            db_pool: pool,
            admin_token: "testtoken".to_string(),
        };

        TestApi {
            ctx,
            cmd_rx,
            event_rx,
        }
    }

    fn entry_request(title: &str, start_time: i64, duration_seconds: u32) -> CreateEntryRequest {
        CreateEntryRequest {
            title: title.to_string(),
            artist: "Preacher".to_string(),
            audio_url: format!("https://archive.org/{}.mp3", title),
            start_time,
            duration_seconds: Some(duration_seconds),
            duration_minutes: None,
        }
    }

    fn bulk_entry(title: &str, start_time: &str, duration: &str) -> BulkEntry {
        BulkEntry {
            title: title.to_string(),
            artist: "Preacher".to_string(),
            audio_url: format!("https://archive.org/{}.mp3", title),
            start_time: start_time.to_string(),
            duration: duration.to_string(),
        }
    }

    #[tokio::test]
    async fn test_health() {
        let response = health().await;
        assert_eq!(response.status, "healthy");
        assert_eq!(response.module, "onair-rd");
    }

    #[tokio::test]
    async fn test_create_and_list_schedule() {
        let api = test_api().await;
        let future = clock::now_seconds() + 3600;

        let created = create_entry(
            RequireAdmin,
            State(api.ctx.clone()),
            Json(entry_request("sermon", future, 1800)),
        )
        .await
        .unwrap();
        assert_eq!(created.title, "sermon");

        let listed = get_schedule(State(api.ctx)).await;
        assert_eq!(listed.entries.len(), 1);
        assert_eq!(listed.entries[0].id, created.id);
    }

    #[tokio::test]
    async fn test_create_entry_accepts_minutes() {
        let api = test_api().await;

        let created = create_entry(
            RequireAdmin,
            State(api.ctx),
            Json(CreateEntryRequest {
                title: "short".to_string(),
                artist: "Preacher".to_string(),
                audio_url: "https://archive.org/short.mp3".to_string(),
                start_time: 1000,
                duration_seconds: None,
                duration_minutes: Some(30),
            }),
        )
        .await
        .unwrap();
        assert_eq!(created.duration_seconds, 1800);
    }

    #[tokio::test]
    async fn test_create_entry_requires_a_duration() {
        let api = test_api().await;

        let (status, _) = create_entry(
            RequireAdmin,
            State(api.ctx),
            Json(CreateEntryRequest {
                title: "no-duration".to_string(),
                artist: String::new(),
                audio_url: String::new(),
                start_time: 1000,
                duration_seconds: None,
                duration_minutes: None,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_bulk_ingest_parses_clock_formats() {
        let api = test_api().await;

        let response = create_bulk(
            RequireAdmin,
            State(api.ctx),
            Json(BulkCreateRequest {
                entries: vec![
                    bulk_entry("morning", "02/01/1970 | 12:00 PM", "01:00:00"),
                    bulk_entry("evening", "02/01/1970 | 2:00 PM", "45:00"),
                ],
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.created.len(), 2);
        assert_eq!(response.created[0].start_time, 129_600);
        assert_eq!(response.created[0].duration_seconds, 3600);
        assert_eq!(response.created[1].duration_seconds, 2700);
    }

    #[tokio::test]
    async fn test_bulk_conflict_rejected_with_409() {
        let api = test_api().await;

        // Second starts 30 minutes into the first's hour
        let result = create_bulk(
            RequireAdmin,
            State(api.ctx.clone()),
            Json(BulkCreateRequest {
                entries: vec![
                    bulk_entry("first", "02/01/1970 | 12:00 PM", "01:00:00"),
                    bulk_entry("second", "02/01/1970 | 12:30 PM", "01:00:00"),
                ],
            }),
        )
        .await;

        let (status, Json(body)) = result.unwrap_err();
        assert_eq!(status, StatusCode::CONFLICT);
        let conflict = body.conflict.expect("conflict details");
        assert_eq!(conflict.first_title, "first");
        assert_eq!(conflict.second_title, "second");
        assert_eq!(conflict.overlap_seconds, 1800);

        // All-or-nothing: nothing was written
        assert!(api.ctx.repo.schedule().is_empty());
    }

    #[tokio::test]
    async fn test_bulk_bad_time_format_rejected() {
        let api = test_api().await;

        let (status, _) = create_bulk(
            RequireAdmin,
            State(api.ctx.clone()),
            Json(BulkCreateRequest {
                entries: vec![bulk_entry("bad", "1970-01-02 12:00", "01:00:00")],
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(api.ctx.repo.schedule().is_empty());
    }

    #[tokio::test]
    async fn test_delete_entry_missing_is_404() {
        let api = test_api().await;

        let (status, _) = delete_entry(RequireAdmin, State(api.ctx), Path(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_filler_create_and_delete() {
        let api = test_api().await;

        let track = create_filler(
            RequireAdmin,
            State(api.ctx.clone()),
            Json(CreateFillerRequest {
                title: "Hymn".to_string(),
                artist: "Choir".to_string(),
                audio_url: "https://archive.org/hymn.mp3".to_string(),
            }),
        )
        .await
        .unwrap();

        let listed = get_filler(RequireAdmin, State(api.ctx.clone())).await;
        assert_eq!(listed.entries.len(), 1);

        delete_filler(RequireAdmin, State(api.ctx.clone()), Path(track.id))
            .await
            .unwrap();
        assert!(api.ctx.repo.filler().is_empty());
    }

    #[tokio::test]
    async fn test_playback_controls_reach_the_sink() {
        let mut api = test_api().await;

        play(State(api.ctx.clone())).await;
        pause(State(api.ctx.clone())).await;

        assert_eq!(api.cmd_rx.try_recv().unwrap(), SinkCommand::Play);
        assert_eq!(api.cmd_rx.try_recv().unwrap(), SinkCommand::Pause);
    }

    #[tokio::test]
    async fn test_volume_persists_and_announces() {
        let mut api = test_api().await;
        let mut events = api.ctx.bus.subscribe();

        set_volume(State(api.ctx.clone()), Json(VolumeRequest { volume: 0.5 }))
            .await
            .unwrap();

        assert_eq!(
            api.cmd_rx.try_recv().unwrap(),
            SinkCommand::SetVolume { volume: 0.5 }
        );
        assert_eq!(
            db::settings::get_volume(&api.ctx.db_pool).await.unwrap(),
            0.5
        );
        assert_eq!(api.ctx.state.session().await.volume, 0.5);
        match events.recv().await.unwrap() {
            RadioEvent::VolumeChanged { volume, muted, .. } => {
                assert_eq!(volume, 0.5);
                assert!(!muted);
            }
            other => panic!("wrong event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_mute_keeps_volume() {
        let api = test_api().await;

        set_volume(State(api.ctx.clone()), Json(VolumeRequest { volume: 0.7 }))
            .await
            .unwrap();
        set_muted(State(api.ctx.clone()), Json(MuteRequest { muted: true }))
            .await
            .unwrap();

        let session = api.ctx.state.session().await;
        assert_eq!(session.volume, 0.7);
        assert!(session.is_muted);
        assert!(db::settings::get_muted(&api.ctx.db_pool).await.unwrap());
    }

    #[tokio::test]
    async fn test_sink_event_report_forwards() {
        let mut api = test_api().await;

        sink_event_report(State(api.ctx.clone()), Json(SinkEvent::Ended))
            .await
            .unwrap();

        assert_eq!(api.event_rx.try_recv().unwrap(), SinkEvent::Ended);
    }

    #[tokio::test]
    async fn test_sink_event_report_without_controller() {
        let api = test_api().await;
        drop(api.event_rx);

        let (status, _) = sink_event_report(State(api.ctx), Json(SinkEvent::Playing))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
