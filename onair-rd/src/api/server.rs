//! HTTP server setup and routing

use crate::api::{handlers, sse};
use crate::error::{Error, Result};
use crate::playback::sink::{SinkEventSender, SinkHandle};
use crate::presence::PresenceCounter;
use crate::repo::ScheduleRepository;
use crate::state::SharedState;
use axum::{
    routing::{delete, get, post},
    Router,
};
use onair_common::events::EventBus;
use sqlx::{Pool, Sqlite};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

/// Shared application context passed to all handlers.
///
/// Clone is cheap (Arcs and channel handles), and gives us
/// `FromRef<AppContext>` for free via Axum's blanket implementation.
#[derive(Clone)]
pub struct AppContext {
    pub state: Arc<SharedState>,
    pub repo: Arc<ScheduleRepository>,
    pub bus: Arc<EventBus>,
    /// Command half of the sink, for user playback controls
    pub sink: SinkHandle,
    /// Event half of the sink; `/player/event` reports feed the controller
    pub sink_events: SinkEventSender,
    pub presence: Arc<PresenceCounter>,
    pub db_pool: Pool<Sqlite>,
    /// Bearer token required on admin routes
    pub admin_token: String,
}

/// Build the router with all routes.
///
/// Admin routes enforce the bearer token through the `RequireAdmin`
/// extractor rather than a middleware layer, so public and admin methods
/// can share a path.
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        // Health endpoint
        .route("/health", get(handlers::health))
        // SSE event stream (registers listener presence for its lifetime)
        .route("/events", get(sse::event_stream))
        // Read surface
        .route("/state", get(handlers::get_state))
        .route("/listeners", get(handlers::get_listeners))
        // Schedule management (GET public, POST admin)
        .route("/schedule", get(handlers::get_schedule).post(handlers::create_entry))
        .route("/schedule/bulk", post(handlers::create_bulk))
        .route("/schedule/:id", delete(handlers::delete_entry))
        // Filler pool management (admin)
        .route("/filler", get(handlers::get_filler).post(handlers::create_filler))
        .route("/filler/:id", delete(handlers::delete_filler))
        // Playback control (forwarded to the sink; never touches the schedule)
        .route("/playback/play", post(handlers::play))
        .route("/playback/pause", post(handlers::pause))
        .route("/playback/volume", post(handlers::set_volume))
        .route("/playback/mute", post(handlers::set_muted))
        // Browser sink event reports
        .route("/player/event", post(handlers::sink_event_report))
        // Attach application context
        .with_state(ctx)
        // Enable CORS for the browser front end
        .layer(CorsLayer::permissive())
}

/// Run the HTTP server until the shutdown future resolves
pub async fn run(
    ctx: AppContext,
    port: u16,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let app = create_router(ctx);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Http(format!("failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| Error::Http(e.to_string()))?;

    info!("HTTP server stopped");
    Ok(())
}
