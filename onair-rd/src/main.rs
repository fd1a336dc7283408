//! OnAir Radio Daemon (onair-rd) - Main entry point
//!
//! Wires the schedule repository, the playback mode controller, the sink
//! channels, and the HTTP/SSE API together, then serves until shutdown.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use onair_common::config::TomlConfig;
use onair_common::events::EventBus;
use onair_rd::api::{self, AppContext};
use onair_rd::config::{Config, ConfigOverrides};
use onair_rd::playback::sink::{self, SinkHandle};
use onair_rd::playback::ModeController;
use onair_rd::presence::PresenceCounter;
use onair_rd::repo::ScheduleRepository;
use onair_rd::SharedState;

/// Command-line arguments for onair-rd
#[derive(Parser, Debug)]
#[command(name = "onair-rd")]
#[command(about = "Schedule resolution and playback continuity daemon")]
#[command(version)]
struct Args {
    /// Path to the TOML bootstrap configuration
    #[arg(short, long, default_value = "onair.toml", env = "ONAIR_CONFIG")]
    config: PathBuf,

    /// Port to listen on (overrides the TOML value)
    #[arg(short, long, env = "ONAIR_PORT")]
    port: Option<u16>,

    /// Database file path (overrides the TOML value)
    #[arg(short, long, env = "ONAIR_DATABASE")]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Bootstrap config read twice: once here for the log filter, once in
    // Config::load together with the database
    let toml_config = TomlConfig::load(&args.config)
        .with_context(|| format!("failed to load configuration from {:?}", args.config))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("onair_rd={0},onair_common={0},tower_http=info", toml_config.logging.level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting OnAir radio daemon");

    let config = Config::load(
        &args.config,
        ConfigOverrides {
            database_path: args.database,
            port: args.port,
        },
    )
    .await
    .context("failed to load configuration")?;

    let bus = Arc::new(EventBus::new(256));
    let repo = Arc::new(
        ScheduleRepository::new(config.db_pool.clone())
            .await
            .context("failed to open schedule repository")?,
    );
    let state = Arc::new(SharedState::new(
        config.runtime.volume,
        config.runtime.muted,
    ));

    // Sink command channel: controller -> web bridge -> browser (SSE)
    let (sink_handle, cmd_rx) = SinkHandle::channel();
    tokio::spawn(sink::run_web_bridge(cmd_rx, Arc::clone(&bus)));

    // Sink event channel: browser (/player/event) -> controller
    let (sink_event_tx, sink_event_rx) = sink::event_channel();

    let controller = ModeController::new(
        Arc::clone(&state),
        Arc::clone(&bus),
        sink_handle.clone(),
        repo.subscribe_schedule(),
        repo.subscribe_filler(),
        sink_event_rx,
    );
    tokio::spawn(controller.run());

    let presence = Arc::new(PresenceCounter::new(Arc::clone(&bus)));

    let ctx = AppContext {
        state,
        repo,
        bus,
        sink: sink_handle,
        sink_events: sink_event_tx,
        presence,
        db_pool: config.db_pool.clone(),
        admin_token: config.runtime.admin_token.clone(),
    };

    api::run(ctx, config.port, shutdown_signal())
        .await
        .context("server error")?;

    info!("Shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
