//! Configuration for the onair-rd daemon
//!
//! Two-tier configuration:
//! 1. **TOML bootstrap**: database path, port, logging (static)
//! 2. **Database runtime**: volume, mute, admin token from the `settings`
//!    table
//!
//! Priority: command-line arguments > TOML file > database > built-in
//! defaults.

use crate::db;
use crate::error::{Error, Result};
use onair_common::config::TomlConfig;
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Runtime settings loaded from the database at startup
#[derive(Debug, Clone)]
pub struct RuntimeSettings {
    /// Restored volume (0.0-1.0)
    pub volume: f32,
    /// Restored mute flag
    pub muted: bool,
    /// Admin API bearer token
    pub admin_token: String,
}

impl RuntimeSettings {
    /// Load runtime settings, initializing defaults for missing keys
    pub async fn load(pool: &SqlitePool) -> Result<Self> {
        let volume = db::settings::get_volume(pool).await?;
        let muted = db::settings::get_muted(pool).await?;
        let admin_token = db::settings::load_admin_token(pool).await?;

        info!("Loaded runtime settings from database");
        Ok(Self {
            volume,
            muted,
            admin_token,
        })
    }
}

/// Complete daemon configuration: bootstrap plus runtime
#[derive(Debug, Clone)]
pub struct Config {
    /// Database file path
    pub database_path: PathBuf,

    /// HTTP server port
    pub port: u16,

    /// Database connection pool
    pub db_pool: SqlitePool,

    /// Runtime settings from the database
    pub runtime: RuntimeSettings,
}

/// Command-line configuration overrides
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub database_path: Option<PathBuf>,
    pub port: Option<u16>,
}

impl Config {
    /// Load configuration from a TOML file plus CLI overrides, connect the
    /// pool, initialize the database, and read runtime settings.
    pub async fn load(toml_path: &PathBuf, cli_overrides: ConfigOverrides) -> Result<Self> {
        let toml_config =
            TomlConfig::load(toml_path).map_err(|e| Error::Config(e.to_string()))?;
        info!("Loaded TOML configuration from {:?}", toml_path);

        let database_path = cli_overrides
            .database_path
            .unwrap_or(toml_config.database_path);
        let port = cli_overrides.port.unwrap_or(toml_config.port);

        let db_url = format!("sqlite:{}?mode=rwc", database_path.display());
        let db_pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
            .connect(&db_url)
            .await?;

        info!("Connected to database: {:?}", database_path);

        db::init::initialize_database(&db_pool).await?;
        let runtime = RuntimeSettings::load(&db_pool).await?;

        Ok(Config {
            database_path,
            port,
            db_pool,
            runtime,
        })
    }
}
