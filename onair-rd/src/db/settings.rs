//! Settings table access
//!
//! Typed reads and writes over the key-value settings table. All settings
//! are system-wide.

use crate::error::{Error, Result};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use uuid::Uuid;

/// Get a typed setting value, or None if the key is absent
pub async fn get_setting<T: FromStr>(pool: &Pool<Sqlite>, key: &str) -> Result<Option<T>> {
    let value: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?;

    match value {
        Some((raw,)) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| Error::Internal(format!("setting '{}' has unparsable value '{}'", key, raw))),
        None => Ok(None),
    }
}

/// Set a setting value, inserting or replacing
pub async fn set_setting<T: ToString>(pool: &Pool<Sqlite>, key: &str, value: T) -> Result<()> {
    sqlx::query(
        "INSERT OR REPLACE INTO settings (key, value, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP)",
    )
    .bind(key)
    .bind(value.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

/// Get persisted volume (0.0-1.0), defaulting to full volume
pub async fn get_volume(pool: &Pool<Sqlite>) -> Result<f32> {
    match get_setting::<f32>(pool, "volume_level").await? {
        Some(volume) => Ok(volume.clamp(0.0, 1.0)),
        None => {
            set_volume(pool, 1.0).await?;
            Ok(1.0)
        }
    }
}

/// Persist volume (0.0-1.0)
pub async fn set_volume(pool: &Pool<Sqlite>, volume: f32) -> Result<()> {
    set_setting(pool, "volume_level", volume.clamp(0.0, 1.0)).await
}

/// Get persisted mute flag
pub async fn get_muted(pool: &Pool<Sqlite>) -> Result<bool> {
    Ok(get_setting::<bool>(pool, "muted").await?.unwrap_or(false))
}

/// Persist mute flag
pub async fn set_muted(pool: &Pool<Sqlite>, muted: bool) -> Result<()> {
    set_setting(pool, "muted", muted).await
}

/// Load the admin API token, generating and storing one on first use.
///
/// The token stands in for the external credential check: admin routes
/// require it as a bearer token.
pub async fn load_admin_token(pool: &Pool<Sqlite>) -> Result<String> {
    match get_setting::<String>(pool, "admin_token").await? {
        Some(token) if !token.is_empty() => Ok(token),
        _ => {
            let token = Uuid::new_v4().simple().to_string();
            set_setting(pool, "admin_token", &token).await?;
            Ok(token)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::initialize_database;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> Pool<Sqlite> {
        let pool = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .unwrap();
        initialize_database(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_volume_default_and_clamp() {
        let pool = test_pool().await;

        // Seeded default
        assert_eq!(get_volume(&pool).await.unwrap(), 1.0);

        set_volume(&pool, 0.4).await.unwrap();
        assert_eq!(get_volume(&pool).await.unwrap(), 0.4);

        set_volume(&pool, 1.5).await.unwrap();
        assert_eq!(get_volume(&pool).await.unwrap(), 1.0);
    }

    #[tokio::test]
    async fn test_muted_roundtrip() {
        let pool = test_pool().await;
        assert!(!get_muted(&pool).await.unwrap());

        set_muted(&pool, true).await.unwrap();
        assert!(get_muted(&pool).await.unwrap());
    }

    #[tokio::test]
    async fn test_admin_token_generated_once() {
        let pool = test_pool().await;

        let first = load_admin_token(&pool).await.unwrap();
        let second = load_admin_token(&pool).await.unwrap();
        assert!(!first.is_empty());
        assert_eq!(first, second);
    }
}
