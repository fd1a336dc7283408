//! Filler pool table access

use crate::error::{Error, Result};
use onair_common::FillerEntry;
use sqlx::{Pool, Row, Sqlite};
use std::str::FromStr;
use uuid::Uuid;

/// Load the full filler pool.
///
/// The pool is unordered; insertion order is as good as any.
pub async fn list_all(pool: &Pool<Sqlite>) -> Result<Vec<FillerEntry>> {
    let rows = sqlx::query("SELECT guid, title, artist, audio_url FROM filler")
        .fetch_all(pool)
        .await?;

    rows.iter()
        .map(|row| {
            let guid: String = row.try_get("guid")?;
            let id = Uuid::from_str(&guid)
                .map_err(|e| Error::Internal(format!("corrupt guid '{}' in filler: {}", guid, e)))?;
            Ok(FillerEntry {
                id,
                title: row.try_get("title")?,
                artist: row.try_get("artist")?,
                audio_url: row.try_get("audio_url")?,
            })
        })
        .collect()
}

/// Insert one filler track
pub async fn insert(pool: &Pool<Sqlite>, entry: &FillerEntry) -> Result<()> {
    sqlx::query("INSERT INTO filler (guid, title, artist, audio_url) VALUES (?, ?, ?, ?)")
        .bind(entry.id.to_string())
        .bind(&entry.title)
        .bind(&entry.artist)
        .bind(&entry.audio_url)
        .execute(pool)
        .await?;

    Ok(())
}

/// Delete a filler track by id. Returns true if a row was removed.
pub async fn delete(pool: &Pool<Sqlite>, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM filler WHERE guid = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
