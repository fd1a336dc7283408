//! Schedule table access
//!
//! Rows map to `ScheduleEntry`. All reads return the full collection sorted
//! by start time ascending; the repository layer republishes snapshots from
//! these reads.

use crate::error::{Error, Result};
use onair_common::ScheduleEntry;
use sqlx::{Pool, Row, Sqlite};
use std::str::FromStr;
use uuid::Uuid;

fn entry_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<ScheduleEntry> {
    let guid: String = row.try_get("guid")?;
    let id = Uuid::from_str(&guid)
        .map_err(|e| Error::Internal(format!("corrupt guid '{}' in schedule: {}", guid, e)))?;
    let duration: i64 = row.try_get("duration_seconds")?;

    Ok(ScheduleEntry {
        id,
        title: row.try_get("title")?,
        artist: row.try_get("artist")?,
        audio_url: row.try_get("audio_url")?,
        start_time: row.try_get("start_time")?,
        duration_seconds: u32::try_from(duration)
            .map_err(|_| Error::Internal(format!("negative duration {} in schedule", duration)))?,
    })
}

/// Load the full schedule, ordered by start time ascending
pub async fn list_all(pool: &Pool<Sqlite>) -> Result<Vec<ScheduleEntry>> {
    let rows = sqlx::query(
        "SELECT guid, title, artist, audio_url, start_time, duration_seconds
         FROM schedule ORDER BY start_time ASC",
    )
    .fetch_all(pool)
    .await?;

    rows.iter().map(entry_from_row).collect()
}

/// Insert one schedule entry
pub async fn insert(pool: &Pool<Sqlite>, entry: &ScheduleEntry) -> Result<()> {
    sqlx::query(
        "INSERT INTO schedule (guid, title, artist, audio_url, start_time, duration_seconds)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(entry.id.to_string())
    .bind(&entry.title)
    .bind(&entry.artist)
    .bind(&entry.audio_url)
    .bind(entry.start_time)
    .bind(i64::from(entry.duration_seconds))
    .execute(pool)
    .await?;

    Ok(())
}

/// Insert a batch of entries in a single transaction.
///
/// Either every entry is written or none are.
pub async fn insert_batch(pool: &Pool<Sqlite>, entries: &[ScheduleEntry]) -> Result<()> {
    let mut tx = pool.begin().await?;

    for entry in entries {
        sqlx::query(
            "INSERT INTO schedule (guid, title, artist, audio_url, start_time, duration_seconds)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(entry.id.to_string())
        .bind(&entry.title)
        .bind(&entry.artist)
        .bind(&entry.audio_url)
        .bind(entry.start_time)
        .bind(i64::from(entry.duration_seconds))
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Delete an entry by id. Returns true if a row was removed.
pub async fn delete(pool: &Pool<Sqlite>, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM schedule WHERE guid = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
