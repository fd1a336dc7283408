//! Schedule repository
//!
//! Owns the SQLite pool and publishes full immutable snapshots of the
//! schedule and filler collections through watch channels after every
//! committed write. Subscribers always see a wholly new collection, never a
//! delta — the same semantics the browser front end got from its document
//! store subscription.
//!
//! Snapshots are `Arc`-wrapped so a controller tick can hold one without
//! cloning entry data.

use crate::db;
use crate::error::{Error, Result};
use onair_common::{FillerEntry, ScheduleEntry};
use sqlx::{Pool, Sqlite};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::info;
use uuid::Uuid;

/// Full immutable schedule snapshot, ordered by start time ascending
pub type ScheduleSnapshot = Arc<Vec<ScheduleEntry>>;

/// Full immutable filler-pool snapshot (unordered)
pub type FillerSnapshot = Arc<Vec<FillerEntry>>;

/// Fields for a new schedule entry; the repository assigns the id
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub title: String,
    pub artist: String,
    pub audio_url: String,
    pub start_time: i64,
    pub duration_seconds: u32,
}

impl NewEntry {
    fn into_entry(self) -> ScheduleEntry {
        ScheduleEntry {
            id: Uuid::new_v4(),
            title: self.title,
            artist: self.artist,
            audio_url: self.audio_url,
            start_time: self.start_time,
            duration_seconds: self.duration_seconds,
        }
    }
}

/// Fields for a new filler track
#[derive(Debug, Clone)]
pub struct NewFiller {
    pub title: String,
    pub artist: String,
    pub audio_url: String,
}

/// SQLite-backed repository with push-based snapshot subscriptions
pub struct ScheduleRepository {
    pool: Pool<Sqlite>,
    schedule_tx: watch::Sender<ScheduleSnapshot>,
    filler_tx: watch::Sender<FillerSnapshot>,
    /// Serializes schedule writes so overlap validation always runs against
    /// every committed row
    schedule_write: Mutex<()>,
}

impl ScheduleRepository {
    /// Open the repository over an initialized database and publish the
    /// initial snapshots.
    pub async fn new(pool: Pool<Sqlite>) -> Result<Self> {
        let schedule = Arc::new(db::schedule::list_all(&pool).await?);
        let filler = Arc::new(db::filler::list_all(&pool).await?);
        info!(
            "Schedule repository opened: {} scheduled entries, {} filler tracks",
            schedule.len(),
            filler.len()
        );

        let (schedule_tx, _) = watch::channel(schedule);
        let (filler_tx, _) = watch::channel(filler);

        Ok(Self {
            pool,
            schedule_tx,
            filler_tx,
            schedule_write: Mutex::new(()),
        })
    }

    /// Subscribe to schedule snapshots. The receiver is immediately
    /// populated with the current snapshot.
    pub fn subscribe_schedule(&self) -> watch::Receiver<ScheduleSnapshot> {
        self.schedule_tx.subscribe()
    }

    /// Subscribe to filler-pool snapshots
    pub fn subscribe_filler(&self) -> watch::Receiver<FillerSnapshot> {
        self.filler_tx.subscribe()
    }

    /// Current schedule snapshot
    pub fn schedule(&self) -> ScheduleSnapshot {
        self.schedule_tx.borrow().clone()
    }

    /// Current filler snapshot
    pub fn filler(&self) -> FillerSnapshot {
        self.filler_tx.borrow().clone()
    }

    /// Create one schedule entry and republish
    pub async fn create_entry(&self, new: NewEntry) -> Result<ScheduleEntry> {
        let _write = self.schedule_write.lock().await;

        let entry = new.into_entry();
        db::schedule::insert(&self.pool, &entry).await?;
        self.refresh_schedule().await?;
        info!("Created schedule entry '{}' ({})", entry.title, entry.id);
        Ok(entry)
    }

    /// Create a batch of entries with pre-commit overlap validation.
    ///
    /// The batch is checked together with the existing schedule; if any two
    /// intervals overlap, the whole batch is rejected before any write and
    /// the conflicting pair is reported.
    pub async fn create_batch(&self, batch: Vec<NewEntry>) -> Result<Vec<ScheduleEntry>> {
        // Hold the write lock across validation and commit: the snapshot
        // read here must not go stale under a concurrent write.
        let _write = self.schedule_write.lock().await;

        let entries: Vec<ScheduleEntry> = batch.into_iter().map(NewEntry::into_entry).collect();

        let mut combined: Vec<ScheduleEntry> =
            self.schedule().iter().cloned().chain(entries.iter().cloned()).collect();
        if let Some(conflict) = find_overlap(&mut combined) {
            return Err(conflict);
        }

        db::schedule::insert_batch(&self.pool, &entries).await?;
        self.refresh_schedule().await?;
        info!("Created {} schedule entries in batch", entries.len());
        Ok(entries)
    }

    /// Delete an entry by id and republish. Returns true if it existed.
    pub async fn delete_entry(&self, id: Uuid) -> Result<bool> {
        let _write = self.schedule_write.lock().await;

        let removed = db::schedule::delete(&self.pool, id).await?;
        if removed {
            self.refresh_schedule().await?;
            info!("Deleted schedule entry {}", id);
        }
        Ok(removed)
    }

    /// Create one filler track and republish
    pub async fn create_filler(&self, new: NewFiller) -> Result<FillerEntry> {
        let entry = FillerEntry {
            id: Uuid::new_v4(),
            title: new.title,
            artist: new.artist,
            audio_url: new.audio_url,
        };
        db::filler::insert(&self.pool, &entry).await?;
        self.refresh_filler().await?;
        info!("Created filler track '{}' ({})", entry.title, entry.id);
        Ok(entry)
    }

    /// Delete a filler track by id and republish. Returns true if it existed.
    pub async fn delete_filler(&self, id: Uuid) -> Result<bool> {
        let removed = db::filler::delete(&self.pool, id).await?;
        if removed {
            self.refresh_filler().await?;
            info!("Deleted filler track {}", id);
        }
        Ok(removed)
    }

    async fn refresh_schedule(&self) -> Result<()> {
        let snapshot = Arc::new(db::schedule::list_all(&self.pool).await?);
        self.schedule_tx.send_replace(snapshot);
        Ok(())
    }

    async fn refresh_filler(&self) -> Result<()> {
        let snapshot = Arc::new(db::filler::list_all(&self.pool).await?);
        self.filler_tx.send_replace(snapshot);
        Ok(())
    }
}

/// Find the first overlapping pair in a set of entries.
///
/// Sorts by start time and checks each adjacent pair for
/// `entry[i].end > entry[i+1].start`. Returns a `ScheduleConflict` naming
/// the pair and the overlap window, or None when the set is conflict-free.
pub fn find_overlap(entries: &mut [ScheduleEntry]) -> Option<Error> {
    entries.sort_by_key(|e| e.start_time);

    for pair in entries.windows(2) {
        let (first, second) = (&pair[0], &pair[1]);
        if first.end_time() > second.start_time {
            let overlap_end = first.end_time().min(second.end_time());
            let overlap_seconds = u32::try_from(overlap_end - second.start_time).unwrap_or(0);
            return Some(Error::ScheduleConflict {
                first_title: first.title.clone(),
                second_title: second.title.clone(),
                overlap_start: second.start_time,
                overlap_seconds,
            });
        }
    }

    None
}
