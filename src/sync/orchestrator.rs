//! Pull, push and full sync over one shared store.

use chrono::{DateTime, Utc};

use super::change_feed::changes_since;
use super::merge::apply_batch;
use super::protocol::{ChangeSet, FullSyncResult, PushResult, SyncRequest};
use super::SyncError;
use crate::db::EntityStore;

/// Entry point for every sync call.
///
/// Cheap to clone; each call takes its own pooled connection and returns it
/// when done.
#[derive(Debug, Clone)]
pub struct SyncService {
    store: EntityStore,
}

impl SyncService {
    pub fn new(store: EntityStore) -> Self {
        Self { store }
    }

    /// Returns everything changed after `cursor`.
    pub async fn pull(
        &self,
        cursor: Option<DateTime<Utc>>,
        station_id: Option<&str>,
    ) -> Result<ChangeSet, SyncError> {
        let mut session = self.store.session().await?;
        let changes = changes_since(&mut session, cursor, station_id).await?;

        tracing::info!(
            station_id = station_id.unwrap_or("-"),
            total = changes.total_changes,
            "Pulled changes"
        );

        Ok(changes)
    }

    /// Merges the records of `request` into the store.
    ///
    /// A request with a blank record id is rejected before anything is
    /// written.
    pub async fn push(&self, request: &SyncRequest) -> Result<PushResult, SyncError> {
        let batch = request.batch();
        batch.validate()?;

        let mut session = self.store.session().await?;
        let synced_count = apply_batch(&mut session, batch).await?;

        tracing::info!(
            station_id = request.station_id.as_deref().unwrap_or("-"),
            received = batch.len(),
            applied = synced_count,
            "Pushed changes"
        );

        Ok(PushResult {
            success: true,
            synced_count,
            sync_time: Utc::now(),
        })
    }

    /// Push followed by a pull from the request's `lastSyncTime`.
    ///
    /// The pull runs after the push on the same connection, so the station's
    /// own accepted writes come back in `server_changes` when they are newer
    /// than its cursor.
    pub async fn full_sync(&self, request: &SyncRequest) -> Result<FullSyncResult, SyncError> {
        let batch = request.batch();
        batch.validate()?;

        let mut session = self.store.session().await?;
        let pushed_count = apply_batch(&mut session, batch).await?;
        let server_changes = changes_since(
            &mut session,
            request.last_sync_time,
            request.station_id.as_deref(),
        )
        .await?;

        tracing::info!(
            station_id = request.station_id.as_deref().unwrap_or("-"),
            pushed = pushed_count,
            pulled = server_changes.total_changes,
            "Full sync complete"
        );

        Ok(FullSyncResult {
            success: true,
            pushed_count,
            pulled_count: server_changes.total_changes,
            sync_time: server_changes.sync_time,
            server_changes,
        })
    }
}
