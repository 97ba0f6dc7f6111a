//! Incremental change feed.
//!
//! Each entity kind is scanned with its own query. A record written between
//! two scans of the same call shows up on the next pull instead.
//!
//! The cursor comparison is strictly greater-than, so a pull never re-delivers
//! a row stamped exactly at the cursor. A sibling written at that same instant
//! after the previous pull is skipped as well.

use chrono::{DateTime, Utc};

use super::protocol::ChangeSet;
use super::SyncError;
use crate::db::StoreSession;
use crate::models::timestamp;

/// Collects every record, tombstones included, changed after `cursor`.
///
/// `station_id` is accepted but does not narrow the result.
pub async fn changes_since(
    session: &mut StoreSession,
    cursor: Option<DateTime<Utc>>,
    station_id: Option<&str>,
) -> Result<ChangeSet, SyncError> {
    if let Some(cursor) = cursor.filter(|c| !timestamp::in_storable_range(c)) {
        return Err(SyncError::InvalidInput(format!(
            "lastSyncTime {} is outside years 0001-9999",
            cursor
        )));
    }

    // Taken before scanning so rows committed mid-scan are newer than it.
    let sync_time = Utc::now();

    if let Some(station_id) = station_id {
        tracing::debug!(station_id, "Station filter requested; returning all stations");
    }

    let weighing_tickets = session.changed_since(cursor).await?;
    let customers = session.changed_since(cursor).await?;
    let vehicles = session.changed_since(cursor).await?;
    let products = session.changed_since(cursor).await?;

    let changes = ChangeSet::new(sync_time, weighing_tickets, customers, vehicles, products);

    tracing::debug!(
        cursor = ?cursor,
        tickets = changes.weighing_tickets.len(),
        customers = changes.customers.len(),
        vehicles = changes.vehicles.len(),
        products = changes.products.len(),
        "Built change feed"
    );

    Ok(changes)
}
