//! JSON documents exchanged with stations.
//!
//! Field names are camelCase on the wire. Every list in a push may be absent or
//! `null`, both of which mean "nothing of this kind".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::SyncError;
use crate::models::{timestamp, Customer, Product, SyncRecord, Ticket, Vehicle};

/// Generic response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl ApiResponse<()> {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }
}

/// Query parameters of a pull.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangesQuery {
    /// Exclusive lower bound; absent means from the beginning.
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    pub last_sync_time: Option<DateTime<Utc>>,
    pub station_id: Option<String>,
}

/// Body of a push or full sync.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    pub last_sync_time: Option<DateTime<Utc>>,
    pub station_id: Option<String>,
    #[serde(default, deserialize_with = "record_list")]
    pub weighing_tickets: Vec<Ticket>,
    #[serde(default, deserialize_with = "record_list")]
    pub customers: Vec<Customer>,
    #[serde(default, deserialize_with = "record_list")]
    pub vehicles: Vec<Vehicle>,
    #[serde(default, deserialize_with = "record_list")]
    pub products: Vec<Product>,
}

/// A missing or `null` list is empty; records without `createdAt` take their
/// `updatedAt`.
fn record_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + SyncRecord,
{
    let mut records = Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default();
    records.iter_mut().for_each(T::fill_created_at);
    Ok(records)
}

impl SyncRequest {
    pub fn batch(&self) -> SyncBatch<'_> {
        SyncBatch {
            weighing_tickets: &self.weighing_tickets,
            customers: &self.customers,
            vehicles: &self.vehicles,
            products: &self.products,
        }
    }
}

/// Records submitted by a station, grouped by kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncBatch<'a> {
    pub weighing_tickets: &'a [Ticket],
    pub customers: &'a [Customer],
    pub vehicles: &'a [Vehicle],
    pub products: &'a [Product],
}

impl SyncBatch<'_> {
    pub fn len(&self) -> usize {
        self.weighing_tickets.len() + self.customers.len() + self.vehicles.len() + self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rejects the whole batch if any record lacks an id or carries a
    /// timestamp that cannot be stored.
    pub fn validate(&self) -> Result<(), SyncError> {
        check_records("weighingTickets", self.weighing_tickets)?;
        check_records("customers", self.customers)?;
        check_records("vehicles", self.vehicles)?;
        check_records("products", self.products)
    }
}

fn check_records<R: SyncRecord>(field: &str, records: &[R]) -> Result<(), SyncError> {
    for (index, record) in records.iter().enumerate() {
        let problem = if record.id().trim().is_empty() {
            "id must not be empty"
        } else if !timestamp::in_storable_range(&record.updated_at()) {
            "updatedAt is outside years 0001-9999"
        } else if !timestamp::in_storable_range(&record.created_at()) {
            "createdAt is outside years 0001-9999"
        } else {
            continue;
        };

        return Err(SyncError::InvalidInput(format!(
            "{}[{}]: {}",
            field, index, problem
        )));
    }

    Ok(())
}

/// Records changed after a cursor, plus the time the feed was generated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSet {
    /// Suitable as the next cursor.
    pub sync_time: DateTime<Utc>,
    pub weighing_tickets: Vec<Ticket>,
    pub customers: Vec<Customer>,
    pub vehicles: Vec<Vehicle>,
    pub products: Vec<Product>,
    pub total_changes: usize,
}

impl ChangeSet {
    pub fn new(
        sync_time: DateTime<Utc>,
        weighing_tickets: Vec<Ticket>,
        customers: Vec<Customer>,
        vehicles: Vec<Vehicle>,
        products: Vec<Product>,
    ) -> Self {
        let total_changes =
            weighing_tickets.len() + customers.len() + vehicles.len() + products.len();
        Self {
            sync_time,
            weighing_tickets,
            customers,
            vehicles,
            products,
            total_changes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_changes == 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushResult {
    pub success: bool,
    pub synced_count: usize,
    pub sync_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullSyncResult {
    pub success: bool,
    pub pushed_count: usize,
    pub pulled_count: usize,
    pub sync_time: DateTime<Utc>,
    pub server_changes: ChangeSet,
}
