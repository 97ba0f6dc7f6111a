//! Access to the shared entity tables.
//!
//! Every sync call opens one [`StoreSession`] (a pooled connection), runs all
//! of its statements on it, and releases it when the session is dropped.

use chrono::{DateTime, Utc};
use sqlx::pool::PoolConnection;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{FromRow, Sqlite, SqlitePool};

use super::{encode_timestamp, ensure_storable};
use crate::models::{EntityKind, SyncRecord, Vehicle};

pub type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

/// A record type with a backing table.
pub trait StoredRecord:
    SyncRecord + for<'r> FromRow<'r, SqliteRow> + Send + Sync + Unpin + 'static
{
    /// Column names in bind order, starting with `id`.
    const COLUMNS: &'static [&'static str];

    /// Binds one value per entry of [`Self::COLUMNS`], in the same order.
    fn bind_columns<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q>;
}

/// Columns a conditional replace leaves untouched.
const IMMUTABLE_COLUMNS: [&str; 2] = ["id", "created_at"];

/// Insert-or-replace as one statement.
///
/// An existing row is replaced only when the incoming `updated_at` is strictly
/// newer; otherwise the statement changes nothing and reports zero rows.
fn upsert_sql(table: &str, columns: &[&str]) -> String {
    let placeholders = vec!["?"; columns.len()].join(", ");
    let assignments = columns
        .iter()
        .filter(|column| !IMMUTABLE_COLUMNS.contains(*column))
        .map(|column| format!("{column} = excluded.{column}"))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "INSERT INTO {table} ({}) VALUES ({placeholders}) \
         ON CONFLICT(id) DO UPDATE SET {assignments} \
         WHERE excluded.updated_at > {table}.updated_at",
        columns.join(", ")
    )
}

/// Handle to the entity tables.
#[derive(Debug, Clone)]
pub struct EntityStore {
    pool: SqlitePool,
}

impl EntityStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Acquires a connection for the duration of one call.
    pub async fn session(&self) -> Result<StoreSession, sqlx::Error> {
        let conn = self.pool.acquire().await?;
        Ok(StoreSession { conn })
    }
}

/// One pooled connection, returned to the pool on drop.
pub struct StoreSession {
    conn: PoolConnection<Sqlite>,
}

impl StoreSession {
    /// Looks up a live record by id. Tombstoned rows are not returned.
    pub async fn get<R: StoredRecord>(&mut self, id: &str) -> Result<Option<R>, sqlx::Error> {
        let sql = format!(
            "SELECT * FROM {} WHERE id = ? AND is_deleted = 0",
            R::KIND.table()
        );

        sqlx::query_as::<_, R>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .await
    }

    /// Inserts `record`, or replaces the stored row if `record` is newer.
    ///
    /// Returns `true` when a row was written. Tombstoned rows take part in the
    /// comparison like any other row. A record whose timestamps fall outside
    /// the storable range is refused with an encode error.
    pub async fn upsert_if_newer<R: StoredRecord>(&mut self, record: &R) -> Result<bool, sqlx::Error> {
        ensure_storable("updated_at", &record.updated_at())?;
        ensure_storable("created_at", &record.created_at())?;

        let sql = upsert_sql(R::KIND.table(), R::COLUMNS);

        let result = record
            .bind_columns(sqlx::query(&sql))
            .execute(&mut *self.conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// All rows, tombstones included, modified strictly after `cursor`,
    /// oldest first. `None` scans from the beginning.
    pub async fn changed_since<R: StoredRecord>(
        &mut self,
        cursor: Option<DateTime<Utc>>,
    ) -> Result<Vec<R>, sqlx::Error> {
        let table = R::KIND.table();

        match cursor {
            Some(cursor) => {
                ensure_storable("cursor", &cursor)?;
                let sql =
                    format!("SELECT * FROM {table} WHERE updated_at > ? ORDER BY updated_at, id");
                sqlx::query_as::<_, R>(&sql)
                    .bind(encode_timestamp(&cursor))
                    .fetch_all(&mut *self.conn)
                    .await
            }
            None => {
                let sql = format!("SELECT * FROM {table} ORDER BY updated_at, id");
                sqlx::query_as::<_, R>(&sql)
                    .fetch_all(&mut *self.conn)
                    .await
            }
        }
    }

    /// Flags a live record as deleted, stamping it with `at`.
    ///
    /// Follows the same rule as [`Self::upsert_if_newer`]: nothing changes
    /// unless `at` is newer than the stored `updated_at`.
    pub async fn soft_delete(
        &mut self,
        kind: EntityKind,
        id: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        ensure_storable("updated_at", &at)?;

        let sql = format!(
            "UPDATE {} SET is_deleted = 1, updated_at = ? \
             WHERE id = ? AND is_deleted = 0 AND updated_at < ?",
            kind.table()
        );
        let at = encode_timestamp(&at);

        let result = sqlx::query(&sql)
            .bind(&at)
            .bind(id)
            .bind(&at)
            .execute(&mut *self.conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn vehicle_by_plate(&mut self, plate_number: &str) -> Result<Option<Vehicle>, sqlx::Error> {
        sqlx::query_as::<_, Vehicle>(
            "SELECT * FROM vehicles WHERE plate_number = ? AND is_deleted = 0",
        )
        .bind(plate_number)
        .fetch_optional(&mut *self.conn)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;
    use crate::models::{Customer, CustomerType, Product, Ticket, TicketStatus};
    use chrono::TimeZone;
    use tempfile::TempDir;

    struct TestContext {
        store: EntityStore,
        _temp_dir: TempDir, // Keep alive for duration of test
    }

    async fn setup_store() -> TestContext {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let pool = init_db(&db_path, 4).await.unwrap();
        TestContext {
            store: EntityStore::new(pool),
            _temp_dir: temp_dir,
        }
    }

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn full_ticket() -> Ticket {
        let mut ticket = Ticket::new("T1", "PC-0001", "51A-12345", at("2025-03-01T08:30:00Z"))
            .with_station("scale-station-02")
            .with_weights(15200.5, 6100.25)
            .with_status(TicketStatus::Completed);
        ticket.vehicle_id = Some("V1".into());
        ticket.customer_id = Some("C1".into());
        ticket.customer_name = Some("Cong ty A".into());
        ticket.product_id = Some("P1".into());
        ticket.product_name = Some("Cat vang".into());
        ticket.unit_price = Some(120.0);
        ticket.total_amount = Some(1_092_030.0);
        ticket.first_weigh_time = at("2025-03-01T08:00:00Z");
        ticket.second_weigh_time = Some(at("2025-03-01T08:25:00.123456789Z"));
        ticket.notes = Some("wet load".into());
        ticket.first_weigh_image_url = Some("https://blob/first.jpg".into());
        ticket.second_weigh_image_url = Some("https://blob/second.jpg".into());
        ticket.operator_id = Some("op-7".into());
        ticket.operator_name = Some("Lan".into());
        ticket.created_at = at("2025-03-01T07:59:00Z");
        ticket.is_synced = false;
        ticket
    }

    #[test]
    fn test_upsert_sql_guards_on_updated_at() {
        let sql = upsert_sql("vehicles", &["id", "plate_number", "created_at", "updated_at"]);

        assert!(sql.starts_with(
            "INSERT INTO vehicles (id, plate_number, created_at, updated_at) VALUES (?, ?, ?, ?)"
        ));
        assert!(sql.contains("plate_number = excluded.plate_number"));
        assert!(sql.contains("updated_at = excluded.updated_at"));
        assert!(!sql.contains("id = excluded.id"));
        assert!(!sql.contains("created_at = excluded.created_at"));
        assert!(sql.ends_with("WHERE excluded.updated_at > vehicles.updated_at"));
    }

    #[tokio::test]
    async fn test_ticket_roundtrip_keeps_every_field() {
        let ctx = setup_store().await;
        let mut session = ctx.store.session().await.unwrap();

        let ticket = full_ticket();
        assert!(session.upsert_if_newer(&ticket).await.unwrap());

        let fetched: Ticket = session.get("T1").await.unwrap().unwrap();
        assert_eq!(fetched, ticket);
    }

    #[tokio::test]
    async fn test_customer_and_product_roundtrip() {
        let ctx = setup_store().await;
        let mut session = ctx.store.session().await.unwrap();

        let mut customer = Customer::new("C1", "KH01", "Cong ty A", at("2025-03-01T08:00:00Z"))
            .with_type(CustomerType::Company);
        customer.tax_code = Some("0301234567".into());
        customer.is_active = false;
        let product =
            Product::new("P1", "CAT", "Cat vang", at("2025-03-01T08:00:00Z")).with_price(120.0);

        session.upsert_if_newer(&customer).await.unwrap();
        session.upsert_if_newer(&product).await.unwrap();

        let fetched: Customer = session.get("C1").await.unwrap().unwrap();
        assert_eq!(fetched, customer);
        let fetched: Product = session.get("P1").await.unwrap().unwrap();
        assert_eq!(fetched, product);
    }

    #[tokio::test]
    async fn test_newer_write_replaces_older_is_discarded() {
        let ctx = setup_store().await;
        let mut session = ctx.store.session().await.unwrap();

        let v1 = Vehicle::new("V1", "51A-12345", at("2025-03-01T08:00:00Z"));
        assert!(session.upsert_if_newer(&v1).await.unwrap());

        let newer = Vehicle::new("V1", "51A-99999", at("2025-03-01T09:00:00Z"));
        assert!(session.upsert_if_newer(&newer).await.unwrap());

        let older = Vehicle::new("V1", "51A-00000", at("2025-03-01T08:30:00Z"));
        assert!(!session.upsert_if_newer(&older).await.unwrap());

        let same = Vehicle::new("V1", "51A-11111", at("2025-03-01T09:00:00Z"));
        assert!(!session.upsert_if_newer(&same).await.unwrap());

        let stored: Vehicle = session.get("V1").await.unwrap().unwrap();
        assert_eq!(stored.plate_number, "51A-99999");
        assert_eq!(stored.updated_at, at("2025-03-01T09:00:00Z"));
    }

    #[tokio::test]
    async fn test_replace_keeps_created_at() {
        let ctx = setup_store().await;
        let mut session = ctx.store.session().await.unwrap();

        let original = Vehicle::new("V1", "51A-12345", at("2025-03-01T08:00:00Z"));
        session.upsert_if_newer(&original).await.unwrap();

        let mut update = Vehicle::new("V1", "51A-12345", at("2025-03-02T08:00:00Z"));
        update.created_at = at("2025-03-02T08:00:00Z");
        session.upsert_if_newer(&update).await.unwrap();

        let stored: Vehicle = session.get("V1").await.unwrap().unwrap();
        assert_eq!(stored.created_at, at("2025-03-01T08:00:00Z"));
        assert_eq!(stored.updated_at, at("2025-03-02T08:00:00Z"));
    }

    #[tokio::test]
    async fn test_changed_since_is_exclusive_and_ordered() {
        let ctx = setup_store().await;
        let mut session = ctx.store.session().await.unwrap();

        for (id, ts) in [
            ("V3", "2025-03-01T10:00:00Z"),
            ("V1", "2025-03-01T08:00:00Z"),
            ("V2", "2025-03-01T09:00:00Z"),
        ] {
            session
                .upsert_if_newer(&Vehicle::new(id, "plate", at(ts)))
                .await
                .unwrap();
        }

        let all: Vec<Vehicle> = session.changed_since(None).await.unwrap();
        let ids: Vec<&str> = all.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["V1", "V2", "V3"]);

        let after: Vec<Vehicle> = session
            .changed_since(Some(at("2025-03-01T08:00:00Z")))
            .await
            .unwrap();
        let ids: Vec<&str> = after.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["V2", "V3"]);

        let none: Vec<Vehicle> = session
            .changed_since(Some(at("2025-03-01T10:00:00Z")))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_soft_delete_hides_from_get_but_not_feed() {
        let ctx = setup_store().await;
        let mut session = ctx.store.session().await.unwrap();

        let product = Product::new("P1", "CAT", "Cat vang", at("2025-03-01T08:00:00Z"));
        session.upsert_if_newer(&product).await.unwrap();

        let deleted = session
            .soft_delete(EntityKind::Product, "P1", at("2025-03-01T09:00:00Z"))
            .await
            .unwrap();
        assert!(deleted);

        let live: Option<Product> = session.get("P1").await.unwrap();
        assert!(live.is_none());

        let feed: Vec<Product> = session
            .changed_since(Some(at("2025-03-01T08:30:00Z")))
            .await
            .unwrap();
        assert_eq!(feed.len(), 1);
        assert!(feed[0].is_deleted);
        assert_eq!(feed[0].updated_at, at("2025-03-01T09:00:00Z"));
    }

    #[tokio::test]
    async fn test_soft_delete_ignores_stale_missing_and_deleted() {
        let ctx = setup_store().await;
        let mut session = ctx.store.session().await.unwrap();

        let product = Product::new("P1", "CAT", "Cat vang", at("2025-03-01T08:00:00Z"));
        session.upsert_if_newer(&product).await.unwrap();

        // Older than the stored version
        assert!(!session
            .soft_delete(EntityKind::Product, "P1", at("2025-03-01T07:00:00Z"))
            .await
            .unwrap());
        // Unknown id
        assert!(!session
            .soft_delete(EntityKind::Product, "P404", at("2025-03-01T09:00:00Z"))
            .await
            .unwrap());

        assert!(session
            .soft_delete(EntityKind::Product, "P1", at("2025-03-01T09:00:00Z"))
            .await
            .unwrap());
        // Already a tombstone
        assert!(!session
            .soft_delete(EntityKind::Product, "P1", at("2025-03-01T10:00:00Z"))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_newer_push_revives_tombstone() {
        let ctx = setup_store().await;
        let mut session = ctx.store.session().await.unwrap();

        let customer = Customer::new("C1", "KH01", "Cong ty A", at("2025-03-01T08:00:00Z"));
        session.upsert_if_newer(&customer).await.unwrap();
        session
            .soft_delete(EntityKind::Customer, "C1", at("2025-03-01T09:00:00Z"))
            .await
            .unwrap();

        // A stale edit does not resurrect the record
        let stale = Customer::new("C1", "KH01", "Stale", at("2025-03-01T08:30:00Z"));
        assert!(!session.upsert_if_newer(&stale).await.unwrap());
        assert!(session.get::<Customer>("C1").await.unwrap().is_none());

        let revived = Customer::new("C1", "KH01", "Cong ty B", at("2025-03-01T10:00:00Z"));
        assert!(session.upsert_if_newer(&revived).await.unwrap());

        let stored: Customer = session.get("C1").await.unwrap().unwrap();
        assert_eq!(stored.name, "Cong ty B");
    }

    #[tokio::test]
    async fn test_far_future_write_is_refused() {
        let ctx = setup_store().await;
        let mut session = ctx.store.session().await.unwrap();

        let current = Vehicle::new("V1", "51A-12345", at("2025-03-01T00:00:00Z"));
        session.upsert_if_newer(&current).await.unwrap();

        let far_future = Utc.with_ymd_and_hms(10000, 1, 1, 0, 0, 0).unwrap();
        let runaway = Vehicle::new("V1", "RUNAWAY", far_future);
        let err = session.upsert_if_newer(&runaway).await.unwrap_err();
        assert!(matches!(err, sqlx::Error::Encode(_)));

        let stored: Vehicle = session.get("V1").await.unwrap().unwrap();
        assert_eq!(stored.plate_number, "51A-12345");

        // An older write still loses to the stored row
        let older = Vehicle::new("V1", "OLDER", at("2024-03-01T00:00:00Z"));
        assert!(!session.upsert_if_newer(&older).await.unwrap());

        assert!(session
            .changed_since::<Vehicle>(Some(far_future))
            .await
            .is_err());
        assert!(session
            .soft_delete(EntityKind::Vehicle, "V1", far_future)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_vehicle_by_plate() {
        let ctx = setup_store().await;
        let mut session = ctx.store.session().await.unwrap();

        let vehicle =
            Vehicle::new("V1", "51A-12345", at("2025-03-01T08:00:00Z")).with_driver("Minh");
        session.upsert_if_newer(&vehicle).await.unwrap();

        let found = session.vehicle_by_plate("51A-12345").await.unwrap().unwrap();
        assert_eq!(found.id, "V1");
        assert_eq!(found.driver_name.as_deref(), Some("Minh"));

        assert!(session.vehicle_by_plate("29C-00000").await.unwrap().is_none());

        session
            .soft_delete(EntityKind::Vehicle, "V1", at("2025-03-01T09:00:00Z"))
            .await
            .unwrap();
        assert!(session.vehicle_by_plate("51A-12345").await.unwrap().is_none());
    }
}
