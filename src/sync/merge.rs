//! Applies station writes to the store under last-write-wins.
//!
//! Conflicts are settled per whole record: the copy with the larger
//! `updatedAt` wins and replaces every field. Each record is one atomic
//! conditional write, so concurrent pushes for the same id converge on the
//! newest copy regardless of arrival order.

use super::protocol::SyncBatch;
use super::SyncError;
use crate::db::{StoreSession, StoredRecord};

/// Applies every record of `batch` independently.
///
/// Returns how many records were inserted or replaced. Stale and equal-age
/// copies are skipped without error. There is no rollback: on a store failure
/// the error reports how many records were applied before it.
pub async fn apply_batch(session: &mut StoreSession, batch: SyncBatch<'_>) -> Result<usize, SyncError> {
    let mut applied = 0;

    apply_records(session, batch.weighing_tickets, &mut applied).await?;
    apply_records(session, batch.customers, &mut applied).await?;
    apply_records(session, batch.vehicles, &mut applied).await?;
    apply_records(session, batch.products, &mut applied).await?;

    Ok(applied)
}

async fn apply_records<R: StoredRecord>(
    session: &mut StoreSession,
    records: &[R],
    applied: &mut usize,
) -> Result<(), SyncError> {
    for record in records {
        match session.upsert_if_newer(record).await {
            Ok(true) => {
                *applied += 1;
                tracing::debug!(kind = %R::KIND, id = record.id(), "Applied record");
            }
            Ok(false) => {
                tracing::debug!(
                    kind = %R::KIND,
                    id = record.id(),
                    updated_at = %record.updated_at(),
                    "Discarded stale record"
                );
            }
            Err(source) => {
                tracing::warn!(kind = %R::KIND, id = record.id(), "Store write failed: {}", source);
                return Err(SyncError::Store {
                    applied: *applied,
                    source,
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_db, EntityStore};
    use crate::models::{Customer, Product, Ticket, TicketStatus, Vehicle};
    use chrono::{DateTime, Utc};
    use tempfile::TempDir;

    struct TestContext {
        store: EntityStore,
        _temp_dir: TempDir,
    }

    async fn setup() -> TestContext {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_db(&temp_dir.path().join("test.db"), 4).await.unwrap();
        TestContext {
            store: EntityStore::new(pool),
            _temp_dir: temp_dir,
        }
    }

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn batch_of<'a>(
        tickets: &'a [Ticket],
        customers: &'a [Customer],
        vehicles: &'a [Vehicle],
        products: &'a [Product],
    ) -> SyncBatch<'a> {
        SyncBatch {
            weighing_tickets: tickets,
            customers,
            vehicles,
            products,
        }
    }

    #[tokio::test]
    async fn test_pushing_same_batch_twice_is_idempotent() {
        let ctx = setup().await;
        let mut session = ctx.store.session().await.unwrap();

        let tickets = vec![
            Ticket::new("T1", "PC-0001", "51A-12345", at("2025-03-01T08:00:00Z")),
            Ticket::new("T2", "PC-0002", "51A-67890", at("2025-03-01T08:10:00Z")),
        ];
        let customers = vec![Customer::new("C1", "KH01", "Cong ty A", at("2025-03-01T07:00:00Z"))];
        let vehicles = vec![Vehicle::new("V1", "51A-12345", at("2025-03-01T07:30:00Z"))];
        let products = vec![Product::new("P1", "CAT", "Cat vang", at("2025-03-01T06:00:00Z"))];
        let batch = batch_of(&tickets, &customers, &vehicles, &products);

        assert_eq!(apply_batch(&mut session, batch).await.unwrap(), 5);
        assert_eq!(apply_batch(&mut session, batch).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_last_write_wins_in_either_order() {
        let older = Ticket::new("T1", "PC-0001", "51A-12345", at("2025-03-01T08:00:00Z"));
        let mut newer = Ticket::new("T1", "PC-0001", "51A-12345", at("2025-03-01T09:00:00Z"))
            .with_weights(15200.0, 6100.0)
            .with_status(TicketStatus::Completed);
        // created_at is kept from the first insert
        newer.created_at = older.created_at;

        for order in [[&older, &newer], [&newer, &older]] {
            let ctx = setup().await;
            let mut session = ctx.store.session().await.unwrap();

            for ticket in order {
                let tickets = std::slice::from_ref(ticket);
                apply_batch(&mut session, batch_of(tickets, &[], &[], &[]))
                    .await
                    .unwrap();
            }

            let stored: Ticket = session.get("T1").await.unwrap().unwrap();
            assert_eq!(&stored, &newer);
        }
    }

    #[tokio::test]
    async fn test_unknown_id_is_created() {
        let ctx = setup().await;
        let mut session = ctx.store.session().await.unwrap();

        let vehicles = vec![Vehicle::new("V-new", "29C-00001", at("2025-03-01T08:00:00Z"))];
        let applied = apply_batch(&mut session, batch_of(&[], &[], &vehicles, &[]))
            .await
            .unwrap();

        assert_eq!(applied, 1);
        assert!(session.get::<Vehicle>("V-new").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_only_accepted_records_are_counted() {
        let ctx = setup().await;
        let mut session = ctx.store.session().await.unwrap();

        let seed = vec![Product::new("P1", "CAT", "Cat vang", at("2025-03-01T08:00:00Z"))];
        apply_batch(&mut session, batch_of(&[], &[], &[], &seed))
            .await
            .unwrap();

        let products = vec![
            Product::new("P1", "CAT", "Stale", at("2025-03-01T07:00:00Z")),
            Product::new("P2", "DA", "Da 1x2", at("2025-03-01T08:00:00Z")),
        ];
        let applied = apply_batch(&mut session, batch_of(&[], &[], &[], &products))
            .await
            .unwrap();

        assert_eq!(applied, 1);
        let stored: Product = session.get("P1").await.unwrap().unwrap();
        assert_eq!(stored.name, "Cat vang");
    }

    #[tokio::test]
    async fn test_pushed_deletion_propagates() {
        let ctx = setup().await;
        let mut session = ctx.store.session().await.unwrap();

        let live = vec![Customer::new("C1", "KH01", "Cong ty A", at("2025-03-01T08:00:00Z"))];
        apply_batch(&mut session, batch_of(&[], &live, &[], &[]))
            .await
            .unwrap();

        let mut tombstone = Customer::new("C1", "KH01", "Cong ty A", at("2025-03-01T09:00:00Z"));
        tombstone.is_deleted = true;
        let deleted = vec![tombstone];
        assert_eq!(
            apply_batch(&mut session, batch_of(&[], &deleted, &[], &[]))
                .await
                .unwrap(),
            1
        );

        assert!(session.get::<Customer>("C1").await.unwrap().is_none());
        let feed: Vec<Customer> = session
            .changed_since(Some(at("2025-03-01T08:00:00Z")))
            .await
            .unwrap();
        assert!(feed[0].is_deleted);
    }

    #[tokio::test]
    async fn test_store_failure_keeps_earlier_writes_and_stops() {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_db(&temp_dir.path().join("test.db"), 4).await.unwrap();
        sqlx::query(
            "CREATE TRIGGER reject_v2 BEFORE INSERT ON vehicles WHEN NEW.id = 'V2' \
             BEGIN SELECT RAISE(ABORT, 'vehicle V2 rejected'); END",
        )
        .execute(&pool)
        .await
        .unwrap();
        let store = EntityStore::new(pool);
        let mut session = store.session().await.unwrap();

        let vehicles = vec![
            Vehicle::new("V1", "51A-00001", at("2025-03-01T08:00:00Z")),
            Vehicle::new("V2", "51A-00002", at("2025-03-01T08:00:00Z")),
            Vehicle::new("V3", "51A-00003", at("2025-03-01T08:00:00Z")),
        ];
        let err = apply_batch(&mut session, batch_of(&[], &[], &vehicles, &[]))
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Store { applied: 1, .. }));
        assert!(session.get::<Vehicle>("V1").await.unwrap().is_some());
        assert!(session.get::<Vehicle>("V3").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_pushes_converge_on_newest() {
        let ctx = setup().await;

        let t2 = Ticket::new("T1", "PC-0001", "51A-12345", at("2025-03-01T08:00:00Z"))
            .with_weights(15000.0, 6000.0);
        let mut t3 = Ticket::new("T1", "PC-0001", "51A-12345", at("2025-03-01T08:00:01Z"))
            .with_weights(15100.0, 6000.0)
            .with_status(TicketStatus::Completed);
        t3.created_at = t2.created_at;

        let mut handles = Vec::new();
        for ticket in [t2.clone(), t3.clone(), t2.clone(), t3.clone()] {
            let store = ctx.store.clone();
            handles.push(tokio::spawn(async move {
                let mut session = store.session().await.unwrap();
                let tickets = vec![ticket];
                apply_batch(&mut session, batch_of(&tickets, &[], &[], &[]))
                    .await
                    .unwrap()
            }));
        }

        let mut applied = 0;
        for handle in handles {
            applied += handle.await.unwrap();
        }
        assert!((1..=2).contains(&applied));

        let mut session = ctx.store.session().await.unwrap();
        let stored: Ticket = session.get("T1").await.unwrap().unwrap();
        assert_eq!(stored, t3);
    }
}
