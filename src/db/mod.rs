mod records;
mod store;

pub use store::{EntityStore, SqliteQuery, StoreSession, StoredRecord};

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use sqlx::Row;
use std::path::Path;
use std::time::Duration;

use crate::models::timestamp;

/// Initialize the database connection pool and run migrations
pub async fn init_db(db_path: &Path, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    // Run migrations
    sqlx::migrate!("./migrations").run(&pool).await?;

    tracing::debug!("Database ready at {}", db_path.display());

    Ok(pool)
}

/// Formats a timestamp as fixed-width UTC text.
///
/// Every stored timestamp has the same width, so comparing the text in SQL
/// orders rows by time.
pub fn encode_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Refuses timestamps whose encoding would not sort in time order.
pub(crate) fn ensure_storable(column: &str, ts: &DateTime<Utc>) -> Result<(), sqlx::Error> {
    if timestamp::in_storable_range(ts) {
        Ok(())
    } else {
        Err(sqlx::Error::Encode(
            format!("{} {} is outside years 0001-9999", column, ts).into(),
        ))
    }
}

pub(crate) fn decode_timestamp(column: &str, raw: &str) -> Result<DateTime<Utc>, sqlx::Error> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| sqlx::Error::ColumnDecode {
            index: column.to_string(),
            source: Box::new(e),
        })
}

pub(crate) fn timestamp_column(row: &SqliteRow, column: &str) -> Result<DateTime<Utc>, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    decode_timestamp(column, &raw)
}

pub(crate) fn optional_timestamp_column(
    row: &SqliteRow,
    column: &str,
) -> Result<Option<DateTime<Utc>>, sqlx::Error> {
    let raw: Option<String> = row.try_get(column)?;
    raw.map(|raw| decode_timestamp(column, &raw)).transpose()
}
