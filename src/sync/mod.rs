//! Station synchronization.
//!
//! Stations pull records changed since a cursor, push their own edits, or do
//! both in one call. Conflicts are resolved per record by `updatedAt`; the
//! newer copy wins as a whole.
//!
//! - [`change_feed`]: incremental reads keyed on `updatedAt`
//! - [`merge`]: last-write-wins application of pushed records
//! - [`SyncService`]: the three operations exposed over HTTP

pub mod change_feed;
mod error;
pub mod merge;
mod orchestrator;
pub mod protocol;

pub use error::SyncError;
pub use orchestrator::SyncService;
pub use protocol::{ApiResponse, ChangeSet, ChangesQuery, FullSyncResult, PushResult, SyncRequest};
