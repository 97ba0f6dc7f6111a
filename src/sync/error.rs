//! Sync error types.

/// Errors that can occur while serving a sync call.
#[derive(Debug)]
pub enum SyncError {
    /// The request was rejected before touching the store.
    InvalidInput(String),
    /// A store write failed partway through a push batch.
    ///
    /// Records applied before the failure stay applied.
    Store { applied: usize, source: sqlx::Error },
    /// Any other store failure (connection, scan).
    Database(sqlx::Error),
}

impl SyncError {
    /// Whether the caller is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, SyncError::InvalidInput(_))
    }
}

impl std::fmt::Display for SyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncError::InvalidInput(e) => write!(f, "Invalid sync data: {}", e),
            SyncError::Store { applied, source } => write!(
                f,
                "Store failure after applying {} record(s): {}",
                applied, source
            ),
            SyncError::Database(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl std::error::Error for SyncError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SyncError::InvalidInput(_) => None,
            SyncError::Store { source, .. } => Some(source),
            SyncError::Database(e) => Some(e),
        }
    }
}

impl From<sqlx::Error> for SyncError {
    fn from(e: sqlx::Error) -> Self {
        SyncError::Database(e)
    }
}
