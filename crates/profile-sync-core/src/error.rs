use profile_sync_services::ServiceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    /// A required profile or tag definition is missing on the remote.
    /// Fatal for the affected instance's run; other instances continue.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A remote read/write failed. Per-item occurrences are caught at
    /// the call site and counted as skips; this only propagates when a
    /// whole-run operation (listing, setup) fails.
    #[error(transparent)]
    Service(#[from] ServiceError),
}
