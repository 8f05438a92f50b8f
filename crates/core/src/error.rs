// Central Error Type for the Application

use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    /// Metadata store failure
    #[error("Database error: {0}")]
    Database(String),

    /// Artifact store failure
    #[error("Artifact error: {0}")]
    Artifact(#[from] crate::port::ArtifactError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Lock contention on job {job_id}: not acquired within {waited_ms}ms")]
    LockContention { job_id: String, waited_ms: u64 },

    #[error("Rollback executor saturated: {queued} tasks queued, {workers} workers busy")]
    ExecutorSaturated { queued: usize, workers: usize },

    #[error("Failed to delete snapshot {snapshot_id}: {source}")]
    SnapshotCleanup {
        snapshot_id: String,
        #[source]
        source: Box<AppError>,
    },
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

// Note: sqlx::Error conversion is handled in infra-sqlite crate
// by converting to AppError::Database(String)
