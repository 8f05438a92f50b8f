// Application Layer - Use Cases and Business Logic

pub mod backup;
pub mod executor;
pub mod job_lock;
pub mod recovery;

// Re-exports
pub use backup::{BackupPorts, BackupService, RetentionReaper, RollbackOrchestrator, SnapshotManager};
pub use executor::{ExecutorConfig, RollbackExecutor};
pub use job_lock::JobLock;
pub use recovery::RollbackRecovery;
