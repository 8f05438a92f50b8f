// Snapback Infrastructure - SQLite Adapter
// Implements: JobRepository, BackupRepository (+ transactions), the effective
// pointer / config / script ports, RollbackOutcomeRepository

mod backup_repository;
mod catalog;
mod connection;
mod error;
mod job_repository;
mod migration;
mod outcome_repository;
mod transaction;

pub use backup_repository::SqliteBackupRepository;
pub use catalog::SqliteCatalog;
pub use connection::create_pool;
pub use job_repository::SqliteJobRepository;
pub use migration::run_migrations;
pub use outcome_repository::SqliteOutcomeRepository;
pub use transaction::SqliteBackupTransaction;

// Note: sqlx::Error conversion is handled by map_sqlx_error
// due to Rust's orphan rules (cannot implement From<sqlx::Error> for AppError here)
