// Port Layer - Interfaces for external dependencies

pub mod artifact_store;
pub mod backup_repository;
pub mod effective_pointer;
pub mod id_provider; // For deterministic testing
pub mod job_repository;
pub mod rollback_outcome;
pub mod time_provider;
pub mod transaction;

// Re-exports
pub use artifact_store::{base_name, ArtifactError, ArtifactStore};
pub use backup_repository::BackupRepository;
pub use effective_pointer::{ConfigService, EffectivePointerService, ScriptService};
pub use id_provider::IdProvider;
pub use job_repository::JobRepository;
pub use rollback_outcome::RollbackOutcomeRepository;
pub use time_provider::TimeProvider;
pub use transaction::{BackupRepositoryTransaction, Transaction, TransactionalBackupRepository};
