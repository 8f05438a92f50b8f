// Domain Layer - Pure business logic and entities

pub mod effective;
pub mod error;
pub mod job;
pub mod page;
pub mod rollback;
pub mod snapshot;
pub mod workspace;

// Re-exports
pub use effective::{ConfigId, ConfigRecord, EffectiveKind, ScriptId, ScriptRecord};
pub use error::DomainError;
pub use job::{Job, JobId, JobKind, LaunchState};
pub use page::{Page, PageRequest};
pub use rollback::{RollbackOutcome, RollbackRequest, RollbackStatus, RollbackStep};
pub use snapshot::{BackupSnapshot, SnapshotId, SnapshotVersion};
pub use workspace::{validate_path_segment, Workspace};
