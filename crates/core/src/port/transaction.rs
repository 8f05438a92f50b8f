// Transaction port for atomic operations

use crate::domain::BackupSnapshot;
use crate::error::Result;
use async_trait::async_trait;

/// Transaction trait for atomic multi-step operations
#[async_trait]
pub trait Transaction: Send {
    /// Commit the transaction
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Rollback the transaction
    async fn rollback(self: Box<Self>) -> Result<()>;
}

/// Transactional BackupRepository operations
#[async_trait]
pub trait TransactionalBackupRepository: Send + Sync {
    /// Begin a new local transaction
    async fn begin_transaction(&self) -> Result<Box<dyn BackupRepositoryTransaction>>;
}

/// BackupRepository operations within a transaction
#[async_trait]
pub trait BackupRepositoryTransaction: Transaction {
    /// Insert snapshot row (visible to others only after commit)
    async fn insert(&mut self, snapshot: &BackupSnapshot) -> Result<()>;
}
