// SQLite Transaction Implementation

use crate::backup_repository::insert_snapshot;
use crate::error::map_sqlx_error;
use async_trait::async_trait;
use snapback_core::domain::BackupSnapshot;
use snapback_core::error::Result;
use snapback_core::port::{BackupRepositoryTransaction, Transaction};
use sqlx::{Sqlite, Transaction as SqlxTransaction};

/// Backup transaction; dropped without commit means rolled back
pub struct SqliteBackupTransaction<'a> {
    tx: SqlxTransaction<'a, Sqlite>,
}

impl<'a> SqliteBackupTransaction<'a> {
    pub fn new(tx: SqlxTransaction<'a, Sqlite>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl Transaction for SqliteBackupTransaction<'_> {
    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await.map_err(map_sqlx_error)
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.tx.rollback().await.map_err(map_sqlx_error)
    }
}

#[async_trait]
impl BackupRepositoryTransaction for SqliteBackupTransaction<'_> {
    async fn insert(&mut self, snapshot: &BackupSnapshot) -> Result<()> {
        insert_snapshot(&mut *self.tx, snapshot).await
    }
}
