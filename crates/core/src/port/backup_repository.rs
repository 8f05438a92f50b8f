// Backup Repository Port (Interface)

use crate::domain::{BackupSnapshot, JobId, Page, PageRequest, ScriptId, SnapshotId};
use crate::error::Result;
use async_trait::async_trait;

/// Repository interface for BackupSnapshot rows.
///
/// "Newest first" everywhere means `created_at` descending, ties broken by
/// insertion order (later insert first).
#[async_trait]
pub trait BackupRepository: Send + Sync {
    /// Find snapshot by ID
    async fn find_by_id(&self, id: &SnapshotId) -> Result<Option<BackupSnapshot>>;

    /// Snapshots of a job, newest first, optionally filtered by script
    async fn page_by_job(
        &self,
        job_id: &JobId,
        sql_id: Option<&ScriptId>,
        page: PageRequest,
    ) -> Result<Page<BackupSnapshot>>;

    /// Newest snapshot of a job
    async fn find_latest(&self, job_id: &JobId) -> Result<Option<BackupSnapshot>>;

    /// Newest snapshot of a job that captured the given script
    async fn find_by_script(
        &self,
        job_id: &JobId,
        sql_id: &ScriptId,
    ) -> Result<Option<BackupSnapshot>>;

    /// Count snapshots of a job that captured the given script
    async fn count_by_script(&self, job_id: &JobId, sql_id: &ScriptId) -> Result<i64>;

    /// Delete one row (returns false if it did not exist)
    async fn delete(&self, id: &SnapshotId) -> Result<bool>;

    /// Delete every row of a job
    async fn delete_by_job(&self, job_id: &JobId) -> Result<u64>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use crate::port::transaction::{
        BackupRepositoryTransaction, Transaction, TransactionalBackupRepository,
    };
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// In-memory backup repository. Vec order is insertion order.
    #[derive(Default, Clone)]
    pub struct InMemoryBackupRepository {
        rows: Arc<Mutex<Vec<BackupSnapshot>>>,
        fail_deletes: Arc<AtomicBool>,
        fail_inserts: Arc<AtomicBool>,
        transactions: Arc<AtomicUsize>,
    }

    impl InMemoryBackupRepository {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_fail_deletes(&self, fail: bool) {
            self.fail_deletes.store(fail, Ordering::SeqCst);
        }

        pub fn set_fail_inserts(&self, fail: bool) {
            self.fail_inserts.store(fail, Ordering::SeqCst);
        }

        /// Number of transactions opened so far
        pub fn transactions_begun(&self) -> usize {
            self.transactions.load(Ordering::SeqCst)
        }

        pub fn rows(&self) -> Vec<BackupSnapshot> {
            self.rows.lock().unwrap().clone()
        }

        fn newest_first(&self, job_id: &JobId, sql_id: Option<&ScriptId>) -> Vec<BackupSnapshot> {
            let rows = self.rows.lock().unwrap();
            let mut matched: Vec<(usize, BackupSnapshot)> = rows
                .iter()
                .enumerate()
                .filter(|(_, s)| &s.job_id == job_id)
                .filter(|(_, s)| sql_id.map_or(true, |id| s.sql_id.as_ref() == Some(id)))
                .map(|(i, s)| (i, s.clone()))
                .collect();
            matched.sort_by(|(ia, a), (ib, b)| b.created_at.cmp(&a.created_at).then(ib.cmp(ia)));
            matched.into_iter().map(|(_, s)| s).collect()
        }

        fn check_delete(&self) -> Result<()> {
            if self.fail_deletes.load(Ordering::SeqCst) {
                return Err(AppError::Database("injected delete failure".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl BackupRepository for InMemoryBackupRepository {
        async fn find_by_id(&self, id: &SnapshotId) -> Result<Option<BackupSnapshot>> {
            Ok(self.rows.lock().unwrap().iter().find(|s| &s.id == id).cloned())
        }

        async fn page_by_job(
            &self,
            job_id: &JobId,
            sql_id: Option<&ScriptId>,
            page: PageRequest,
        ) -> Result<Page<BackupSnapshot>> {
            let all = self.newest_first(job_id, sql_id);
            let total = all.len() as i64;
            let records = all
                .into_iter()
                .skip(page.offset() as usize)
                .take(page.limit() as usize)
                .collect();
            Ok(Page {
                records,
                total,
                page: page.page,
                size: page.size,
            })
        }

        async fn find_latest(&self, job_id: &JobId) -> Result<Option<BackupSnapshot>> {
            Ok(self.newest_first(job_id, None).into_iter().next())
        }

        async fn find_by_script(
            &self,
            job_id: &JobId,
            sql_id: &ScriptId,
        ) -> Result<Option<BackupSnapshot>> {
            Ok(self.newest_first(job_id, Some(sql_id)).into_iter().next())
        }

        async fn count_by_script(&self, job_id: &JobId, sql_id: &ScriptId) -> Result<i64> {
            Ok(self.newest_first(job_id, Some(sql_id)).len() as i64)
        }

        async fn delete(&self, id: &SnapshotId) -> Result<bool> {
            self.check_delete()?;
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|s| &s.id != id);
            Ok(rows.len() != before)
        }

        async fn delete_by_job(&self, job_id: &JobId) -> Result<u64> {
            self.check_delete()?;
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|s| &s.job_id != job_id);
            Ok((before - rows.len()) as u64)
        }
    }

    /// Buffers inserts until commit
    pub struct InMemoryBackupTransaction {
        rows: Arc<Mutex<Vec<BackupSnapshot>>>,
        pending: Vec<BackupSnapshot>,
        fail_inserts: bool,
    }

    #[async_trait]
    impl Transaction for InMemoryBackupTransaction {
        async fn commit(self: Box<Self>) -> Result<()> {
            let tx = *self;
            tx.rows.lock().unwrap().extend(tx.pending);
            Ok(())
        }

        async fn rollback(self: Box<Self>) -> Result<()> {
            Ok(())
        }
    }

    #[async_trait]
    impl BackupRepositoryTransaction for InMemoryBackupTransaction {
        async fn insert(&mut self, snapshot: &BackupSnapshot) -> Result<()> {
            if self.fail_inserts {
                return Err(AppError::Database("injected insert failure".to_string()));
            }
            self.pending.push(snapshot.clone());
            Ok(())
        }
    }

    #[async_trait]
    impl TransactionalBackupRepository for InMemoryBackupRepository {
        async fn begin_transaction(&self) -> Result<Box<dyn BackupRepositoryTransaction>> {
            self.transactions.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(InMemoryBackupTransaction {
                rows: Arc::clone(&self.rows),
                pending: Vec::new(),
                fail_inserts: self.fail_inserts.load(Ordering::SeqCst),
            }))
        }
    }
}
