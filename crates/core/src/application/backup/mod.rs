// Backup Service - snapshot, rollback and retention use cases

pub mod retention;
pub mod rollback;
pub mod snapshot;

#[cfg(test)]
mod test_support;

pub use retention::RetentionReaper;
pub use rollback::RollbackOrchestrator;
pub use snapshot::SnapshotManager;

use crate::application::executor::RollbackExecutor;
use crate::application::job_lock::JobLock;
use crate::domain::{
    BackupSnapshot, Job, JobId, Page, PageRequest, RollbackOutcome, RollbackRequest, ScriptId,
    SnapshotId, Workspace,
};
use crate::error::{AppError, Result};
use crate::port::{
    ArtifactStore, BackupRepository, ConfigService, EffectivePointerService, IdProvider,
    JobRepository, RollbackOutcomeRepository, ScriptService, TimeProvider,
    TransactionalBackupRepository,
};
use std::sync::Arc;

/// Ports shared by the backup use cases
#[derive(Clone)]
pub struct BackupPorts {
    pub jobs: Arc<dyn JobRepository>,
    pub backups: Arc<dyn BackupRepository>,
    pub backup_tx: Arc<dyn TransactionalBackupRepository>,
    pub outcomes: Arc<dyn RollbackOutcomeRepository>,
    pub store: Arc<dyn ArtifactStore>,
    pub pointers: Arc<dyn EffectivePointerService>,
    pub configs: Arc<dyn ConfigService>,
    pub scripts: Arc<dyn ScriptService>,
    pub id_provider: Arc<dyn IdProvider>,
    pub time_provider: Arc<dyn TimeProvider>,
}

/// Entry point for callers: resolves job ids, then delegates
pub struct BackupService {
    ports: BackupPorts,
    lock: Arc<JobLock>,
    snapshots: Arc<SnapshotManager>,
    rollbacks: RollbackOrchestrator,
    reaper: RetentionReaper,
}

impl BackupService {
    pub fn new(
        ports: BackupPorts,
        workspace: Workspace,
        lock: Arc<JobLock>,
        executor: Arc<RollbackExecutor>,
    ) -> Self {
        let snapshots = Arc::new(SnapshotManager::new(ports.clone(), workspace.clone()));
        let rollbacks = RollbackOrchestrator::new(
            ports.clone(),
            Arc::clone(&snapshots),
            Arc::clone(&lock),
            executor,
        );
        let reaper = RetentionReaper::new(ports.clone(), workspace, Arc::clone(&lock));
        Self {
            ports,
            lock,
            snapshots,
            rollbacks,
            reaper,
        }
    }

    /// Snapshots of a job, newest first, optionally only those that captured `sql_id`
    pub async fn page(
        &self,
        job_id: &JobId,
        sql_id: Option<&ScriptId>,
        page: PageRequest,
    ) -> Result<Page<BackupSnapshot>> {
        self.ports.backups.page_by_job(job_id, sql_id, page).await
    }

    /// Whether any snapshot of the job captured `sql_id`
    pub async fn is_script_backed(&self, job_id: &JobId, sql_id: &ScriptId) -> Result<bool> {
        Ok(self.ports.backups.count_by_script(job_id, sql_id).await? > 0)
    }

    /// Snapshot the job's current artifacts under its lock
    pub async fn backup(
        &self,
        job_id: &JobId,
        description: Option<String>,
    ) -> Result<Option<SnapshotId>> {
        let job = self.load_job(job_id).await?;
        self.lock
            .run_exclusive(job_id, || async {
                let script = if job.is_flink_sql() {
                    self.ports.scripts.get_effective(job_id).await?
                } else {
                    None
                };
                self.snapshots.backup(&job, script.as_ref(), description).await
            })
            .await
    }

    /// Submit an asynchronous rollback; returns the outcome ticket
    pub async fn rollback(&self, req: RollbackRequest) -> Result<String> {
        self.rollbacks.rollback(req).await
    }

    pub async fn rollback_script(&self, job_id: &JobId, sql_id: &ScriptId) -> Result<()> {
        self.rollbacks.rollback_script(job_id, sql_id).await
    }

    pub async fn revoke(&self, job_id: &JobId) -> Result<Option<SnapshotId>> {
        let job = self.load_job(job_id).await?;
        self.reaper.revoke(&job).await
    }

    pub async fn remove_job(&self, job_id: &JobId) {
        self.reaper.remove_job(job_id).await
    }

    pub async fn delete_snapshot(&self, id: &SnapshotId) -> Result<()> {
        self.reaper.delete_snapshot(id).await
    }

    pub async fn rollback_outcome(&self, ticket: &str) -> Result<Option<RollbackOutcome>> {
        self.ports.outcomes.find_by_id(ticket).await
    }

    pub async fn latest_rollback_outcome(&self, job_id: &JobId) -> Result<Option<RollbackOutcome>> {
        self.ports.outcomes.find_latest_by_job(job_id).await
    }

    async fn load_job(&self, job_id: &JobId) -> Result<Job> {
        self.ports
            .jobs
            .find_by_id(job_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Job {} not found", job_id)))
    }
}
