// Snapshot retention: revoke, per-snapshot delete, whole-job cleanup

use super::BackupPorts;
use crate::application::job_lock::JobLock;
use crate::domain::{Job, JobId, SnapshotId, Workspace};
use crate::error::{AppError, Result};
use std::sync::Arc;
use tracing::{error, info, warn};

pub struct RetentionReaper {
    ports: BackupPorts,
    workspace: Workspace,
    lock: Arc<JobLock>,
}

impl RetentionReaper {
    pub fn new(ports: BackupPorts, workspace: Workspace, lock: Arc<JobLock>) -> Self {
        Self {
            ports,
            workspace,
            lock,
        }
    }

    /// Undo the newest snapshot of `job`: its directory is moved into the
    /// application workspace and its row deleted. No-op without snapshots.
    pub async fn revoke(&self, job: &Job) -> Result<Option<SnapshotId>> {
        self.lock
            .run_exclusive(&job.id, || async {
                let Some(latest) = self.ports.backups.find_latest(&job.id).await? else {
                    info!(job_id = %job.id, "No snapshot to revoke");
                    return Ok(None);
                };

                let target = self.workspace.app_workspace();
                self.ports.store.move_to(&latest.path, &target).await?;
                self.ports.backups.delete(&latest.id).await?;

                info!(
                    job_id = %job.id,
                    snapshot_id = %latest.id,
                    moved_to = %target,
                    "Snapshot revoked"
                );
                Ok(Some(latest.id))
            })
            .await
    }

    /// Drop every snapshot row of a deleted job and its backup directory.
    /// Both parts are attempted; failures are logged, never returned.
    /// Ids that do not name a single directory are refused without touching anything.
    pub async fn remove_job(&self, job_id: &JobId) {
        let dir = match self.workspace.job_backup_dir(job_id) {
            Ok(dir) => dir,
            Err(e) => {
                warn!(job_id = %job_id, error = %e, "Job cleanup refused");
                return;
            }
        };

        let outcome = self
            .lock
            .run_exclusive(job_id, || async {
                match self.ports.backups.delete_by_job(job_id).await {
                    Ok(rows) => info!(job_id = %job_id, rows, "Snapshot rows removed"),
                    Err(e) => error!(job_id = %job_id, error = %e, "Failed to remove snapshot rows"),
                }

                match self.ports.store.delete(&dir).await {
                    Ok(()) => info!(job_id = %job_id, dir = %dir, "Backup directory removed"),
                    Err(e) => error!(job_id = %job_id, dir = %dir, error = %e, "Failed to remove backup directory"),
                }
                Ok(())
            })
            .await;

        if let Err(e) = outcome {
            warn!(job_id = %job_id, error = %e, "Job cleanup skipped");
        }
    }

    /// Delete one snapshot's directory and row
    ///
    /// # Errors
    /// - AppError::NotFound if the snapshot does not exist
    /// - AppError::SnapshotCleanup wrapping the storage or row failure
    pub async fn delete_snapshot(&self, id: &SnapshotId) -> Result<()> {
        let snapshot = self
            .ports
            .backups
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Snapshot {} not found", id)))?;

        let wrap = |source: AppError| AppError::SnapshotCleanup {
            snapshot_id: id.clone(),
            source: Box::new(source),
        };

        self.lock
            .run_exclusive(&snapshot.job_id, || async {
                self.ports
                    .store
                    .delete(&snapshot.path)
                    .await
                    .map_err(|e| wrap(e.into()))?;
                self.ports.backups.delete(id).await.map_err(wrap)?;
                info!(job_id = %snapshot.job_id, snapshot_id = %id, "Snapshot deleted");
                Ok(())
            })
            .await
    }
}
