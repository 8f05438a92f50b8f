// Snapshot creation
//
// Artifacts are copied into a fresh directory before the row exists, and the
// row is then written in a transaction of its own. The database is never held
// for the length of a copy, and a row only ever points at a complete directory.

use super::BackupPorts;
use crate::domain::{BackupSnapshot, Job, ScriptRecord, SnapshotId, SnapshotVersion, Workspace};
use crate::error::Result;
use crate::port::{ArtifactError, BackupRepositoryTransaction};
use tracing::{info, warn};

/// Creates point-in-time copies of a job's deployable artifacts.
///
/// Does not lock; callers mutating a job concurrently must hold its `JobLock`.
pub struct SnapshotManager {
    ports: BackupPorts,
    workspace: Workspace,
}

impl SnapshotManager {
    pub fn new(ports: BackupPorts, workspace: Workspace) -> Self {
        Self { ports, workspace }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Snapshot the job's current artifacts.
    ///
    /// Returns `None` (and touches nothing) when the job has no artifacts to copy.
    /// `script` is the effective SQL script of a FlinkSql job. On any failure the
    /// partial directory is removed (best effort) and no row is left behind.
    pub async fn backup(
        &self,
        job: &Job,
        script: Option<&ScriptRecord>,
        description: Option<String>,
    ) -> Result<Option<SnapshotId>> {
        let source = job.backup_source();
        if !self.ports.store.exists(source).await {
            info!(job_id = %job.id, source = %source, "Nothing to back up, artifact home missing");
            return Ok(None);
        }

        let config = self.ports.configs.get_effective(&job.id).await?;
        let version = SnapshotVersion::resolve(script, config.as_ref());

        let id = self.ports.id_provider.generate_id();
        let snapshot = BackupSnapshot {
            path: self.workspace.snapshot_path(&job.id, &id)?,
            id,
            job_id: job.id.clone(),
            version: version.value(),
            config_id: config.map(|c| c.id),
            sql_id: script.map(|s| s.id.clone()),
            description,
            created_at: self.ports.time_provider.now_millis(),
        };

        if let Err(copy_err) = self.copy_artifacts(source, &snapshot.path).await {
            self.discard_directory(&snapshot).await;
            return Err(copy_err.into());
        }

        if let Err(e) = self.record(&snapshot).await {
            self.discard_directory(&snapshot).await;
            return Err(e);
        }

        info!(
            job_id = %job.id,
            snapshot_id = %snapshot.id,
            version = snapshot.version,
            source = ?version,
            path = %snapshot.path,
            "Snapshot created"
        );
        Ok(Some(snapshot.id))
    }

    async fn copy_artifacts(&self, source: &str, dest: &str) -> std::result::Result<(), ArtifactError> {
        self.ports.store.mkdirs(dest).await?;
        self.ports.store.copy_dir(source, dest).await
    }

    /// Insert the row of a fully copied snapshot
    async fn record(&self, snapshot: &BackupSnapshot) -> Result<()> {
        let mut tx = self.ports.backup_tx.begin_transaction().await?;
        if let Err(e) = tx.insert(snapshot).await {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(snapshot_id = %snapshot.id, error = %rollback_err, "Backup transaction rollback failed");
            }
            return Err(e);
        }
        tx.commit().await
    }

    async fn discard_directory(&self, snapshot: &BackupSnapshot) {
        if let Err(cleanup_err) = self.ports.store.delete(&snapshot.path).await {
            warn!(
                snapshot_id = %snapshot.id,
                path = %snapshot.path,
                error = %cleanup_err,
                "Could not remove partial snapshot directory"
            );
        }
    }
}
