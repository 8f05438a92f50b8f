// Artifact workspace layout

use crate::domain::{DomainError, JobId, SnapshotId};

const BACKUPS_DIR: &str = "backups";
const WORKSPACE_DIR: &str = "workspace";

/// Root of the artifact store area this engine manages.
///
/// ```text
/// <root>/backups/<job_id>/<snapshot_id>   snapshot copies
/// <root>/workspace                        general area revoked snapshots move to
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: String,
}

impl Workspace {
    pub fn new(root: impl Into<String>) -> Self {
        let root: String = root.into();
        let trimmed = root.trim_end_matches('/');
        let root = if trimmed.is_empty() && root.starts_with('/') {
            "/".to_string()
        } else {
            trimmed.to_string()
        };
        Self { root }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn backups_root(&self) -> String {
        join(&self.root, BACKUPS_DIR)
    }

    /// Per-job backup tree, removed as a whole when the job is deleted
    pub fn job_backup_dir(&self, job_id: &JobId) -> Result<String, DomainError> {
        validate_path_segment("job", job_id)?;
        Ok(join(&self.backups_root(), job_id))
    }

    pub fn snapshot_path(
        &self,
        job_id: &JobId,
        snapshot_id: &SnapshotId,
    ) -> Result<String, DomainError> {
        validate_path_segment("snapshot", snapshot_id)?;
        Ok(join(&self.job_backup_dir(job_id)?, snapshot_id))
    }

    pub fn app_workspace(&self) -> String {
        join(&self.root, WORKSPACE_DIR)
    }
}

/// Ids are used verbatim as directory names below the backups root.
///
/// Rejects anything that would resolve outside its own directory: empty ids,
/// `.` and `..`, path separators and NUL bytes.
pub fn validate_path_segment(kind: &str, id: &str) -> Result<(), DomainError> {
    let invalid = id.is_empty()
        || id == "."
        || id == ".."
        || id.contains(['/', '\\', '\0']);
    if invalid {
        return Err(DomainError::ValidationError(format!(
            "Invalid {} id {:?}: must be a single path segment",
            kind, id
        )));
    }
    Ok(())
}

fn join(base: &str, child: &str) -> String {
    if base.ends_with('/') {
        format!("{}{}", base, child)
    } else {
        format!("{}/{}", base, child)
    }
}
