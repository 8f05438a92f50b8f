// Backup Snapshot Domain Model

use serde::{Deserialize, Serialize};

use crate::domain::{ConfigId, ConfigRecord, JobId, ScriptId, ScriptRecord};

/// Snapshot ID
pub type SnapshotId = String;

/// Immutable capture of a job's artifact directory plus the config/script
/// identifiers that were effective at capture time.
///
/// While the row exists, `path` must hold a complete copy of the captured
/// tree. A row whose path is gone is corrupt, not an empty backup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupSnapshot {
    pub id: SnapshotId,
    pub job_id: JobId,
    pub path: String,
    pub version: i32,
    pub config_id: Option<ConfigId>,
    pub sql_id: Option<ScriptId>,
    pub description: Option<String>,
    pub created_at: i64, // epoch ms
}

/// Where a snapshot's version number comes from.
///
/// Precedence: script version, then effective config version, then 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotVersion {
    Script(i32),
    Config(i32),
    Default,
}

impl SnapshotVersion {
    pub const DEFAULT_VERSION: i32 = 1;

    pub fn resolve(script: Option<&ScriptRecord>, config: Option<&ConfigRecord>) -> Self {
        match (script, config) {
            (Some(script), _) => SnapshotVersion::Script(script.version),
            (None, Some(config)) => SnapshotVersion::Config(config.version),
            (None, None) => SnapshotVersion::Default,
        }
    }

    pub fn value(self) -> i32 {
        match self {
            SnapshotVersion::Script(v) | SnapshotVersion::Config(v) => v,
            SnapshotVersion::Default => Self::DEFAULT_VERSION,
        }
    }
}
