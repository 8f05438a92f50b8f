// Rollback Domain Model: request, steps and the outcome record operators poll

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::domain::error::{DomainError, Result};
use crate::domain::{JobId, SnapshotId};

/// Rollback request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollbackRequest {
    pub snapshot_id: SnapshotId,

    /// Capture the current state as a fresh snapshot before restoring
    #[serde(default)]
    pub backup_before: bool,

    /// Description for the pre-rollback snapshot
    #[serde(default)]
    pub description: Option<String>,
}

/// Steps of a rollback, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RollbackStep {
    PreBackup,
    PointerRestore,
    ArtifactDelete,
    ArtifactRestore,
    LaunchStateUpdate,
}

impl RollbackStep {
    /// 1-based position in the sequence
    pub fn number(self) -> u8 {
        match self {
            RollbackStep::PreBackup => 1,
            RollbackStep::PointerRestore => 2,
            RollbackStep::ArtifactDelete => 3,
            RollbackStep::ArtifactRestore => 4,
            RollbackStep::LaunchStateUpdate => 5,
        }
    }

    /// Whether a failure at this step leaves the job's artifacts damaged.
    /// Step 3 removes the effective directory with no undo.
    pub fn leaves_job_damaged(self) -> bool {
        self >= RollbackStep::ArtifactDelete
    }
}

impl std::fmt::Display for RollbackStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RollbackStep::PreBackup => write!(f, "PRE_BACKUP"),
            RollbackStep::PointerRestore => write!(f, "POINTER_RESTORE"),
            RollbackStep::ArtifactDelete => write!(f, "ARTIFACT_DELETE"),
            RollbackStep::ArtifactRestore => write!(f, "ARTIFACT_RESTORE"),
            RollbackStep::LaunchStateUpdate => write!(f, "LAUNCH_STATE_UPDATE"),
        }
    }
}

impl FromStr for RollbackStep {
    type Err = DomainError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "PRE_BACKUP" => Ok(RollbackStep::PreBackup),
            "POINTER_RESTORE" => Ok(RollbackStep::PointerRestore),
            "ARTIFACT_DELETE" => Ok(RollbackStep::ArtifactDelete),
            "ARTIFACT_RESTORE" => Ok(RollbackStep::ArtifactRestore),
            "LAUNCH_STATE_UPDATE" => Ok(RollbackStep::LaunchStateUpdate),
            other => Err(DomainError::ValidationError(format!(
                "Unknown rollback step: {}",
                other
            ))),
        }
    }
}

/// Rollback lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RollbackStatus {
    Submitted,
    Running,
    RolledBack,
    Failed,
    /// Executor was saturated at submission time; nothing ran
    Rejected,
}

impl RollbackStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RollbackStatus::RolledBack | RollbackStatus::Failed | RollbackStatus::Rejected
        )
    }
}

impl std::fmt::Display for RollbackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RollbackStatus::Submitted => write!(f, "SUBMITTED"),
            RollbackStatus::Running => write!(f, "RUNNING"),
            RollbackStatus::RolledBack => write!(f, "ROLLED_BACK"),
            RollbackStatus::Failed => write!(f, "FAILED"),
            RollbackStatus::Rejected => write!(f, "REJECTED"),
        }
    }
}

impl FromStr for RollbackStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "SUBMITTED" => Ok(RollbackStatus::Submitted),
            "RUNNING" => Ok(RollbackStatus::Running),
            "ROLLED_BACK" => Ok(RollbackStatus::RolledBack),
            "FAILED" => Ok(RollbackStatus::Failed),
            "REJECTED" => Ok(RollbackStatus::Rejected),
            other => Err(DomainError::UnknownRollbackStatus(other.to_string())),
        }
    }
}

/// Structured outcome of one submitted rollback.
///
/// The async path never reports back to its submitter, so this record is the
/// only place a failed step becomes visible. `needs_repair` marks jobs whose
/// artifact directory was already deleted when the failure happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollbackOutcome {
    pub id: String,
    pub job_id: JobId,
    pub snapshot_id: SnapshotId,
    pub status: RollbackStatus,
    pub failed_step: Option<RollbackStep>,
    pub error: Option<String>,
    pub needs_repair: bool,
    pub submitted_at: i64,
    pub finished_at: Option<i64>,
}

impl RollbackOutcome {
    pub fn submitted(
        id: impl Into<String>,
        job_id: impl Into<String>,
        snapshot_id: impl Into<String>,
        now_millis: i64,
    ) -> Self {
        Self {
            id: id.into(),
            job_id: job_id.into(),
            snapshot_id: snapshot_id.into(),
            status: RollbackStatus::Submitted,
            failed_step: None,
            error: None,
            needs_repair: false,
            submitted_at: now_millis,
            finished_at: None,
        }
    }

    /// Transition to Running once a worker holds the job lock
    pub fn start(&mut self) -> Result<()> {
        self.transition(RollbackStatus::Submitted, RollbackStatus::Running)
    }

    /// Transition to RolledBack with explicit timestamp
    pub fn succeed(&mut self, now_millis: i64) -> Result<()> {
        self.transition(RollbackStatus::Running, RollbackStatus::RolledBack)?;
        self.finished_at = Some(now_millis);
        Ok(())
    }

    /// Mark as Failed at `step` with explicit timestamp
    pub fn fail(&mut self, step: RollbackStep, error: impl Into<String>, now_millis: i64) {
        self.status = RollbackStatus::Failed;
        self.failed_step = Some(step);
        self.error = Some(error.into());
        self.needs_repair = step.leaves_job_damaged();
        self.finished_at = Some(now_millis);
    }

    /// Mark as Failed before any step ran (lock timeout, job vanished)
    pub fn abort(&mut self, error: impl Into<String>, now_millis: i64) {
        self.status = RollbackStatus::Failed;
        self.failed_step = None;
        self.error = Some(error.into());
        self.needs_repair = false;
        self.finished_at = Some(now_millis);
    }

    /// Mark as Rejected (never scheduled)
    pub fn reject(&mut self, reason: impl Into<String>, now_millis: i64) {
        self.status = RollbackStatus::Rejected;
        self.error = Some(reason.into());
        self.finished_at = Some(now_millis);
    }

    /// Close a record left unfinished by a process that stopped mid-way.
    ///
    /// A rollback that never started changed nothing. One that was running
    /// may have stopped anywhere between the steps, so its job needs repair.
    pub fn interrupt(&mut self, now_millis: i64) -> Result<()> {
        match self.status {
            RollbackStatus::Submitted => {
                self.abort("Interrupted before it started", now_millis);
                Ok(())
            }
            RollbackStatus::Running => {
                self.abort("Interrupted while running, artifact home state unknown", now_millis);
                self.needs_repair = true;
                Ok(())
            }
            terminal => Err(DomainError::InvalidStateTransition {
                from: terminal.to_string(),
                to: RollbackStatus::Failed.to_string(),
            }),
        }
    }

    fn transition(&mut self, from: RollbackStatus, to: RollbackStatus) -> Result<()> {
        if self.status != from {
            return Err(DomainError::InvalidStateTransition {
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }
        self.status = to;
        Ok(())
    }
}
