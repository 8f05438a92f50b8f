// Job Descriptor (referenced, not owned by this engine)

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::domain::error::DomainError;

/// Job ID
pub type JobId = String;

/// Kind of deployed job. Decides where a backup reads its artifacts from and
/// whether the FLINKSQL pointer takes part in a rollback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobKind {
    /// Custom code built by the CI/CD pipeline; artifacts live in the dist home
    CustomCodeCicd,
    /// SQL script job with dependencies
    FlinkSql,
    Other,
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobKind::CustomCodeCicd => write!(f, "CUSTOM_CODE_CICD"),
            JobKind::FlinkSql => write!(f, "FLINK_SQL"),
            JobKind::Other => write!(f, "OTHER"),
        }
    }
}

impl FromStr for JobKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CUSTOM_CODE_CICD" => Ok(JobKind::CustomCodeCicd),
            "FLINK_SQL" => Ok(JobKind::FlinkSql),
            "OTHER" => Ok(JobKind::Other),
            other => Err(DomainError::UnknownJobKind(other.to_string())),
        }
    }
}

/// Launch State of a deployed job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LaunchState {
    Failed,
    Done,
    NeedLaunch,
    Launching,
    NeedRestart,
    NeedRollback,
    Revoked,
}

impl std::fmt::Display for LaunchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LaunchState::Failed => write!(f, "FAILED"),
            LaunchState::Done => write!(f, "DONE"),
            LaunchState::NeedLaunch => write!(f, "NEED_LAUNCH"),
            LaunchState::Launching => write!(f, "LAUNCHING"),
            LaunchState::NeedRestart => write!(f, "NEED_RESTART"),
            LaunchState::NeedRollback => write!(f, "NEED_ROLLBACK"),
            LaunchState::Revoked => write!(f, "REVOKED"),
        }
    }
}

impl FromStr for LaunchState {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FAILED" => Ok(LaunchState::Failed),
            "DONE" => Ok(LaunchState::Done),
            "NEED_LAUNCH" => Ok(LaunchState::NeedLaunch),
            "LAUNCHING" => Ok(LaunchState::Launching),
            "NEED_RESTART" => Ok(LaunchState::NeedRestart),
            "NEED_ROLLBACK" => Ok(LaunchState::NeedRollback),
            "REVOKED" => Ok(LaunchState::Revoked),
            other => Err(DomainError::UnknownLaunchState(other.to_string())),
        }
    }
}

/// Job Entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub name: String,
    pub kind: JobKind,

    /// Whether the job is currently running on the cluster
    pub running: bool,

    /// Effective artifact directory the runtime reads
    pub app_home: String,
    /// Build output directory (backup source for CI/CD custom code jobs)
    pub dist_home: String,

    pub launch_state: LaunchState,
    pub created_at: i64, // epoch ms
}

impl Job {
    /// Create a new stopped job
    ///
    /// # Arguments
    ///
    /// * `id` - Job ID (injected, not generated)
    /// * `created_at` - Creation timestamp in epoch ms (injected, not system time)
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: JobKind,
        app_home: impl Into<String>,
        dist_home: impl Into<String>,
        created_at: i64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            running: false,
            app_home: app_home.into(),
            dist_home: dist_home.into(),
            launch_state: LaunchState::Done,
            created_at,
        }
    }

    pub fn is_flink_sql(&self) -> bool {
        self.kind == JobKind::FlinkSql
    }

    pub fn is_custom_code_cicd(&self) -> bool {
        self.kind == JobKind::CustomCodeCicd
    }

    /// Directory a backup copies from
    pub fn backup_source(&self) -> &str {
        if self.is_custom_code_cicd() {
            &self.dist_home
        } else {
            &self.app_home
        }
    }
}
