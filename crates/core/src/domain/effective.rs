// Effective pointers and the config/script versions they point at

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::domain::error::DomainError;
use crate::domain::JobId;

pub type ConfigId = String;
pub type ScriptId = String;

/// Which effective pointer of a job is addressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EffectiveKind {
    Config,
    FlinkSql,
}

impl std::fmt::Display for EffectiveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EffectiveKind::Config => write!(f, "CONFIG"),
            EffectiveKind::FlinkSql => write!(f, "FLINKSQL"),
        }
    }
}

impl FromStr for EffectiveKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CONFIG" => Ok(EffectiveKind::Config),
            "FLINKSQL" => Ok(EffectiveKind::FlinkSql),
            other => Err(DomainError::UnknownEffectiveKind(other.to_string())),
        }
    }
}

/// A versioned configuration row of a job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigRecord {
    pub id: ConfigId,
    pub job_id: JobId,
    pub version: i32,
}

/// A versioned SQL script row of a job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptRecord {
    pub id: ScriptId,
    pub job_id: JobId,
    pub version: i32,
}
