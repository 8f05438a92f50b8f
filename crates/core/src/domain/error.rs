// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid rollback state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Unknown job kind: {0}")]
    UnknownJobKind(String),

    #[error("Unknown launch state: {0}")]
    UnknownLaunchState(String),

    #[error("Unknown effective kind: {0}")]
    UnknownEffectiveKind(String),

    #[error("Unknown rollback status: {0}")]
    UnknownRollbackStatus(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
