use thiserror::Error;

use crate::models::Verdict;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller bug: the operation was invoked in a state it does not accept.
    Precondition,
    /// Business rule said no; the operator can fix it and retry.
    Rejected,
    Persistence,
    Evidence,
    Navigation,
    Detached,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("No session is bound")]
    NoSession,

    #[error("No current step to record against")]
    NoCurrentStep,

    #[error("Step index {index} is out of range (0..{len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Verdict {0} cannot be recorded on a step")]
    VerdictNotRecordable(Verdict),

    #[error("Session is already completed")]
    SessionCompleted,

    #[error("Cannot complete: {remaining} step(s) remain")]
    UnresolvedSteps { remaining: usize },

    #[error("Cannot complete: session has no steps")]
    EmptySession,

    #[error("Save failed: {0}")]
    Persistence(#[source] anyhow::Error),

    #[error("Evidence capture failed: {0}")]
    Evidence(#[source] anyhow::Error),

    #[error("Invalid jump target: {0}")]
    InvalidJumpTarget(String),

    #[error("Session controller is detached")]
    Detached,
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::NoSession
            | EngineError::NoCurrentStep
            | EngineError::IndexOutOfRange { .. }
            | EngineError::VerdictNotRecordable(_)
            | EngineError::SessionCompleted => ErrorKind::Precondition,
            EngineError::UnresolvedSteps { .. } | EngineError::EmptySession => {
                ErrorKind::Rejected
            }
            EngineError::Persistence(_) => ErrorKind::Persistence,
            EngineError::Evidence(_) => ErrorKind::Evidence,
            EngineError::InvalidJumpTarget(_) => ErrorKind::Navigation,
            EngineError::Detached => ErrorKind::Detached,
        }
    }
}
