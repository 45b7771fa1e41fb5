use std::fmt;

use crate::model::MutationErrorKind;

/// Failure of a single marketplace mutation attempt.
///
/// Transient failures (network, timeout, rate limit) are retried by the
/// executor with backoff; permanent failures (item no longer editable,
/// price rejected, session lost) are recorded and never retried.
#[derive(Debug, Clone)]
pub enum MutationError {
    Transient(String),
    Permanent(String),
}

impl MutationError {
    pub fn kind(&self) -> MutationErrorKind {
        match self {
            Self::Transient(_) => MutationErrorKind::Transient,
            Self::Permanent(_) => MutationErrorKind::Permanent,
        }
    }
}

impl fmt::Display for MutationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transient(msg) => write!(f, "transient error: {msg}"),
            Self::Permanent(msg) => write!(f, "permanent error: {msg}"),
        }
    }
}

impl std::error::Error for MutationError {}
