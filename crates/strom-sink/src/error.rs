use thiserror::Error;

/// The one designated recoverable delivery error.
///
/// A sender reports this for transport/backend problems the producer can
/// act on (retry, re-enqueue, drop). Every other failure inside a worker is
/// treated as fatal.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("backend service failed: {reason}")]
pub struct BackendFailure {
    reason: String,
}

impl BackendFailure {
    pub fn new(reason: impl Into<String>) -> BackendFailure {
        BackendFailure {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sender pool already started")]
    AlreadyStarted,

    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

pub type SinkResult<T> = Result<T, SinkError>;
