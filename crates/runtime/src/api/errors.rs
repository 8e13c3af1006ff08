//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from worker coordination and runtime assembly so clients
//! can bubble them up with consistent context.
use thiserror::Error;
use tokio::sync::oneshot;

use tower_core::{ErrorSeverity, GameError};

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("game worker command channel closed")]
    CommandChannelClosed,

    #[error("game worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("game worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error("runtime requires a level before building")]
    MissingLevel,

    #[error("floor progression requires a floor source")]
    MissingFloorSource,
}

impl GameError for RuntimeError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            RuntimeError::MissingLevel | RuntimeError::MissingFloorSource => {
                ErrorSeverity::Validation
            }
            RuntimeError::CommandChannelClosed
            | RuntimeError::ReplyChannelClosed(_)
            | RuntimeError::WorkerJoin(_) => ErrorSeverity::Fatal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            RuntimeError::CommandChannelClosed => "RUNTIME_COMMAND_CHANNEL_CLOSED",
            RuntimeError::ReplyChannelClosed(_) => "RUNTIME_REPLY_CHANNEL_CLOSED",
            RuntimeError::WorkerJoin(_) => "RUNTIME_WORKER_JOIN",
            RuntimeError::MissingLevel => "RUNTIME_MISSING_LEVEL",
            RuntimeError::MissingFloorSource => "RUNTIME_MISSING_FLOOR_SOURCE",
        }
    }
}
