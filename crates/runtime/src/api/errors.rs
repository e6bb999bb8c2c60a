//! Unified error types surfaced by the runtime API.
//!
//! Wraps rule failures from the engines together with worker coordination
//! and configuration failures so clients can bubble them up with consistent
//! context.
use thiserror::Error;
use tokio::sync::oneshot;

use game_core::{EngineError, ErrorSeverity, GameError, SessionId};

pub use crate::config::ConfigError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("{0} is not registered")]
    SessionNotRegistered(SessionId),

    #[error("{0} is already registered")]
    SessionAlreadyRegistered(SessionId),

    #[error("session worker command channel closed")]
    CommandChannelClosed,

    #[error("session worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("session worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl RuntimeError {
    /// The rule failure behind this error, if it is one.
    pub fn engine(&self) -> Option<&EngineError> {
        match self {
            Self::Engine(error) => Some(error),
            _ => None,
        }
    }
}

impl GameError for RuntimeError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Engine(error) => error.severity(),
            Self::SessionNotRegistered(_) | Self::SessionAlreadyRegistered(_) => {
                ErrorSeverity::Validation
            }
            Self::CommandChannelClosed | Self::ReplyChannelClosed(_) | Self::WorkerJoin(_) => {
                ErrorSeverity::Internal
            }
            Self::Config(_) => ErrorSeverity::Fatal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Engine(error) => error.error_code(),
            Self::SessionNotRegistered(_) => "SESSION_NOT_REGISTERED",
            Self::SessionAlreadyRegistered(_) => "SESSION_ALREADY_REGISTERED",
            Self::CommandChannelClosed => "COMMAND_CHANNEL_CLOSED",
            Self::ReplyChannelClosed(_) => "REPLY_CHANNEL_CLOSED",
            Self::WorkerJoin(_) => "WORKER_JOIN",
            Self::Config(_) => "CONFIG",
        }
    }
}
