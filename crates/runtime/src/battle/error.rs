use thiserror::Error;

use tower_core::{ErrorSeverity, GameError};

/// Why a battle produced no result.
///
/// Every variant leaves the world untouched: the monster encounter turns it
/// into a blocked move.
#[derive(Debug, Error)]
pub enum BattleError {
    #[error("battle failed to launch: {0}")]
    LaunchFailed(String),

    #[error("battle timed out after {after_ms} ms")]
    TimedOut { after_ms: u64 },

    #[error("battle cancelled")]
    Cancelled,

    #[error("battle host channel closed")]
    ChannelClosed,
}

impl GameError for BattleError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Recoverable
    }

    fn error_code(&self) -> &'static str {
        match self {
            BattleError::LaunchFailed(_) => "BATTLE_LAUNCH_FAILED",
            BattleError::TimedOut { .. } => "BATTLE_TIMED_OUT",
            BattleError::Cancelled => "BATTLE_CANCELLED",
            BattleError::ChannelClosed => "BATTLE_CHANNEL_CLOSED",
        }
    }
}
