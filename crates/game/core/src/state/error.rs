//! Level construction errors.

use crate::error::{ErrorSeverity, GameError};
use crate::state::Position;

/// Errors raised while assembling a [`crate::Level`].
///
/// All of them are configuration errors: a level that fails to build must
/// abort startup rather than run with a half-populated grid.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LevelError {
    #[error("level grid must be non-empty (got {width}x{height})")]
    EmptyGrid { width: u32, height: u32 },

    #[error("position {position} is out of bounds (map size: {width}x{height})")]
    OutOfBounds {
        position: Position,
        width: u32,
        height: u32,
    },

    #[error("level did not provide a player spawn (kind=player)")]
    MissingSpawn,
}

impl GameError for LevelError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Fatal
    }

    fn error_code(&self) -> &'static str {
        match self {
            LevelError::EmptyGrid { .. } => "LEVEL_EMPTY_GRID",
            LevelError::OutOfBounds { .. } => "LEVEL_OUT_OF_BOUNDS",
            LevelError::MissingSpawn => "LEVEL_MISSING_SPAWN",
        }
    }
}
