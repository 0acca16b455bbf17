//! Recoverable input errors
//!
//! None of these leave the engine in an inconsistent state; callers treat them
//! as "ignore this input".

use thiserror::Error;

use super::board::GamePhase;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("cell ({row}, {col}) is outside the grid")]
    OutOfBounds { row: i64, col: i64 },
    #[error("cell ({row}, {col}) cannot hold a larger value")]
    ValueOverflow { row: usize, col: usize },
    #[error("no moves remaining")]
    NoMovesRemaining,
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("game is not in progress ({0:?})")]
    NotPlaying(GamePhase),
}

impl GameError {
    pub(crate) fn out_of_bounds(row: impl TryInto<i64>, col: impl TryInto<i64>) -> Self {
        Self::OutOfBounds {
            row: row.try_into().unwrap_or(i64::MAX),
            col: col.try_into().unwrap_or(i64::MAX),
        }
    }
}
