//! First-class action types for tic-tac-toe.
//!
//! Moves are recorded as domain events so a finished game can be inspected
//! or replayed.

use super::Mark;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Where a move came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MoveSource {
    /// Played at the keyboard.
    Local,
    /// Chosen by the move provider.
    Provider,
    /// Picked by the engine after the provider failed.
    Fallback,
}

/// A mark placed at a board index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    /// The mark placed.
    pub mark: Mark,
    /// Board index (0-8).
    pub index: usize,
    /// Who chose the move.
    pub source: MoveSource,
}

impl Move {
    /// Creates a new move.
    #[instrument]
    pub fn new(mark: Mark, index: usize, source: MoveSource) -> Self {
        Self {
            mark,
            index,
            source,
        }
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {} ({})", self.mark, self.index, self.source)
    }
}

/// Reason a local move was refused. The engine state is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum MoveError {
    /// Index is not in 0..=8.
    #[display("Position {} is out of bounds (must be 0-8)", _0)]
    OutOfBounds(usize),

    /// The square at the index is already occupied.
    #[display("Square {} is already occupied", _0)]
    SquareOccupied(usize),

    /// The game is already over.
    #[display("Game is already over")]
    GameOver,

    /// The mark to move is controlled by the move provider.
    #[display("It's the provider's turn ({})", _0)]
    ProviderTurn(Mark),
}

impl std::error::Error for MoveError {}

/// Error replaying a move list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
#[display("Replay move {} rejected: {}", step, reason)]
pub struct ReplayError {
    /// Zero-based position in the move list.
    pub step: usize,
    /// Why the move was refused.
    pub reason: MoveError,
}

impl std::error::Error for ReplayError {}
