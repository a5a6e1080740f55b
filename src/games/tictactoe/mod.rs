//! Tic-tac-toe: board types, rules and the game engine.

mod action;
mod engine;
pub mod rules;
mod types;

pub use action::{Move, MoveError, MoveSource, ReplayError};
pub use engine::{
    Engine, FALLBACK_COMMENT, ProviderRequest, ProviderResolution, STARTING_MARK,
};
pub use types::{
    Board, BoardParseError, CELL_COUNT, GameMode, Mark, Outcome, Square, WinningLine,
};
