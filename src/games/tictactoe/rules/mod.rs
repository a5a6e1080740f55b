//! Game rules for tic-tac-toe.
//!
//! Pure functions over a [`Board`]. The outcome of a game is never stored
//! independently of the board: [`evaluate`] recomputes it from the squares
//! alone.

pub mod draw;
pub mod win;

pub use draw::is_draw;
pub use win::{LINES, check_winner};

use super::{Board, Outcome};
use tracing::instrument;

/// Classifies a board: the first completed line wins, otherwise a full
/// board is a draw, otherwise the game is in progress.
#[instrument(skip(board), fields(board = %board.prompt_string()))]
pub fn evaluate(board: &Board) -> Outcome {
    if let Some(line) = check_winner(board) {
        return Outcome::Won(line);
    }
    if is_draw(board) {
        return Outcome::Draw;
    }
    Outcome::InProgress
}
