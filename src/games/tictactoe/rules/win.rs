//! Win detection logic for tic-tac-toe.

use super::super::{Board, Square, WinningLine};
use tracing::instrument;

/// The eight winning lines: rows, then columns, then diagonals.
pub const LINES: [[usize; 3]; 8] = [
    // Rows
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    // Columns
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    // Diagonals
    [0, 4, 8],
    [2, 4, 6],
];

/// Returns the first line held entirely by one mark, scanning [`LINES`] in
/// order.
#[instrument(skip(board))]
pub fn check_winner(board: &Board) -> Option<WinningLine> {
    for cells in LINES {
        let [a, b, c] = cells;
        let sq = board.get(a);
        if sq != Some(Square::Empty) && sq == board.get(b) && sq == board.get(c) {
            return sq
                .and_then(Square::mark)
                .map(|mark| WinningLine { mark, cells });
        }
    }

    None
}
