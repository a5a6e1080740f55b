//! Core domain types for tic-tac-toe.

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Number of cells on the board.
pub const CELL_COUNT: usize = 9;

/// A player's mark.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
)]
pub enum Mark {
    /// Mark X (always moves first).
    X,
    /// Mark O.
    O,
}

impl Mark {
    /// Returns the other mark.
    pub fn opponent(self) -> Self {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

/// A square on the tic-tac-toe board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Square {
    /// Empty square.
    #[default]
    Empty,
    /// Square occupied by a mark.
    Occupied(Mark),
}

impl Square {
    /// Returns the mark in this square, if any.
    pub fn mark(self) -> Option<Mark> {
        match self {
            Square::Empty => None,
            Square::Occupied(mark) => Some(mark),
        }
    }
}

/// 3x3 tic-tac-toe board.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Board {
    /// Squares in row-major order (0-8).
    squares: [Square; CELL_COUNT],
}

impl Board {
    /// Creates a new empty board.
    pub fn new() -> Self {
        Self {
            squares: [Square::Empty; CELL_COUNT],
        }
    }

    /// Gets the square at the given index (0-8).
    pub fn get(&self, index: usize) -> Option<Square> {
        self.squares.get(index).copied()
    }

    /// Occupies an empty square. Returns false if the index is out of range
    /// or the square is already taken.
    pub(crate) fn occupy(&mut self, index: usize, mark: Mark) -> bool {
        match self.squares.get_mut(index) {
            Some(square) if *square == Square::Empty => {
                *square = Square::Occupied(mark);
                true
            }
            _ => false,
        }
    }

    /// Checks if a square is empty. Out-of-range indices are never empty.
    pub fn is_empty(&self, index: usize) -> bool {
        matches!(self.get(index), Some(Square::Empty))
    }

    /// Returns all squares.
    pub fn squares(&self) -> &[Square; CELL_COUNT] {
        &self.squares
    }

    /// Checks if every square is occupied.
    pub fn is_full(&self) -> bool {
        self.squares.iter().all(|s| *s != Square::Empty)
    }

    /// Lowest-indexed empty square.
    pub fn first_empty(&self) -> Option<usize> {
        (0..CELL_COUNT).find(|&i| self.is_empty(i))
    }

    /// Number of occupied squares.
    pub fn occupied_count(&self) -> usize {
        self.squares.iter().filter(|s| **s != Square::Empty).count()
    }

    /// Formats the board as a human-readable grid. Empty squares show their
    /// 1-based number so a player can type it.
    pub fn display(&self) -> String {
        self.display_highlighted(None)
    }

    /// Like [`Board::display`], with the squares of `line` bracketed.
    pub fn display_highlighted(&self, line: Option<&WinningLine>) -> String {
        let mut result = String::new();
        for row in 0..3 {
            for col in 0..3 {
                let pos = row * 3 + col;
                let symbol = match self.squares[pos] {
                    Square::Empty => (pos + 1).to_string(),
                    Square::Occupied(mark) => mark.to_string(),
                };
                if line.is_some_and(|l| l.contains(pos)) {
                    result.push_str(&format!("[{}]", symbol));
                } else {
                    result.push_str(&format!(" {} ", symbol));
                }
                if col < 2 {
                    result.push('|');
                }
            }
            if row < 2 {
                result.push_str("\n---+---+---\n");
            }
        }
        result
    }

    /// Comma-separated row-major form: the mark for occupied squares and the
    /// 0-based index for empty ones, e.g. `X,1,O,3,4,5,6,7,8`.
    pub fn prompt_string(&self) -> String {
        self.squares
            .iter()
            .enumerate()
            .map(|(i, s)| match s {
                Square::Empty => i.to_string(),
                Square::Occupied(mark) => mark.to_string(),
            })
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Error parsing a board from text.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum BoardParseError {
    /// Wrong number of cells.
    #[display("Expected 9 cells, found {}", _0)]
    WrongLength(#[error(not(source))] usize),
    /// Unrecognised cell character.
    #[display("Invalid cell character {:?}", _0)]
    InvalidCell(#[error(not(source))] char),
}

impl FromStr for Board {
    type Err = BoardParseError;

    /// Parses nine cells: `X`/`O` (any case) or `.`, `_`, `-` for empty.
    /// Whitespace, commas and `|` are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cells = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != ',' && *c != '|')
            .map(|c| match c {
                'x' | 'X' => Ok(Square::Occupied(Mark::X)),
                'o' | 'O' => Ok(Square::Occupied(Mark::O)),
                '.' | '_' | '-' => Ok(Square::Empty),
                other => Err(BoardParseError::InvalidCell(other)),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let squares: [Square; CELL_COUNT] = cells
            .try_into()
            .map_err(|v: Vec<Square>| BoardParseError::WrongLength(v.len()))?;
        Ok(Self { squares })
    }
}

/// Three cells held by a single mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WinningLine {
    /// The mark occupying the line.
    pub mark: Mark,
    /// Board indices of the line, ascending.
    pub cells: [usize; 3],
}

impl WinningLine {
    /// Whether the index is part of this line.
    pub fn contains(&self, index: usize) -> bool {
        self.cells.contains(&index)
    }
}

/// Classification of a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Outcome {
    /// No line completed and empty squares remain.
    #[default]
    InProgress,
    /// A mark completed a line.
    Won(WinningLine),
    /// Board full with no line.
    Draw,
}

impl Outcome {
    /// True once the game has ended.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Outcome::InProgress)
    }

    /// The winning mark, if any.
    pub fn winner(&self) -> Option<Mark> {
        match self {
            Outcome::Won(line) => Some(line.mark),
            _ => None,
        }
    }

    /// The winning line, if any.
    pub fn winning_line(&self) -> Option<&WinningLine> {
        match self {
            Outcome::Won(line) => Some(line),
            _ => None,
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::InProgress => write!(f, "In progress"),
            Outcome::Won(line) => write!(
                f,
                "Player {} wins ({}, {}, {})",
                line.mark, line.cells[0], line.cells[1], line.cells[2]
            ),
            Outcome::Draw => write!(f, "Draw"),
        }
    }
}

/// Who controls the marks.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GameMode {
    /// Both marks are played locally.
    #[default]
    Local,
    /// One mark is played by the move provider.
    Provider,
}

impl GameMode {
    /// The other mode.
    pub fn toggled(self) -> Self {
        match self {
            GameMode::Local => GameMode::Provider,
            GameMode::Provider => GameMode::Local,
        }
    }
}
