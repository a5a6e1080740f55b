//! Game engine for tic-tac-toe.
//!
//! [`Engine`] is a plain, serializable state object. Every change goes
//! through one of its operations: [`Engine::apply_local_move`],
//! [`Engine::begin_provider_move`] / [`Engine::complete_provider_move`],
//! [`Engine::reset`] and [`Engine::toggle_mode`]. A provider turn is split
//! in two so the asynchronous call can run without borrowing the engine;
//! see [`crate::GameSession`] for the driver.

use super::action::{Move, MoveError, MoveSource, ReplayError};
use super::rules;
use super::{Board, CELL_COUNT, GameMode, Mark, Outcome};
use crate::provider::{ProviderError, ProviderMove};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// Comment stored when the provider could not produce a move.
pub const FALLBACK_COMMENT: &str =
    "I'm having a bit of trouble thinking, so I picked the first open spot.";

/// Mark that opens every game.
pub const STARTING_MARK: Mark = Mark::X;

/// Ticket for one outstanding provider call.
///
/// Carries the board and generation the call was issued against so a late
/// answer can be recognised and dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// Engine generation at the time of the request.
    pub generation: u64,
    /// Board the provider is asked about.
    pub board: Board,
    /// Mark the provider plays.
    pub mark: Mark,
}

/// What the engine did with a provider answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderResolution {
    /// The provider's square was played.
    Applied {
        /// Square played.
        index: usize,
        /// Outcome after the move.
        outcome: Outcome,
    },
    /// The provider failed or picked an unavailable square; the lowest empty
    /// square was played instead.
    Fallback {
        /// Square played, if any was free.
        index: Option<usize>,
        /// Outcome after the move.
        outcome: Outcome,
    },
    /// The answer belonged to a game that no longer exists.
    Discarded,
}

/// Tic-tac-toe game engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engine {
    board: Board,
    to_move: Mark,
    outcome: Outcome,
    mode: GameMode,
    provider_mark: Mark,
    provider_computing: bool,
    comment: Option<String>,
    history: Vec<Move>,
    generation: u64,
}

impl Engine {
    /// Creates a new game. `provider_mark` is the mark the move provider
    /// plays whenever `mode` is [`GameMode::Provider`].
    #[instrument]
    pub fn new(mode: GameMode, provider_mark: Mark) -> Self {
        Self {
            board: Board::new(),
            to_move: STARTING_MARK,
            outcome: Outcome::InProgress,
            mode,
            provider_mark,
            provider_computing: false,
            comment: None,
            history: Vec::new(),
            generation: 0,
        }
    }

    /// Returns the board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Returns the mark to move. Frozen once the game is over.
    pub fn to_move(&self) -> Mark {
        self.to_move
    }

    /// Returns the cached outcome.
    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// Returns the game mode.
    pub fn mode(&self) -> GameMode {
        self.mode
    }

    /// Returns the mark played by the move provider in provider mode.
    pub fn provider_mark(&self) -> Mark {
        self.provider_mark
    }

    /// True while a provider call is outstanding.
    pub fn is_provider_computing(&self) -> bool {
        self.provider_computing
    }

    /// Most recent provider comment.
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Moves applied since the last reset.
    pub fn history(&self) -> &[Move] {
        &self.history
    }

    /// Bumped on every reset; provider answers from older generations are
    /// discarded.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Immutable copy of the current state.
    pub fn snapshot(&self) -> Self {
        self.clone()
    }

    /// Whether the mark to move is controlled by the provider.
    pub fn is_provider_turn(&self) -> bool {
        self.mode == GameMode::Provider
            && self.to_move == self.provider_mark
            && !self.outcome.is_terminal()
    }

    /// Whether a provider call should be issued now.
    pub fn needs_provider_move(&self) -> bool {
        self.is_provider_turn() && !self.provider_computing
    }

    /// Plays the current mark at `index` on behalf of a local player.
    ///
    /// On error the engine is unchanged.
    #[instrument(skip(self), fields(to_move = %self.to_move, mode = %self.mode))]
    pub fn apply_local_move(&mut self, index: usize) -> Result<Outcome, MoveError> {
        if self.outcome.is_terminal() {
            return Err(MoveError::GameOver);
        }
        if index >= CELL_COUNT {
            return Err(MoveError::OutOfBounds(index));
        }
        if self.is_provider_turn() {
            return Err(MoveError::ProviderTurn(self.to_move));
        }
        if !self.board.is_empty(index) {
            return Err(MoveError::SquareOccupied(index));
        }

        Ok(self.place(index, MoveSource::Local))
    }

    /// Marks the provider as computing and hands out the request to send.
    ///
    /// Returns `None` unless it is the provider's turn and no call is
    /// already outstanding.
    #[instrument(skip(self), fields(generation = self.generation))]
    pub fn begin_provider_move(&mut self) -> Option<ProviderRequest> {
        if !self.needs_provider_move() {
            return None;
        }

        self.provider_computing = true;
        debug!(mark = %self.to_move, "Provider turn started");
        Some(ProviderRequest {
            generation: self.generation,
            board: self.board.clone(),
            mark: self.to_move,
        })
    }

    /// Applies the provider's answer to `request`.
    ///
    /// A valid square is played as-is. A failure, or a square that is not
    /// free, falls back to the lowest empty square so the turn always
    /// passes back. Answers to a stale request are dropped.
    #[instrument(skip(self, request, reply), fields(generation = request.generation, mark = %request.mark))]
    pub fn complete_provider_move(
        &mut self,
        request: &ProviderRequest,
        reply: Result<ProviderMove, ProviderError>,
    ) -> ProviderResolution {
        if request.generation != self.generation {
            info!(current = self.generation, "Discarding provider answer from an earlier game");
            return ProviderResolution::Discarded;
        }

        self.provider_computing = false;

        if !self.is_provider_turn() || self.to_move != request.mark || self.board != request.board {
            warn!("Discarding provider answer for a board that has since changed");
            return ProviderResolution::Discarded;
        }

        match reply {
            Ok(reply) => {
                self.comment = Some(reply.reasoning);
                if self.board.is_empty(reply.index) {
                    let outcome = self.place(reply.index, MoveSource::Provider);
                    ProviderResolution::Applied {
                        index: reply.index,
                        outcome,
                    }
                } else {
                    warn!(index = reply.index, "Provider chose an unavailable square");
                    self.fallback()
                }
            }
            Err(e) => {
                warn!(error = %e, "Provider unavailable, using fallback move");
                self.comment = Some(FALLBACK_COMMENT.to_string());
                self.fallback()
            }
        }
    }

    /// Clears the board and starts a new game in the same mode.
    #[instrument(skip(self), fields(generation = self.generation))]
    pub fn reset(&mut self) {
        info!("Resetting game");
        self.board = Board::new();
        self.to_move = STARTING_MARK;
        self.outcome = Outcome::InProgress;
        self.provider_computing = false;
        self.comment = None;
        self.history.clear();
        self.generation = self.generation.wrapping_add(1);
    }

    /// Resets, then switches between local and provider mode.
    #[instrument(skip(self), fields(mode = %self.mode))]
    pub fn toggle_mode(&mut self) {
        self.reset();
        self.mode = self.mode.toggled();
        info!(mode = %self.mode, "Game mode switched");
    }

    /// Rebuilds a local game by playing `indices` in order.
    #[instrument]
    pub fn replay(indices: &[usize]) -> Result<Self, ReplayError> {
        let mut engine = Self::new(GameMode::Local, STARTING_MARK.opponent());
        for (step, &index) in indices.iter().enumerate() {
            engine
                .apply_local_move(index)
                .map_err(|reason| ReplayError { step, reason })?;
        }
        Ok(engine)
    }

    /// One-line description of the game state.
    pub fn status_text(&self) -> String {
        match self.outcome {
            Outcome::Won(line) => format!("Player {} wins!", line.mark),
            Outcome::Draw => "It's a draw!".to_string(),
            Outcome::InProgress if self.provider_computing => {
                format!("Provider ({}) is thinking...", self.to_move)
            }
            Outcome::InProgress if self.is_provider_turn() => {
                format!("Provider ({}) to move", self.to_move)
            }
            Outcome::InProgress => format!("Player {}'s turn", self.to_move),
        }
    }

    /// Plays the lowest empty square for the mark to move.
    fn fallback(&mut self) -> ProviderResolution {
        match self.board.first_empty() {
            Some(index) => {
                let outcome = self.place(index, MoveSource::Fallback);
                ProviderResolution::Fallback {
                    index: Some(index),
                    outcome,
                }
            }
            None => {
                // Unreachable while the game is in progress; hand the turn back anyway.
                self.to_move = self.to_move.opponent();
                ProviderResolution::Fallback {
                    index: None,
                    outcome: self.outcome,
                }
            }
        }
    }

    /// Places the current mark on an empty square and advances the turn.
    fn place(&mut self, index: usize, source: MoveSource) -> Outcome {
        let mark = self.to_move;
        let placed = self.board.occupy(index, mark);
        debug_assert!(placed, "place() requires an empty square");

        self.history.push(Move::new(mark, index, source));
        self.outcome = rules::evaluate(&self.board);
        if !self.outcome.is_terminal() {
            self.to_move = mark.opponent();
        }

        debug!(%mark, index, %source, outcome = %self.outcome, "Move applied");
        self.outcome
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(GameMode::Local, STARTING_MARK.opponent())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider_engine() -> Engine {
        Engine::new(GameMode::Provider, Mark::O)
    }

    #[test]
    fn test_turn_flips_after_move() {
        let mut engine = Engine::default();
        assert_eq!(engine.to_move(), Mark::X);
        assert_eq!(engine.apply_local_move(4), Ok(Outcome::InProgress));
        assert_eq!(engine.to_move(), Mark::O);
    }

    #[test]
    fn test_rejections_leave_state_untouched() {
        let mut engine = Engine::default();
        engine.apply_local_move(0).expect("legal move");
        let before = engine.snapshot();

        assert_eq!(engine.apply_local_move(0), Err(MoveError::SquareOccupied(0)));
        assert_eq!(engine.apply_local_move(9), Err(MoveError::OutOfBounds(9)));
        assert_eq!(engine, before);
    }

    #[test]
    fn test_provider_turn_rejects_local_move() {
        let mut engine = provider_engine();
        engine.apply_local_move(4).expect("X moves");
        assert!(engine.needs_provider_move());
        assert_eq!(engine.apply_local_move(0), Err(MoveError::ProviderTurn(Mark::O)));
    }

    #[test]
    fn test_begin_provider_move_is_single_shot() {
        let mut engine = provider_engine();
        engine.apply_local_move(4).expect("X moves");

        let request = engine.begin_provider_move().expect("provider turn");
        assert!(engine.is_provider_computing());
        assert_eq!(request.mark, Mark::O);
        assert_eq!(engine.begin_provider_move(), None);
    }

    #[test]
    fn test_begin_provider_move_outside_provider_turn() {
        let mut engine = provider_engine();
        assert_eq!(engine.begin_provider_move(), None);
        let mut local = Engine::default();
        local.apply_local_move(4).expect("X moves");
        assert_eq!(local.begin_provider_move(), None);
    }

    #[test]
    fn test_invalid_provider_square_keeps_comment_and_falls_back() {
        let mut engine = provider_engine();
        engine.apply_local_move(0).expect("X moves");
        let request = engine.begin_provider_move().expect("provider turn");

        let resolution = engine
            .complete_provider_move(&request, Ok(ProviderMove::new(0, "Mine now".to_string())));

        assert_eq!(
            resolution,
            ProviderResolution::Fallback {
                index: Some(1),
                outcome: Outcome::InProgress,
            }
        );
        assert_eq!(engine.comment(), Some("Mine now"));
        assert_eq!(engine.to_move(), Mark::X);
        assert!(!engine.is_provider_computing());
    }

    #[test]
    fn test_replay_rebuilds_history() {
        let engine = Engine::replay(&[4, 0, 8, 2, 1]).expect("legal replay");
        assert_eq!(engine.history().len(), 5);
        assert_eq!(engine.to_move(), Mark::O);
        assert!(engine.history().iter().all(|m| m.source == MoveSource::Local));
    }

    #[test]
    fn test_replay_reports_failing_step() {
        let err = Engine::replay(&[4, 4]).expect_err("occupied square");
        assert_eq!(err.step, 1);
        assert_eq!(err.reason, MoveError::SquareOccupied(4));
    }

    #[test]
    fn test_status_text() {
        let mut engine = provider_engine();
        assert_eq!(engine.status_text(), "Player X's turn");
        engine.apply_local_move(4).expect("X moves");
        assert_eq!(engine.status_text(), "Provider (O) to move");
        engine.begin_provider_move();
        assert_eq!(engine.status_text(), "Provider (O) is thinking...");
    }

    #[test]
    fn test_engine_serializes() {
        let engine = Engine::replay(&[4, 0]).expect("legal replay");
        let json = serde_json::to_string(&engine).expect("serialize");
        let restored: Engine = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(restored, engine);
    }
}
