//! Move providers: the external collaborators that pick a square for the
//! provider-controlled mark.

mod first_empty;
mod llm;

pub use first_empty::FirstEmptyProvider;
pub use llm::{LlmMoveProvider, parse_move};

use crate::games::tictactoe::{Board, Mark};
use crate::llm_client::LlmError;
use derive_more::{Display, Error};
use derive_new::new;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// A square chosen by a provider, with its commentary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct ProviderMove {
    /// Board index (0-8).
    #[serde(rename = "move")]
    pub index: usize,
    /// Short free-text comment shown to the player.
    pub reasoning: String,
}

/// Trait for anything that can choose a move for a mark.
#[async_trait::async_trait]
pub trait MoveProvider: Send + Sync {
    /// Chooses a square for `mark` on `board`.
    ///
    /// The engine re-validates the answer, so implementations may return
    /// any index; an error makes the engine fall back to the lowest empty
    /// square.
    async fn choose_move(&self, board: &Board, mark: Mark) -> Result<ProviderMove, ProviderError>;

    /// Returns the provider's display name.
    fn name(&self) -> &str;
}

/// The provider could not produce a move (network failure, malformed or
/// missing response).
#[derive(Debug, Clone, Display, Error)]
#[display("Provider unavailable: {} at {}:{}", message, file, line)]
pub struct ProviderError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ProviderError {
    /// Creates a new provider error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

impl From<LlmError> for ProviderError {
    #[track_caller]
    fn from(err: LlmError) -> Self {
        Self::new(err.message)
    }
}
