//! Offline provider that needs no network.

use super::{MoveProvider, ProviderError, ProviderMove};
use crate::games::tictactoe::{Board, Mark};
use tracing::debug;

/// Picks the first available square.
#[derive(Debug, Clone)]
pub struct FirstEmptyProvider {
    name: String,
}

impl FirstEmptyProvider {
    /// Creates a new offline provider.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for FirstEmptyProvider {
    fn default() -> Self {
        Self::new("Offline")
    }
}

#[async_trait::async_trait]
impl MoveProvider for FirstEmptyProvider {
    async fn choose_move(&self, board: &Board, mark: Mark) -> Result<ProviderMove, ProviderError> {
        debug!(provider = %self.name, %mark, "Choosing first empty square");

        let index = board
            .first_empty()
            .ok_or_else(|| ProviderError::new("No valid moves available"))?;

        Ok(ProviderMove::new(
            index,
            format!("Square {} looked lonely.", index + 1),
        ))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_picks_lowest_empty_square() {
        let board: Board = "X.O......".parse().expect("valid board");
        let reply = FirstEmptyProvider::default()
            .choose_move(&board, Mark::O)
            .await
            .expect("move available");
        assert_eq!(reply.index, 1);
    }

    #[tokio::test]
    async fn test_full_board_is_an_error() {
        let board: Board = "XOXOXOOXO".parse().expect("valid board");
        let result = FirstEmptyProvider::default().choose_move(&board, Mark::O).await;
        assert!(result.is_err());
    }
}
