//! Provider backed by a large language model.

use super::{MoveProvider, ProviderError, ProviderMove};
use crate::games::tictactoe::{Board, Mark};
use crate::llm_client::LlmClient;
use tracing::{debug, info, instrument, warn};

const SYSTEM_PROMPT: &str = "You are an expert tic-tac-toe player. \
Answer with a single JSON object of the form {\"move\": <index>, \"reasoning\": <text>} and nothing else.";

/// Asks an LLM for a move and a short comment.
#[derive(Debug, Clone)]
pub struct LlmMoveProvider {
    name: String,
    client: LlmClient,
}

impl LlmMoveProvider {
    /// Creates a provider that queries `client`.
    #[instrument(skip(client), fields(model = %client.config().model()))]
    pub fn new(client: LlmClient) -> Self {
        let name = format!("{} ({})", client.config().provider(), client.config().model());
        info!(provider = %name, "Creating LLM move provider");
        Self { name, client }
    }

    /// Describes the board and the mark to play.
    pub fn user_prompt(board: &Board, mark: Mark) -> String {
        format!(
            "You are playing as {mark}. The board cells are numbered 0-8, left to right, \
             top to bottom:\n\
             0 1 2\n3 4 5\n6 7 8\n\n\
             Current board: [{cells}]\n\
             'X' and 'O' mark taken cells; numbers are empty cells.\n\n\
             Pick the best move: win if you can, otherwise block the opponent's \
             winning move, otherwise play the strongest square (center, then corners).\n\
             Reply with the 0-based index of an empty cell as \"move\" and a short, \
             witty one-line comment as \"reasoning\".",
            cells = board.prompt_string(),
        )
    }

    /// Schema for structured output.
    pub fn response_schema() -> serde_json::Value {
        serde_json::json!({
            "type": "OBJECT",
            "properties": {
                "move": {
                    "type": "INTEGER",
                    "description": "Index (0-8) of the empty cell to play."
                },
                "reasoning": {
                    "type": "STRING",
                    "description": "A short comment about the move."
                }
            },
            "required": ["move", "reasoning"]
        })
    }
}

#[async_trait::async_trait]
impl MoveProvider for LlmMoveProvider {
    #[instrument(skip(self, board), fields(provider = %self.name, board = %board.prompt_string()))]
    async fn choose_move(&self, board: &Board, mark: Mark) -> Result<ProviderMove, ProviderError> {
        let schema = Self::response_schema();
        let text = self
            .client
            .generate(SYSTEM_PROMPT, &Self::user_prompt(board, mark), Some(&schema))
            .await?;

        debug!(response = %text, "LLM answered");
        let reply = parse_move(&text)?;
        info!(index = reply.index, "LLM chose a move");
        Ok(reply)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Extracts a [`ProviderMove`] from model output.
///
/// Accepts bare JSON as well as JSON wrapped in code fences or prose: the
/// outermost `{...}` is parsed.
#[instrument(skip(text))]
pub fn parse_move(text: &str) -> Result<ProviderMove, ProviderError> {
    let start = text.find('{');
    let end = text.rfind('}');
    let json = match (start, end) {
        (Some(start), Some(end)) if end > start => &text[start..=end],
        _ => {
            warn!(response = %text, "No JSON object in LLM response");
            return Err(ProviderError::new("No JSON object in LLM response"));
        }
    };

    serde_json::from_str(json).map_err(|e| {
        warn!(error = %e, response = %text, "Malformed move in LLM response");
        ProviderError::new(format!("Malformed move: {}", e))
    })
}
