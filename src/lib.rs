//! Tic-tac-toe engine with an optional LLM-controlled opponent.
//!
//! # Architecture
//!
//! - **Games**: board types, pure win/draw rules and the [`Engine`] state machine
//! - **Provider**: the [`MoveProvider`] trait, an LLM-backed implementation and
//!   an offline one
//! - **Session**: [`GameSession`] drives an engine against a provider
//! - **Console**: line-oriented terminal front end
//!
//! # Example
//!
//! ```no_run
//! use llm_tictactoe::{Engine, FirstEmptyProvider, GameMode, GameSession, Mark};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() {
//! let engine = Engine::new(GameMode::Provider, Mark::O);
//! let provider = Arc::new(FirstEmptyProvider::default());
//! let mut session = GameSession::new(engine, provider, Duration::from_millis(600));
//!
//! // X takes the center, then the provider answers.
//! let resolution = session.play_turn(4).await;
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod game_config;
mod games;
mod provider;
mod session;

// Public modules
pub mod console;
pub mod llm_client;

// Crate-level exports - Configuration
pub use game_config::{ConfigError, GameConfig, default_model_for};

// Crate-level exports - LLM client
pub use llm_client::{DEFAULT_REQUEST_TIMEOUT, LlmClient, LlmConfig, LlmError, LlmProvider};

// Crate-level exports - Move providers
pub use provider::{
    FirstEmptyProvider, LlmMoveProvider, MoveProvider, ProviderError, ProviderMove, parse_move,
};

// Crate-level exports - Session driver
pub use session::{DEFAULT_THINKING_DELAY, GameSession, ProviderResponse, fetch_provider_move};

// Crate-level exports - Game types (tic-tac-toe)
pub use games::tictactoe::{
    Board, BoardParseError, CELL_COUNT, Engine, FALLBACK_COMMENT, GameMode, Mark, Move,
    MoveError, MoveSource, Outcome, ProviderRequest, ProviderResolution, ReplayError,
    STARTING_MARK, Square, WinningLine, rules,
};
