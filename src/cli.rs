//! Command-line interface for llm_tictactoe.

use clap::{Parser, Subcommand};
use llm_tictactoe::{GameMode, LlmProvider};

/// Tic-tac-toe against a friend or a language model
#[derive(Parser, Debug)]
#[command(name = "llm_tictactoe")]
#[command(about = "Tic-tac-toe with an optional LLM opponent", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play in the terminal
    Play {
        /// Path to the game config
        #[arg(long, default_value = "tictactoe.toml")]
        config: std::path::PathBuf,

        /// Starting mode (overrides config)
        #[arg(long, value_enum)]
        mode: Option<GameMode>,

        /// LLM provider (overrides config)
        #[arg(long, value_enum)]
        provider: Option<LlmProvider>,

        /// LLM model (overrides config)
        #[arg(long)]
        model: Option<String>,

        /// Minimum provider delay in milliseconds (overrides config)
        #[arg(long)]
        thinking_delay_ms: Option<u64>,

        /// Use the offline first-empty-square provider instead of an LLM
        #[arg(long)]
        offline: bool,
    },

    /// Classify a board, e.g. `XXX......` or `X,O,.,.,X,.,.,.,X`
    Evaluate {
        /// Nine cells: X, O, or . _ - for empty
        board: String,
    },
}
