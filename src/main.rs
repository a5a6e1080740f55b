//! llm_tictactoe - terminal tic-tac-toe with an optional LLM opponent.

#![warn(missing_docs)]

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use llm_tictactoe::{
    Board, Engine, FirstEmptyProvider, GameConfig, GameMode, GameSession, LlmClient,
    LlmMoveProvider, LlmProvider, MoveProvider, console, rules,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Command::Play {
            config,
            mode,
            provider,
            model,
            thinking_delay_ms,
            offline,
        } => {
            initialize_tracing();
            run_play(config, mode, provider, model, thinking_delay_ms, offline).await
        }
        Command::Evaluate { board } => run_evaluate(&board),
    }
}

/// Run an interactive game
#[instrument(skip_all, fields(config_path = %config_path.display()))]
async fn run_play(
    config_path: std::path::PathBuf,
    mode: Option<GameMode>,
    provider: Option<LlmProvider>,
    model: Option<String>,
    thinking_delay_ms: Option<u64>,
    offline: bool,
) -> Result<()> {
    let mut config = GameConfig::load_or_default(&config_path)?;
    if let Some(mode) = mode {
        config = config.with_mode(mode);
    }
    if let Some(provider) = provider {
        config = config.with_llm(provider, model);
    } else if let Some(model) = model {
        let current = *config.llm_provider();
        config = config.with_llm(current, Some(model));
    }
    if let Some(ms) = thinking_delay_ms {
        config = config.with_thinking_delay_ms(ms);
    }

    let provider = build_provider(&config, offline);
    info!(provider = %provider.name(), mode = %config.mode(), "Starting game");

    let engine = Engine::new(*config.mode(), *config.provider_mark());
    let session = GameSession::new(engine, provider, config.thinking_delay());
    console::run(session).await
}

/// Picks the LLM provider, or the offline one when requested or when no API
/// key is available.
#[instrument(skip(config))]
fn build_provider(config: &GameConfig, offline: bool) -> Arc<dyn MoveProvider> {
    if offline {
        info!("Using offline provider");
        return Arc::new(FirstEmptyProvider::default());
    }

    let client = config
        .create_llm_config()
        .map_err(anyhow::Error::from)
        .and_then(|llm_config| LlmClient::new(llm_config).map_err(anyhow::Error::from));
    match client {
        Ok(client) => Arc::new(LlmMoveProvider::new(client)),
        Err(e) => {
            warn!(error = %e, "No LLM available, using offline provider");
            Arc::new(FirstEmptyProvider::default())
        }
    }
}

/// Print the outcome of a board
fn run_evaluate(board: &str) -> Result<()> {
    let board: Board = board.parse()?;
    let outcome = rules::evaluate(&board);
    println!("{}\n", board.display_highlighted(outcome.winning_line()));
    println!("{}", outcome);
    Ok(())
}

fn initialize_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,llm_tictactoe=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Tracing initialized");
}
