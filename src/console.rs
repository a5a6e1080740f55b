//! Line-oriented terminal front end.

use crate::games::tictactoe::{Engine, GameMode};
use crate::session::{GameSession, ProviderResponse};
use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument};

const HELP: &str = "Commands: 1-9 place a mark, r reset, m switch mode, h help, q quit";

/// A parsed line of input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// Place a mark at a board index (0-8).
    Place(usize),
    /// Start a new game.
    Reset,
    /// Switch between local and provider mode.
    ToggleMode,
    /// Show the command list.
    Help,
    /// Leave the game.
    Quit,
    /// Blank line.
    Nothing,
    /// Anything else.
    Unknown,
}

impl ConsoleCommand {
    /// Parses a line. Squares are numbered 1-9 as shown on the board.
    pub fn parse(line: &str) -> Self {
        let line = line.trim().to_lowercase();
        match line.as_str() {
            "" => ConsoleCommand::Nothing,
            "r" | "reset" => ConsoleCommand::Reset,
            "m" | "mode" => ConsoleCommand::ToggleMode,
            "h" | "help" | "?" => ConsoleCommand::Help,
            "q" | "quit" | "exit" => ConsoleCommand::Quit,
            other => match other.parse::<usize>() {
                Ok(n @ 1..=9) => ConsoleCommand::Place(n - 1),
                _ => ConsoleCommand::Unknown,
            },
        }
    }
}

/// Something the console loop reacts to.
#[derive(Debug)]
pub enum ConsoleEvent {
    /// A line typed by the player.
    Command(ConsoleCommand),
    /// An answer from a background provider call.
    Provider(ProviderResponse),
}

/// Renders the board, status, provider comment and mode. The squares of a
/// winning line are bracketed.
pub fn render(engine: &Engine) -> String {
    let mut out = String::new();
    out.push('\n');
    out.push_str(&engine.board().display_highlighted(engine.outcome().winning_line()));
    out.push_str("\n\n");
    out.push_str(&engine.status_text());
    out.push('\n');

    if let Some(comment) = engine.comment() {
        out.push_str(&format!("Provider says: \"{}\"\n", comment));
    }

    match engine.mode() {
        GameMode::Local => out.push_str("Mode: local, player X starts\n"),
        GameMode::Provider => out.push_str(&format!(
            "Mode: vs provider, you are player {}\n",
            engine.provider_mark().opponent()
        )),
    }
    out
}

/// Applies one event to the session and returns the text to show, or `None`
/// when the player quit.
#[instrument(skip(session))]
pub fn handle_event(session: &mut GameSession, event: ConsoleEvent) -> Option<String> {
    match event {
        ConsoleEvent::Command(ConsoleCommand::Quit) => return None,
        ConsoleEvent::Command(ConsoleCommand::Place(index)) => {
            if let Err(e) = session.apply_local_move(index) {
                debug!(error = %e, index, "Move ignored");
            }
        }
        ConsoleEvent::Command(ConsoleCommand::Reset) => session.reset(),
        ConsoleEvent::Command(ConsoleCommand::ToggleMode) => session.toggle_mode(),
        ConsoleEvent::Command(ConsoleCommand::Help | ConsoleCommand::Unknown) => {
            return Some(format!("{}\n{}", HELP, render(session.engine())));
        }
        ConsoleEvent::Command(ConsoleCommand::Nothing) => {}
        ConsoleEvent::Provider(response) => {
            let resolution = session.complete_provider_move(response);
            debug!(?resolution, "Provider answer handled");
        }
    }
    Some(render(session.engine()))
}

/// Starts a background provider call if it is the provider's turn and
/// returns the "thinking" view to show while it runs.
pub fn start_provider_turn(
    session: &mut GameSession,
    tx: &mpsc::UnboundedSender<ProviderResponse>,
) -> Option<String> {
    session
        .spawn_provider_move(tx)
        .then(|| render(session.engine()))
}

/// Runs the interactive loop until the player quits or input ends.
#[instrument(skip(session))]
pub async fn run(mut session: GameSession) -> Result<()> {
    info!("Starting console game");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let (tx, mut rx) = mpsc::unbounded_channel::<ProviderResponse>();

    write(&mut stdout, HELP).await?;
    write(&mut stdout, &render(session.engine())).await?;

    loop {
        if let Some(view) = start_provider_turn(&mut session, &tx) {
            write(&mut stdout, &view).await?;
        }

        let event = tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("Input closed");
                    break;
                };
                ConsoleEvent::Command(ConsoleCommand::parse(&line))
            }
            Some(response) = rx.recv() => ConsoleEvent::Provider(response),
        };

        match handle_event(&mut session, event) {
            Some(view) => write(&mut stdout, &view).await?,
            None => break,
        }
    }

    info!("Console game finished");
    Ok(())
}

async fn write(stdout: &mut tokio::io::Stdout, text: &str) -> Result<()> {
    stdout.write_all(text.as_bytes()).await?;
    stdout.write_all(b"\n").await?;
    stdout.flush().await?;
    Ok(())
}
