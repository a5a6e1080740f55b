//! Tests for provider turns driven through the game session.

use llm_tictactoe::{
    Board, Engine, FALLBACK_COMMENT, FirstEmptyProvider, GameMode, GameSession, Mark,
    MoveProvider, MoveSource, Outcome, ProviderError, ProviderMove, ProviderRequest,
    ProviderResolution, ProviderResponse,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Answers with a fixed square and counts calls.
struct ScriptedProvider {
    index: usize,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    fn new(index: usize) -> Self {
        Self {
            index,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl MoveProvider for ScriptedProvider {
    async fn choose_move(&self, _board: &Board, _mark: Mark) -> Result<ProviderMove, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ProviderMove::new(self.index, "Scripted".to_string()))
    }

    fn name(&self) -> &str {
        "Scripted"
    }
}

/// Always fails.
struct BrokenProvider;

#[async_trait::async_trait]
impl MoveProvider for BrokenProvider {
    async fn choose_move(&self, _board: &Board, _mark: Mark) -> Result<ProviderMove, ProviderError> {
        Err(ProviderError::new("connection refused"))
    }

    fn name(&self) -> &str {
        "Broken"
    }
}

/// Sleeps before answering with the lowest empty square, tracking how many
/// calls overlap.
struct SlowProvider {
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    finished: AtomicUsize,
}

impl SlowProvider {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            finished: AtomicUsize::new(0),
        }
    }
}

/// Decrements the in-flight count when a call ends or is cancelled.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl MoveProvider for SlowProvider {
    async fn choose_move(&self, board: &Board, _mark: Mark) -> Result<ProviderMove, ProviderError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        tokio::time::sleep(self.delay).await;
        self.finished.fetch_add(1, Ordering::SeqCst);
        let index = board
            .first_empty()
            .ok_or_else(|| ProviderError::new("board is full"))?;
        Ok(ProviderMove::new(index, "Slow".to_string()))
    }

    fn name(&self) -> &str {
        "Slow"
    }
}

fn session(provider: Arc<dyn MoveProvider>) -> GameSession {
    GameSession::new(
        Engine::new(GameMode::Provider, Mark::O),
        provider,
        Duration::ZERO,
    )
}

#[tokio::test]
async fn test_provider_move_applied() {
    let mut session = session(Arc::new(ScriptedProvider::new(0)));

    let resolution = session.play_turn(4).await.expect("legal move");

    assert_eq!(
        resolution,
        Some(ProviderResolution::Applied {
            index: 0,
            outcome: Outcome::InProgress,
        })
    );
    let engine = session.engine();
    assert_eq!(engine.to_move(), Mark::X);
    assert_eq!(engine.comment(), Some("Scripted"));
    assert!(!engine.is_provider_computing());
    assert_eq!(engine.history()[1].source, MoveSource::Provider);
}

#[tokio::test]
async fn test_provider_failure_falls_back_to_lowest_empty_square() {
    // Provider plays X: a scripted opening at 0, then the human answers at 2.
    let mut session = GameSession::new(
        Engine::new(GameMode::Provider, Mark::X),
        Arc::new(ScriptedProvider::new(0)),
        Duration::ZERO,
    );
    session.request_provider_move().await.expect("provider turn");
    session.apply_local_move(2).expect("legal move");
    assert_eq!(session.engine().board(), &"X.O......".parse::<Board>().expect("valid board"));

    // Same game, but the provider is now unreachable.
    let engine = session.engine().snapshot();
    let mut session = GameSession::new(engine, Arc::new(BrokenProvider), Duration::ZERO);

    let resolution = session.request_provider_move().await;

    assert_eq!(
        resolution,
        Some(ProviderResolution::Fallback {
            index: Some(1),
            outcome: Outcome::InProgress,
        })
    );
    let engine = session.engine();
    assert_eq!(engine.comment(), Some(FALLBACK_COMMENT));
    assert_eq!(engine.to_move(), Mark::O);
    assert!(!engine.is_provider_computing());
    assert_eq!(engine.history()[2].source, MoveSource::Fallback);
}

#[tokio::test]
async fn test_failed_provider_reply_on_opening_move() {
    let mut session = session(Arc::new(BrokenProvider));
    session.apply_local_move(0).expect("legal move");

    let resolution = session.request_provider_move().await;

    assert_eq!(
        resolution,
        Some(ProviderResolution::Fallback {
            index: Some(1),
            outcome: Outcome::InProgress,
        })
    );
    assert_eq!(session.engine().to_move(), Mark::X);
    assert_eq!(session.request_provider_move().await, None);
}

#[tokio::test]
async fn test_no_provider_call_in_local_mode() {
    let provider = Arc::new(ScriptedProvider::new(0));
    let mut session = GameSession::new(
        Engine::new(GameMode::Local, Mark::O),
        provider.clone(),
        Duration::ZERO,
    );

    assert_eq!(session.play_turn(4).await, Ok(None));
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    assert_eq!(session.engine().to_move(), Mark::O);
}

#[tokio::test]
async fn test_no_provider_call_after_game_over() {
    let provider = Arc::new(FirstEmptyProvider::default());
    let mut session = session(provider);

    // X: 4, O: 0, X: 2, O: 1, X: 6 wins on the anti-diagonal.
    for index in [4, 2, 6] {
        if session.engine().outcome().is_terminal() {
            break;
        }
        session.play_turn(index).await.expect("legal move");
    }

    assert_eq!(session.engine().outcome().winner(), Some(Mark::X));
    assert_eq!(session.request_provider_move().await, None);
}

#[tokio::test]
async fn test_minimum_thinking_delay() {
    let mut session = GameSession::new(
        Engine::new(GameMode::Provider, Mark::O),
        Arc::new(FirstEmptyProvider::default()),
        Duration::from_millis(50),
    );
    session.apply_local_move(4).expect("legal move");

    let start = Instant::now();
    session.request_provider_move().await.expect("provider turn");
    assert!(start.elapsed() >= Duration::from_millis(50));
}

#[tokio::test]
async fn test_reset_cancels_outstanding_provider_call() {
    let mut session = session(Arc::new(ScriptedProvider::new(0)));
    let (tx, mut rx) = mpsc::unbounded_channel();

    session.apply_local_move(4).expect("legal move");
    assert!(session.spawn_provider_move(&tx));
    assert!(session.engine().is_provider_computing());
    // A second spawn while one is outstanding does nothing.
    assert!(!session.spawn_provider_move(&tx));

    session.reset();
    session.apply_local_move(8).expect("legal move");

    // The aborted call never answers.
    drop(tx);
    assert!(rx.recv().await.is_none());

    let engine = session.engine();
    assert_eq!(engine.board(), &"........X".parse::<Board>().expect("valid board"));
    assert_eq!(engine.to_move(), Mark::O);
}

#[tokio::test]
async fn test_late_answer_from_previous_game_is_discarded() {
    let mut session = session(Arc::new(ScriptedProvider::new(0)));
    session.apply_local_move(4).expect("legal move");
    let request = ProviderRequest {
        generation: session.engine().generation(),
        board: session.engine().board().clone(),
        mark: Mark::O,
    };

    session.reset();
    session.apply_local_move(8).expect("legal move");

    let late = ProviderResponse {
        request,
        reply: Ok(ProviderMove::new(0, "Late".to_string())),
    };
    assert_eq!(
        session.complete_provider_move(late),
        ProviderResolution::Discarded
    );
    assert_eq!(
        session.engine().board(),
        &"........X".parse::<Board>().expect("valid board")
    );
    assert_eq!(session.engine().comment(), None);
}

#[tokio::test]
async fn test_mode_toggle_cancels_outstanding_provider_call() {
    let mut session = session(Arc::new(ScriptedProvider::new(0)));
    let (tx, mut rx) = mpsc::unbounded_channel();

    session.apply_local_move(4).expect("legal move");
    assert!(session.spawn_provider_move(&tx));
    session.toggle_mode();

    drop(tx);
    assert!(rx.recv().await.is_none());
    assert!(!session.has_pending_provider_task());
    assert_eq!(session.engine().board(), &Board::new());
    assert_eq!(session.engine().mode(), GameMode::Local);
}

#[tokio::test]
async fn test_one_provider_call_at_a_time_across_reset() {
    let provider = Arc::new(SlowProvider::new(Duration::from_millis(200)));
    let mut session = session(provider.clone());
    let (tx, mut rx) = mpsc::unbounded_channel();

    session.apply_local_move(4).expect("legal move");
    assert!(session.spawn_provider_move(&tx));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(provider.in_flight.load(Ordering::SeqCst), 1);

    session.reset();
    session.apply_local_move(0).expect("legal move");
    assert!(session.spawn_provider_move(&tx));

    let response = rx.recv().await.expect("provider answered");
    assert_eq!(
        session.complete_provider_move(response),
        ProviderResolution::Applied {
            index: 1,
            outcome: Outcome::InProgress,
        }
    );
    assert_eq!(provider.max_in_flight.load(Ordering::SeqCst), 1);
    assert_eq!(provider.finished.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_dropping_session_cancels_provider_call() {
    let mut session = session(Arc::new(SlowProvider::new(Duration::from_millis(200))));
    let (tx, mut rx) = mpsc::unbounded_channel();

    session.apply_local_move(4).expect("legal move");
    assert!(session.spawn_provider_move(&tx));
    drop(session);
    drop(tx);

    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn test_spawned_provider_move_applies() {
    let mut session = session(Arc::new(FirstEmptyProvider::default()));
    let (tx, mut rx) = mpsc::unbounded_channel();

    session.apply_local_move(0).expect("legal move");
    assert!(session.spawn_provider_move(&tx));

    let response = rx.recv().await.expect("provider answered");
    assert_eq!(
        session.complete_provider_move(response),
        ProviderResolution::Applied {
            index: 1,
            outcome: Outcome::InProgress,
        }
    );
    assert_eq!(session.engine().to_move(), Mark::X);
}
