//! Drives an [`Engine`] against a [`MoveProvider`].

use crate::games::tictactoe::{Engine, MoveError, Outcome, ProviderRequest, ProviderResolution};
use crate::provider::{MoveProvider, ProviderError, ProviderMove};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{debug, info, instrument};

/// Default minimum time a provider turn stays visible.
pub const DEFAULT_THINKING_DELAY: Duration = Duration::from_millis(600);

/// A provider answer together with the request it answers.
#[derive(Debug)]
pub struct ProviderResponse {
    /// The request the provider was given.
    pub request: ProviderRequest,
    /// The provider's answer.
    pub reply: Result<ProviderMove, ProviderError>,
}

/// Calls `provider` for `request`, taking at least `delay`.
///
/// The delay runs concurrently with the call, so a slow provider is not
/// slowed further.
#[instrument(skip(provider, request), fields(provider = %provider.name(), generation = request.generation))]
pub async fn fetch_provider_move(
    provider: &dyn MoveProvider,
    request: &ProviderRequest,
    delay: Duration,
) -> Result<ProviderMove, ProviderError> {
    let (_, reply) = tokio::join!(
        tokio::time::sleep(delay),
        provider.choose_move(&request.board, request.mark)
    );
    reply
}

/// A game in progress plus the provider that plays one side of it.
///
/// At most one background provider call is alive at a time: starting a new
/// game aborts the call still running for the old one.
pub struct GameSession {
    engine: Engine,
    provider: Arc<dyn MoveProvider>,
    thinking_delay: Duration,
    provider_task: Option<AbortHandle>,
}

impl GameSession {
    /// Creates a new session.
    #[instrument(skip(engine, provider), fields(provider = %provider.name(), mode = %engine.mode()))]
    pub fn new(engine: Engine, provider: Arc<dyn MoveProvider>, thinking_delay: Duration) -> Self {
        info!("Creating game session");
        Self {
            engine,
            provider,
            thinking_delay,
            provider_task: None,
        }
    }

    /// Returns the engine.
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Returns the provider.
    pub fn provider(&self) -> &Arc<dyn MoveProvider> {
        &self.provider
    }

    /// Plays a square for the local player.
    pub fn apply_local_move(&mut self, index: usize) -> Result<Outcome, MoveError> {
        self.engine.apply_local_move(index)
    }

    /// Starts a new game in the same mode.
    pub fn reset(&mut self) {
        self.abort_provider_task();
        self.engine.reset();
    }

    /// Starts a new game in the other mode.
    pub fn toggle_mode(&mut self) {
        self.abort_provider_task();
        self.engine.toggle_mode();
    }

    /// Whether a background provider call is still running.
    pub fn has_pending_provider_task(&self) -> bool {
        self.provider_task
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    fn abort_provider_task(&mut self) {
        if let Some(task) = self.provider_task.take() {
            if !task.is_finished() {
                debug!("Aborting provider call for the previous game");
            }
            task.abort();
        }
    }

    /// Runs one provider turn to completion, if it is the provider's turn.
    #[instrument(skip(self), fields(generation = self.engine.generation()))]
    pub async fn request_provider_move(&mut self) -> Option<ProviderResolution> {
        let request = self.engine.begin_provider_move()?;
        let reply = fetch_provider_move(self.provider.as_ref(), &request, self.thinking_delay).await;
        let resolution = self.engine.complete_provider_move(&request, reply);
        debug!(?resolution, "Provider turn finished");
        Some(resolution)
    }

    /// Plays a local move, then lets the provider answer if it is its turn.
    #[instrument(skip(self))]
    pub async fn play_turn(
        &mut self,
        index: usize,
    ) -> Result<Option<ProviderResolution>, MoveError> {
        self.apply_local_move(index)?;
        Ok(self.request_provider_move().await)
    }

    /// Starts a provider turn in the background.
    ///
    /// The answer is delivered on `tx` and must be handed back through
    /// [`GameSession::complete_provider_move`]. Returns false when no
    /// provider turn was started.
    #[instrument(skip(self, tx), fields(generation = self.engine.generation()))]
    pub fn spawn_provider_move(&mut self, tx: &mpsc::UnboundedSender<ProviderResponse>) -> bool {
        let Some(request) = self.engine.begin_provider_move() else {
            return false;
        };

        self.abort_provider_task();
        let provider = Arc::clone(&self.provider);
        let delay = self.thinking_delay;
        let tx = tx.clone();
        let task = tokio::spawn(async move {
            let reply = fetch_provider_move(provider.as_ref(), &request, delay).await;
            if tx.send(ProviderResponse { request, reply }).is_err() {
                debug!("Session closed before provider answered");
            }
        });
        self.provider_task = Some(task.abort_handle());
        true
    }

    /// Applies an answer produced by [`GameSession::spawn_provider_move`].
    pub fn complete_provider_move(&mut self, response: ProviderResponse) -> ProviderResolution {
        self.engine
            .complete_provider_move(&response.request, response.reply)
    }
}

impl std::fmt::Debug for GameSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameSession")
            .field("engine", &self.engine)
            .field("provider", &self.provider.name())
            .field("thinking_delay", &self.thinking_delay)
            .field("provider_task", &self.has_pending_provider_task())
            .finish()
    }
}

impl Drop for GameSession {
    fn drop(&mut self) {
        self.abort_provider_task();
    }
}
