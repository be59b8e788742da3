//! Local match driver for play against the computer opponent.
//!
//! Sits between the presentation layer and the engine: move intents
//! come in through [`LocalMatch::submit_move`], authoritative state
//! goes out as [`MatchEvent`]s. The computer's reply is scheduled as a
//! deferred task after an artificial thinking delay and is aborted if
//! the match ends or resets before the delay elapses; cancellation
//! never affects rule evaluation itself.

use crate::ai::{self, Difficulty};
use crate::game::{BoardSize, Game, MatchState, MoveError, NestedGame, Outcome, Variant};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Default artificial thinking delay before the computer replies.
pub const DEFAULT_THINKING_DELAY: Duration = Duration::from_millis(600);

/// Authoritative state snapshot carried by [`MatchEvent`]s.
#[derive(Debug, Clone)]
pub enum MatchSnapshot {
    /// A classic or eviction match.
    Flat(MatchState),
    /// A nested match.
    Nested(NestedGame),
}

/// State-change events emitted to the presentation layer.
#[derive(Debug, Clone)]
pub enum MatchEvent {
    /// Authoritative state after an accepted move or a reset.
    StateChanged(MatchSnapshot),
    /// The match reached a terminal standing.
    Terminal(Outcome),
}

/// Errors from scheduling a computer reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AiRequestError {
    /// The match has already reached a terminal standing.
    MatchOver,
    /// The search is defined for flat boards only.
    NestedUnsupported,
}

impl std::fmt::Display for AiRequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AiRequestError::MatchOver => write!(f, "Match is already over"),
            AiRequestError::NestedUnsupported => {
                write!(f, "The computer opponent plays flat boards only")
            }
        }
    }
}

impl std::error::Error for AiRequestError {}

#[derive(Debug)]
enum ActiveGame {
    Flat(Game),
    Nested(NestedGame),
}

impl ActiveGame {
    fn new(variant: Variant, size: BoardSize) -> Self {
        match variant {
            Variant::Classic => ActiveGame::Flat(Game::classic(size)),
            Variant::Eviction => ActiveGame::Flat(Game::eviction(size)),
            Variant::Nested => ActiveGame::Nested(NestedGame::new()),
        }
    }

    fn snapshot(&self) -> MatchSnapshot {
        match self {
            ActiveGame::Flat(game) => MatchSnapshot::Flat(game.state().clone()),
            ActiveGame::Nested(game) => MatchSnapshot::Nested(game.clone()),
        }
    }

    fn outcome(&self) -> Outcome {
        match self {
            ActiveGame::Flat(game) => game.state().outcome().clone(),
            ActiveGame::Nested(game) => game.outcome().clone(),
        }
    }
}

#[derive(Debug)]
struct Inner {
    game: ActiveGame,
    ai_task: Option<JoinHandle<()>>,
}

/// Drives a single local match against the computer opponent.
#[derive(Debug)]
pub struct LocalMatch {
    inner: Arc<Mutex<Inner>>,
    events: UnboundedSender<MatchEvent>,
    difficulty: Difficulty,
    thinking_delay: Duration,
}

impl LocalMatch {
    /// Creates a driver for a fresh match, returning the event stream
    /// the presentation layer consumes.
    #[instrument]
    pub fn new(
        variant: Variant,
        size: BoardSize,
        difficulty: Difficulty,
    ) -> (Self, UnboundedReceiver<MatchEvent>) {
        info!(?variant, "Creating local match");
        let (events, receiver) = unbounded_channel();
        let driver = Self {
            inner: Arc::new(Mutex::new(Inner {
                game: ActiveGame::new(variant, size),
                ai_task: None,
            })),
            events,
            difficulty,
            thinking_delay: DEFAULT_THINKING_DELAY,
        };
        (driver, receiver)
    }

    /// Overrides the artificial thinking delay.
    pub fn with_thinking_delay(mut self, delay: Duration) -> Self {
        self.thinking_delay = delay;
        self
    }

    /// Current state snapshot.
    pub fn snapshot(&self) -> MatchSnapshot {
        self.inner.lock().unwrap().game.snapshot()
    }

    /// Submits a move intent for the active mark.
    ///
    /// For the nested variant the index addresses `sub * 9 + cell`.
    /// Emits `StateChanged` on success and `Terminal` when the move
    /// ends the match, which also cancels any pending computer reply.
    #[instrument(skip(self))]
    pub fn submit_move(&self, cell: usize) -> Result<(), MoveError> {
        let mut inner = self.inner.lock().unwrap();
        match &mut inner.game {
            ActiveGame::Flat(game) => {
                game.make_move(cell)?;
            }
            ActiveGame::Nested(game) => {
                game.make_move(cell / 9, cell % 9)?;
            }
        }
        self.emit(&mut inner);
        Ok(())
    }

    /// Schedules the computer's reply after the thinking delay.
    ///
    /// The reply is applied through the same validation path as a
    /// human move. Only one reply is pending at a time; scheduling
    /// again replaces the previous pending task.
    #[instrument(skip(self))]
    pub fn submit_ai_request(&self) -> Result<(), AiRequestError> {
        let mut inner = self.inner.lock().unwrap();
        match &inner.game {
            ActiveGame::Nested(_) => return Err(AiRequestError::NestedUnsupported),
            ActiveGame::Flat(game) => {
                if game.state().outcome().is_terminal() {
                    return Err(AiRequestError::MatchOver);
                }
            }
        }

        if let Some(task) = inner.ai_task.take() {
            task.abort();
        }

        let shared = Arc::clone(&self.inner);
        let events = self.events.clone();
        let difficulty = self.difficulty;
        let delay = self.thinking_delay;
        inner.ai_task = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            apply_computer_move(&shared, &events, difficulty);
        }));
        debug!(?delay, "Scheduled computer reply");
        Ok(())
    }

    /// Discards the current match and starts a fresh one, cancelling
    /// any pending computer reply.
    #[instrument(skip(self))]
    pub fn new_match(&self, variant: Variant, size: BoardSize) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(task) = inner.ai_task.take() {
            task.abort();
            debug!("Cancelled pending computer reply");
        }
        inner.game = ActiveGame::new(variant, size);
        self.events
            .send(MatchEvent::StateChanged(inner.game.snapshot()))
            .ok();
        info!(?variant, "Started new match");
    }

    /// Emits state events, cancelling the pending reply on terminal.
    fn emit(&self, inner: &mut Inner) {
        self.events
            .send(MatchEvent::StateChanged(inner.game.snapshot()))
            .ok();
        let outcome = inner.game.outcome();
        if outcome.is_terminal() {
            if let Some(task) = inner.ai_task.take() {
                task.abort();
                debug!("Cancelled pending computer reply after terminal");
            }
            self.events.send(MatchEvent::Terminal(outcome)).ok();
        }
    }
}

/// Runs the search and applies the chosen move through validation.
fn apply_computer_move(
    shared: &Arc<Mutex<Inner>>,
    events: &UnboundedSender<MatchEvent>,
    difficulty: Difficulty,
) {
    let mut inner = shared.lock().unwrap();
    let ActiveGame::Flat(game) = &mut inner.game else {
        return;
    };
    if game.state().outcome().is_terminal() {
        return;
    }

    let mark = *game.state().active_mark();
    let mut rng = rand::thread_rng();
    let Some(cell) = ai::select_move(game.state().board(), difficulty, mark, &mut rng) else {
        // No empty cell left; nothing to apply.
        return;
    };
    match game.make_move(cell) {
        Ok(record) => {
            debug!(cell, mark = %mark, "Computer moved");
            events
                .send(MatchEvent::StateChanged(MatchSnapshot::Flat(
                    game.state().clone(),
                )))
                .ok();
            if record.outcome().is_terminal() {
                events.send(MatchEvent::Terminal(record.outcome().clone())).ok();
            }
        }
        Err(err) => {
            warn!(cell, error = %err, "Computer move rejected");
        }
    }
}
