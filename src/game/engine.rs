//! Flat-variant match engine.
//!
//! Applies validated moves to a [`MatchState`], running the eviction
//! window when the variant demands it and recomputing the terminal
//! standing after every accepted move.

use super::eviction::PlayerHistories;
use super::rules;
use super::types::{BoardSize, Cell, Mark, MatchState, Move, Outcome, Variant};
use derive_getters::Getters;
use tracing::{debug, instrument};

/// Errors rejected by move validation. State is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    /// The match has already reached a terminal standing.
    MatchOver,
    /// Cell index lies outside the board.
    OutOfRange {
        /// The offending index.
        position: usize,
    },
    /// Target cell already holds a mark.
    CellOccupied {
        /// The occupied index.
        position: usize,
    },
    /// The nested variant constrains the move to a different sub-board.
    WrongSubBoard {
        /// Index of the sub-board the move must target.
        required: usize,
    },
    /// The targeted sub-board has already reached a terminal standing.
    SubBoardClosed {
        /// Index of the closed sub-board.
        sub: usize,
    },
}

impl std::fmt::Display for MoveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MoveError::MatchOver => write!(f, "Match is already over"),
            MoveError::OutOfRange { position } => {
                write!(f, "Cell {} is out of range", position)
            }
            MoveError::CellOccupied { position } => {
                write!(f, "Cell {} is already occupied", position)
            }
            MoveError::WrongSubBoard { required } => {
                write!(f, "Move must target sub-board {}", required)
            }
            MoveError::SubBoardClosed { sub } => {
                write!(f, "Sub-board {} is already decided", sub)
            }
        }
    }
}

impl std::error::Error for MoveError {}

/// Snapshot returned by a successful move.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct MoveRecord {
    /// Cell the mark was placed at.
    position: usize,
    /// Mark that moved.
    mark: Mark,
    /// Terminal standing after the move resolved.
    outcome: Outcome,
    /// Cell cleared by eviction in this step, if any.
    evicted: Option<usize>,
    /// The other player's oldest cell, surfaced once their history is
    /// at capacity. Advisory preview only.
    pending_eviction: Option<usize>,
}

/// Match engine for the classic and eviction variants.
#[derive(Debug, Clone)]
pub struct Game {
    state: MatchState,
    histories: Option<PlayerHistories>,
    next_seq: u64,
}

impl Game {
    /// Creates a classic match on the given board size.
    #[instrument]
    pub fn classic(size: BoardSize) -> Self {
        Self {
            state: MatchState::new(Variant::Classic, size),
            histories: None,
            next_seq: 0,
        }
    }

    /// Creates an eviction match on the given board size.
    #[instrument]
    pub fn eviction(size: BoardSize) -> Self {
        Self {
            state: MatchState::new(Variant::Eviction, size),
            histories: Some(PlayerHistories::new()),
            next_seq: 0,
        }
    }

    /// Returns the authoritative match state.
    pub fn state(&self) -> &MatchState {
        &self.state
    }

    /// Places the active mark at the given cell.
    ///
    /// Validates that the match is in progress, the index is in range,
    /// and the cell is empty; then applies the mark, runs the eviction
    /// window for the eviction variant, recomputes the terminal
    /// standing, and alternates the active mark.
    ///
    /// # Errors
    ///
    /// Returns a [`MoveError`] and leaves state unchanged when
    /// validation fails.
    #[instrument(skip(self), fields(mark = %self.state.active_mark()))]
    pub fn make_move(&mut self, position: usize) -> Result<MoveRecord, MoveError> {
        if self.state.outcome().is_terminal() {
            return Err(MoveError::MatchOver);
        }
        if position >= self.state.board().size().cell_count() {
            return Err(MoveError::OutOfRange { position });
        }
        if !self.state.board().is_empty(position) {
            return Err(MoveError::CellOccupied { position });
        }

        let mark = *self.state.active_mark();
        let seq = self.next_seq;
        self.next_seq += 1;
        self.state
            .board_mut()
            .set(position, Cell::Occupied(mark))
            .unwrap();

        // Eviction resolves before terminal evaluation.
        let mut evicted = None;
        let mut pending_eviction = None;
        if let Some(histories) = self.histories.as_mut() {
            if let Some(old) = histories.history_mut(mark).push(Move {
                mark,
                cell: position,
                seq,
            }) {
                self.state.board_mut().clear(old.cell);
                evicted = Some(old.cell);
                debug!(cell = old.cell, "Evicted oldest mark");
            }
            pending_eviction = histories.pending_eviction(mark);
        }

        let outcome = rules::evaluate(self.state.board());
        self.state.set_outcome(outcome.clone());
        self.state.set_active_mark(mark.opponent());

        debug!(position, outcome = ?outcome, "Move accepted");
        Ok(MoveRecord {
            position,
            mark,
            outcome,
            evicted,
            pending_eviction,
        })
    }
}
