//! Nested meta-board variant.
//!
//! Nine 3x3 sub-boards feed a 3x3 meta-board. Each move resolves its
//! sub-board with the ordinary 3x3 rule; the overall standing comes
//! from evaluating the meta-board with the same rule, treating
//! unresolved sub-boards as empty and drawn sub-boards as neither mark.

use super::engine::MoveError;
use super::rules;
use super::types::{Board, BoardSize, Cell, Mark, Outcome};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Number of sub-boards (and cells per sub-board).
const SUB_BOARDS: usize = 9;

/// Terminal standing of a single sub-board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubOutcome {
    /// Sub-board still accepts moves.
    Open,
    /// A mark completed a line on the sub-board.
    Won(Mark),
    /// Sub-board filled with no winner.
    Drawn,
}

impl SubOutcome {
    /// Checks whether the sub-board has been decided.
    pub fn is_terminal(self) -> bool {
        self != SubOutcome::Open
    }
}

/// Snapshot returned by a successful nested move.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct NestedMoveRecord {
    /// Sub-board the mark was placed in.
    sub: usize,
    /// Cell within the sub-board.
    cell: usize,
    /// Mark that moved.
    mark: Mark,
    /// Standing of the targeted sub-board after the move.
    sub_outcome: SubOutcome,
    /// Overall standing after the move.
    outcome: Outcome,
    /// Sub-board the next move must target, or `None` for free choice.
    constraint: Option<usize>,
}

/// Match state for the nested variant.
#[derive(Debug, Clone)]
pub struct NestedGame {
    boards: [Board; SUB_BOARDS],
    meta: [SubOutcome; SUB_BOARDS],
    active_mark: Mark,
    constraint: Option<usize>,
    outcome: Outcome,
}

impl NestedGame {
    /// Creates a fresh nested match. X moves first with free choice.
    #[instrument]
    pub fn new() -> Self {
        Self {
            boards: std::array::from_fn(|_| Board::new(BoardSize::Three)),
            meta: [SubOutcome::Open; SUB_BOARDS],
            active_mark: Mark::X,
            constraint: None,
            outcome: Outcome::InProgress,
        }
    }

    /// The sub-board at the given index.
    pub fn sub_board(&self, sub: usize) -> Option<&Board> {
        self.boards.get(sub)
    }

    /// Per-sub-board standings forming the meta-board.
    pub fn meta(&self) -> &[SubOutcome; SUB_BOARDS] {
        &self.meta
    }

    /// Mark permitted to move next.
    pub fn active_mark(&self) -> Mark {
        self.active_mark
    }

    /// Sub-board the next move must target, or `None` for free choice.
    pub fn constraint(&self) -> Option<usize> {
        self.constraint
    }

    /// Overall standing of the match.
    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    /// Places the active mark at `cell` of sub-board `sub`.
    ///
    /// Validates that the match is in progress, both indices are in
    /// range, the constrained sub-board (when set) is the one targeted,
    /// the sub-board is still open, and the cell is empty.
    ///
    /// After applying: the sub-board is resolved with the 3x3 rule, the
    /// meta-board standing is recomputed, and the constraint pointer
    /// moves to the sub-board matching the cell just played, freed when
    /// that target is already decided.
    ///
    /// # Errors
    ///
    /// Returns a [`MoveError`] and leaves state unchanged when
    /// validation fails.
    #[instrument(skip(self), fields(mark = %self.active_mark))]
    pub fn make_move(&mut self, sub: usize, cell: usize) -> Result<NestedMoveRecord, MoveError> {
        if self.outcome.is_terminal() {
            return Err(MoveError::MatchOver);
        }
        if sub >= SUB_BOARDS || cell >= SUB_BOARDS {
            return Err(MoveError::OutOfRange {
                position: sub * SUB_BOARDS + cell,
            });
        }
        if let Some(required) = self.constraint {
            if required != sub {
                return Err(MoveError::WrongSubBoard { required });
            }
        }
        if self.meta[sub].is_terminal() {
            return Err(MoveError::SubBoardClosed { sub });
        }
        if !self.boards[sub].is_empty(cell) {
            return Err(MoveError::CellOccupied {
                position: sub * SUB_BOARDS + cell,
            });
        }

        let mark = self.active_mark;
        self.boards[sub].set(cell, Cell::Occupied(mark)).unwrap();

        // A decided sub-board is written to the meta-board exactly once
        // and never changes thereafter.
        let sub_outcome = match rules::evaluate(&self.boards[sub]) {
            Outcome::Won { mark, .. } => SubOutcome::Won(mark),
            Outcome::Draw => SubOutcome::Drawn,
            Outcome::InProgress => SubOutcome::Open,
        };
        self.meta[sub] = sub_outcome;
        if sub_outcome.is_terminal() {
            debug!(sub, outcome = ?sub_outcome, "Sub-board decided");
        }

        self.outcome = self.evaluate_meta();
        self.constraint = if self.meta[cell].is_terminal() {
            None
        } else {
            Some(cell)
        };
        self.active_mark = mark.opponent();

        Ok(NestedMoveRecord {
            sub,
            cell,
            mark,
            sub_outcome,
            outcome: self.outcome.clone(),
            constraint: self.constraint,
        })
    }

    /// Evaluates the meta-board with the 3x3 rule. Won sub-boards count
    /// as that mark, drawn ones as neither, open ones as empty; the
    /// match is drawn once every sub-board is decided with no meta line.
    fn evaluate_meta(&self) -> Outcome {
        let mut meta_board = Board::new(BoardSize::Three);
        for (i, standing) in self.meta.iter().enumerate() {
            if let SubOutcome::Won(mark) = standing {
                meta_board.set(i, Cell::Occupied(*mark)).unwrap();
            }
        }
        if let Some((mark, line)) = rules::check_winner(&meta_board) {
            return Outcome::Won { mark, line };
        }
        if self.meta.iter().all(|s| s.is_terminal()) {
            return Outcome::Draw;
        }
        Outcome::InProgress
    }
}

impl Default for NestedGame {
    fn default() -> Self {
        Self::new()
    }
}
