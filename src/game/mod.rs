//! Rule evaluation and per-variant state transitions.

pub mod engine;
pub mod eviction;
pub mod nested;
pub mod rules;
pub mod types;

pub use engine::{Game, MoveError, MoveRecord};
pub use eviction::{MARK_CAP, MoveHistory, PlayerHistories};
pub use nested::{NestedGame, NestedMoveRecord, SubOutcome};
pub use types::{Board, BoardSize, Cell, Mark, MatchState, Move, Outcome, Variant};
