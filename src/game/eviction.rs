//! Sliding-window mark management for the eviction variant.
//!
//! Each player holds at most [`MARK_CAP`] live marks. Placing a fourth
//! mark removes that player's oldest one before terminal evaluation
//! runs, so a winning line can never be claimed through a mark that is
//! being evicted in the same step.

use super::types::{Mark, Move};
use std::collections::VecDeque;

/// Maximum live marks a player may hold.
pub const MARK_CAP: usize = 3;

/// Per-player FIFO queue of live moves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoveHistory {
    moves: VecDeque<Move>,
}

impl MoveHistory {
    /// Creates an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a move, returning the evicted oldest move when the cap
    /// was exceeded.
    ///
    /// Moves arrive in sequence order, so the front of the queue is
    /// always the lowest sequence number.
    pub fn push(&mut self, mv: Move) -> Option<Move> {
        self.moves.push_back(mv);
        if self.moves.len() > MARK_CAP {
            self.moves.pop_front()
        } else {
            None
        }
    }

    /// Number of live moves.
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    /// Checks whether the history holds no moves.
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Checks whether the next push would evict.
    pub fn at_capacity(&self) -> bool {
        self.moves.len() >= MARK_CAP
    }

    /// The oldest live move, next in line for eviction.
    pub fn oldest(&self) -> Option<&Move> {
        self.moves.front()
    }

    /// Cell indices of the live moves, oldest first.
    pub fn live_cells(&self) -> impl Iterator<Item = usize> + '_ {
        self.moves.iter().map(|m| m.cell)
    }
}

/// Both players' histories. The two queues age independently and
/// interact only through board occupancy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerHistories {
    x: MoveHistory,
    o: MoveHistory,
}

impl PlayerHistories {
    /// Creates empty histories for both players.
    pub fn new() -> Self {
        Self::default()
    }

    /// The history for the given mark.
    pub fn history(&self, mark: Mark) -> &MoveHistory {
        match mark {
            Mark::X => &self.x,
            Mark::O => &self.o,
        }
    }

    /// Mutable history for the given mark.
    pub fn history_mut(&mut self, mark: Mark) -> &mut MoveHistory {
        match mark {
            Mark::X => &mut self.x,
            Mark::O => &mut self.o,
        }
    }

    /// The other player's cell about to be evicted, surfaced for
    /// preview once their history is at capacity. Advisory only; the
    /// mark is not removed until that player's own next move overflows.
    pub fn pending_eviction(&self, mover: Mark) -> Option<usize> {
        let other = self.history(mover.opponent());
        if other.at_capacity() {
            other.oldest().map(|m| m.cell)
        } else {
            None
        }
    }
}
