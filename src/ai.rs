//! Computer opponent built on minimax with alpha-beta pruning.
//!
//! Move selection is stateless: every call searches from the board it
//! is handed. The lower tiers mix randomness and heuristics; the god
//! tier is exhaustive and deterministic for a given board.

use crate::game::rules;
use crate::game::types::{Board, BoardSize, Cell, Mark, Outcome};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Difficulty tiers for the computer opponent.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    /// Uniform-random choice among empty cells.
    Easy,
    /// Mostly heuristic play with an occasional random move.
    Medium,
    /// Heuristics first, full search most of the time.
    Hard,
    /// Exhaustive search. Optimal and deterministic.
    God,
}

/// Chance that the medium tier plays a purely random move.
///
/// The exact constants are tuning knobs, not contract.
pub const MEDIUM_RANDOM_CHANCE: f64 = 0.3;

/// Chance that the hard tier runs the full search instead of falling
/// back to the weighted-random heuristic.
pub const HARD_SEARCH_CHANCE: f64 = 0.8;

/// Base score for a decided search branch, discounted by depth so
/// faster wins and slower losses score better.
const WIN_SCORE: i32 = 10;

/// Search horizon on boards larger than 3x3, where the full game tree
/// is out of reach. Positions at the horizon score neutral.
const LARGE_BOARD_DEPTH_CAP: u32 = 6;

/// Selects a move for `computer` on the given board.
///
/// Returns `None` exactly when no empty cell exists; callers must
/// treat that as a no-op rather than a move.
#[instrument(skip(board, rng), fields(difficulty = %difficulty))]
pub fn select_move<R: Rng>(
    board: &Board,
    difficulty: Difficulty,
    computer: Mark,
    rng: &mut R,
) -> Option<usize> {
    let empty = board.empty_cells();
    if empty.is_empty() {
        return None;
    }

    let choice = match difficulty {
        Difficulty::Easy => empty[rng.gen_range(0..empty.len())],
        Difficulty::Medium => {
            if rng.gen_bool(MEDIUM_RANDOM_CHANCE) {
                empty[rng.gen_range(0..empty.len())]
            } else {
                winning_cell(board, computer)
                    .or_else(|| winning_cell(board, computer.opponent()))
                    .unwrap_or_else(|| weighted_random(board, rng))
            }
        }
        Difficulty::Hard => winning_cell(board, computer)
            .or_else(|| winning_cell(board, computer.opponent()))
            .unwrap_or_else(|| {
                if rng.gen_bool(HARD_SEARCH_CHANCE) {
                    best_search_move(board, computer)
                } else {
                    weighted_random(board, rng)
                }
            }),
        Difficulty::God => winning_cell(board, computer)
            .or_else(|| winning_cell(board, computer.opponent()))
            .unwrap_or_else(|| best_search_move(board, computer)),
    };

    debug!(choice, "Selected move");
    Some(choice)
}

// ─────────────────────────────────────────────────────────────
//  Immediate win/block fast path
// ─────────────────────────────────────────────────────────────

/// Finds a cell that completes a line for `mark` this move.
///
/// Checked before the search so winning and blocking are guaranteed
/// even on the tiers that skip minimax, and to bound the search in the
/// common case.
fn winning_cell(board: &Board, mark: Mark) -> Option<usize> {
    let mut probe = board.clone();
    for pos in board.empty_cells() {
        probe.set(pos, Cell::Occupied(mark)).unwrap();
        let wins = matches!(rules::check_winner(&probe), Some((m, _)) if m == mark);
        probe.clear(pos);
        if wins {
            return Some(pos);
        }
    }
    None
}

// ─────────────────────────────────────────────────────────────
//  Exhaustive search
// ─────────────────────────────────────────────────────────────

/// Runs minimax from every empty cell and picks the best score.
///
/// Cells are tried in ascending index order and only a strictly better
/// score replaces the current best, so ties break to the lowest index.
fn best_search_move(board: &Board, computer: Mark) -> usize {
    let mut work = board.clone();
    let mut best: Option<(usize, i32)> = None;
    for pos in board.empty_cells() {
        work.set(pos, Cell::Occupied(computer)).unwrap();
        let score = minimax(&mut work, computer, 1, false, i32::MIN, i32::MAX);
        work.clear(pos);
        if best.is_none_or(|(_, b)| score > b) {
            best = Some((pos, score));
        }
    }
    // select_move only searches non-empty candidate sets.
    best.map(|(pos, _)| pos).unwrap()
}

/// Minimax with alpha-beta pruning over a shared working board.
///
/// Every branch places a mark, recurses, and clears the mark before
/// the next candidate; no mutation outlives a call frame.
fn minimax(
    board: &mut Board,
    computer: Mark,
    depth: u32,
    maximizing: bool,
    mut alpha: i32,
    mut beta: i32,
) -> i32 {
    match rules::evaluate(board) {
        Outcome::Won { mark, .. } => {
            return if mark == computer {
                WIN_SCORE - depth as i32
            } else {
                depth as i32 - WIN_SCORE
            };
        }
        Outcome::Draw => return 0,
        Outcome::InProgress => {}
    }
    if depth >= depth_cap(board.size()) {
        return 0;
    }

    let to_move = if maximizing {
        computer
    } else {
        computer.opponent()
    };
    let mut best = if maximizing { i32::MIN } else { i32::MAX };
    for pos in board.empty_cells() {
        board.set(pos, Cell::Occupied(to_move)).unwrap();
        let score = minimax(board, computer, depth + 1, !maximizing, alpha, beta);
        board.clear(pos);
        if maximizing {
            best = best.max(score);
            alpha = alpha.max(score);
        } else {
            best = best.min(score);
            beta = beta.min(score);
        }
        if beta <= alpha {
            break;
        }
    }
    best
}

fn depth_cap(size: BoardSize) -> u32 {
    match size {
        BoardSize::Three => u32::MAX,
        BoardSize::Four | BoardSize::Five => LARGE_BOARD_DEPTH_CAP,
    }
}

// ─────────────────────────────────────────────────────────────
//  Weighted-random fallback
// ─────────────────────────────────────────────────────────────

/// Random choice among empty cells, weighted toward the center and
/// corners over the edges.
fn weighted_random<R: Rng>(board: &Board, rng: &mut R) -> usize {
    let side = board.size().cells_per_side();
    let empty = board.empty_cells();
    let weights: Vec<u32> = empty.iter().map(|&pos| cell_weight(pos, side)).collect();
    let total: u32 = weights.iter().sum();
    let mut roll = rng.gen_range(0..total);
    for (&pos, weight) in empty.iter().zip(&weights) {
        if roll < *weight {
            return pos;
        }
        roll -= weight;
    }
    *empty.last().unwrap()
}

fn cell_weight(pos: usize, side: usize) -> u32 {
    let row = pos / side;
    let col = pos % side;
    let mid_lo = (side - 1) / 2;
    let mid_hi = side / 2;
    let is_mid = |i: usize| (mid_lo..=mid_hi).contains(&i);
    let is_rim = |i: usize| i == 0 || i == side - 1;
    if is_mid(row) && is_mid(col) {
        4
    } else if is_rim(row) && is_rim(col) {
        3
    } else {
        1
    }
}
