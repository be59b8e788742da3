//! Core domain types for grid marking games.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// A player's mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    /// Mark X (moves first).
    X,
    /// Mark O (moves second).
    O,
}

impl Mark {
    /// Returns the opposing mark.
    pub fn opponent(self) -> Self {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

impl std::fmt::Display for Mark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mark::X => write!(f, "X"),
            Mark::O => write!(f, "O"),
        }
    }
}

/// A single cell on a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    /// Empty cell.
    Empty,
    /// Cell holding a player's mark.
    Occupied(Mark),
}

/// Supported side lengths for flat boards.
///
/// The parametric line generator covers exactly these sizes; raw
/// integers are converted through [`BoardSize::from_cells_per_side`]
/// so unsupported sizes never reach the rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoardSize {
    /// 3x3 board.
    Three,
    /// 4x4 board.
    Four,
    /// 5x5 board.
    Five,
}

impl BoardSize {
    /// Returns the side length as a number.
    pub fn cells_per_side(self) -> usize {
        match self {
            BoardSize::Three => 3,
            BoardSize::Four => 4,
            BoardSize::Five => 5,
        }
    }

    /// Returns the total number of cells (side squared).
    pub fn cell_count(self) -> usize {
        let side = self.cells_per_side();
        side * side
    }

    /// Converts a raw side length, rejecting unsupported sizes.
    pub fn from_cells_per_side(side: usize) -> Option<Self> {
        match side {
            3 => Some(BoardSize::Three),
            4 => Some(BoardSize::Four),
            5 => Some(BoardSize::Five),
            _ => None,
        }
    }
}

/// A square board of cells in row-major order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    size: BoardSize,
    cells: Vec<Cell>,
}

impl Board {
    /// Creates an empty board of the given size.
    pub fn new(size: BoardSize) -> Self {
        Self {
            size,
            cells: vec![Cell::Empty; size.cell_count()],
        }
    }

    /// Returns the board size.
    pub fn size(&self) -> BoardSize {
        self.size
    }

    /// Gets the cell at the given index.
    pub fn get(&self, pos: usize) -> Option<Cell> {
        self.cells.get(pos).copied()
    }

    /// Sets the cell at the given index.
    pub fn set(&mut self, pos: usize, cell: Cell) -> Result<(), &'static str> {
        if pos >= self.cells.len() {
            return Err("Cell index out of bounds");
        }
        self.cells[pos] = cell;
        Ok(())
    }

    /// Clears the cell at the given index.
    pub fn clear(&mut self, pos: usize) {
        if pos < self.cells.len() {
            self.cells[pos] = Cell::Empty;
        }
    }

    /// Checks if a cell is empty.
    pub fn is_empty(&self, pos: usize) -> bool {
        matches!(self.get(pos), Some(Cell::Empty))
    }

    /// Returns all cells as a slice.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Returns the indices of all empty cells in ascending order.
    pub fn empty_cells(&self) -> Vec<usize> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| **c == Cell::Empty)
            .map(|(i, _)| i)
            .collect()
    }

    /// Counts the live marks a player holds on the board.
    pub fn mark_count(&self, mark: Mark) -> usize {
        self.cells
            .iter()
            .filter(|c| **c == Cell::Occupied(mark))
            .count()
    }

    /// Formats the board as a human-readable string.
    pub fn display(&self) -> String {
        let side = self.size.cells_per_side();
        let mut result = String::new();
        for row in 0..side {
            for col in 0..side {
                let pos = row * side + col;
                let symbol = match self.cells[pos] {
                    Cell::Empty => ".".to_string(),
                    Cell::Occupied(mark) => mark.to_string(),
                };
                result.push_str(&symbol);
                if col < side - 1 {
                    result.push('|');
                }
            }
            if row < side - 1 {
                result.push('\n');
                result.push_str(&"-+".repeat(side - 1));
                result.push_str("-\n");
            }
        }
        result
    }
}

/// Rule variant a match is played under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Fixed NxN board, classic rules.
    Classic,
    /// Sliding-window variant where each player holds at most three live marks.
    Eviction,
    /// Nested meta-board variant of nine 3x3 sub-boards.
    Nested,
}

/// A single accepted move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    /// Mark that was placed.
    pub mark: Mark,
    /// Cell index the mark was placed at.
    pub cell: usize,
    /// Monotonically increasing sequence number within the match.
    pub seq: u64,
}

/// Terminal standing of a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Match is ongoing.
    InProgress,
    /// A mark completed a line.
    Won {
        /// The winning mark.
        mark: Mark,
        /// Cell indices of the winning line.
        line: Vec<usize>,
    },
    /// Board exhausted with no winner.
    Draw,
}

impl Outcome {
    /// Checks whether the match has ended.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Outcome::InProgress)
    }
}

/// Authoritative state of a flat-variant match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct MatchState {
    /// The board.
    board: Board,
    /// Mark permitted to move next.
    active_mark: Mark,
    /// Terminal standing.
    outcome: Outcome,
    /// Rule variant in play.
    variant: Variant,
}

impl MatchState {
    /// Creates the state of a fresh match. X moves first.
    pub fn new(variant: Variant, size: BoardSize) -> Self {
        Self {
            board: Board::new(size),
            active_mark: Mark::X,
            outcome: Outcome::InProgress,
            variant,
        }
    }

    /// Mutable board access for validated move application.
    pub(super) fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    /// Sets the active mark.
    pub(super) fn set_active_mark(&mut self, mark: Mark) {
        self.active_mark = mark;
    }

    /// Sets the terminal standing.
    pub(super) fn set_outcome(&mut self, outcome: Outcome) {
        self.outcome = outcome;
    }
}
