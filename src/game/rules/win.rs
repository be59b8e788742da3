//! Win detection over parametrically generated lines.

use super::super::types::{Board, Cell, Mark};
use tracing::instrument;

/// Generates all winning lines for a board of the given side length.
///
/// Produces `side` rows, `side` columns, and both diagonals, each of
/// length `side`, as cell indices in row-major order.
pub fn lines(side: usize) -> Vec<Vec<usize>> {
    let mut lines = Vec::with_capacity(2 * side + 2);
    for row in 0..side {
        lines.push((0..side).map(|col| row * side + col).collect());
    }
    for col in 0..side {
        lines.push((0..side).map(|row| row * side + col).collect());
    }
    lines.push((0..side).map(|i| i * side + i).collect());
    lines.push((0..side).map(|i| i * side + (side - 1 - i)).collect());
    lines
}

/// Checks if there is a winner on the board.
///
/// Returns the winning mark together with the cell indices of its
/// completed line, scanning lines in generation order.
#[instrument(skip(board))]
pub fn check_winner(board: &Board) -> Option<(Mark, Vec<usize>)> {
    let cells = board.cells();
    for line in lines(board.size().cells_per_side()) {
        if let Cell::Occupied(mark) = cells[line[0]] {
            if line.iter().all(|&i| cells[i] == Cell::Occupied(mark)) {
                return Some((mark, line));
            }
        }
    }
    None
}
