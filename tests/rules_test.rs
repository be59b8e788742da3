//! Tests for terminal evaluation across the supported board sizes.

use gridmatch::game::rules::{check_winner, evaluate, is_full, lines};
use gridmatch::{Board, BoardSize, Cell, Game, Mark, MoveError, Outcome};

#[test]
fn test_line_generation_counts() {
    // N rows, N columns, two diagonals.
    assert_eq!(lines(3).len(), 8);
    assert_eq!(lines(4).len(), 10);
    assert_eq!(lines(5).len(), 12);
}

#[test]
fn test_unsupported_sizes_are_rejected_at_the_boundary() {
    assert_eq!(BoardSize::from_cells_per_side(2), None);
    assert_eq!(BoardSize::from_cells_per_side(6), None);
    assert_eq!(BoardSize::from_cells_per_side(4), Some(BoardSize::Four));
}

#[test]
fn test_top_row_win_through_the_engine() {
    // X -> 0, O -> 4, X -> 1, O -> 5, X -> 2 wins the top row.
    let mut game = Game::classic(BoardSize::Three);
    for pos in [0, 4, 1, 5] {
        game.make_move(pos).unwrap();
    }
    let record = game.make_move(2).unwrap();
    assert_eq!(
        record.outcome(),
        &Outcome::Won {
            mark: Mark::X,
            line: vec![0, 1, 2]
        }
    );
}

#[test]
fn test_column_win_on_four() {
    let mut board = Board::new(BoardSize::Four);
    for pos in [1, 5, 9, 13] {
        board.set(pos, Cell::Occupied(Mark::O)).unwrap();
    }
    assert_eq!(
        evaluate(&board),
        Outcome::Won {
            mark: Mark::O,
            line: vec![1, 5, 9, 13]
        }
    );
}

#[test]
fn test_diagonal_win_on_five() {
    let mut board = Board::new(BoardSize::Five);
    for pos in [0, 6, 12, 18, 24] {
        board.set(pos, Cell::Occupied(Mark::X)).unwrap();
    }
    assert_eq!(
        evaluate(&board),
        Outcome::Won {
            mark: Mark::X,
            line: vec![0, 6, 12, 18, 24]
        }
    );
}

#[test]
fn test_partial_line_is_not_a_win() {
    let mut board = Board::new(BoardSize::Five);
    for pos in [0, 6, 12, 18] {
        board.set(pos, Cell::Occupied(Mark::X)).unwrap();
    }
    assert_eq!(evaluate(&board), Outcome::InProgress);
}

#[test]
fn test_win_and_draw_are_mutually_exclusive() {
    // Full board where X owns the top row: must report the win.
    let mut board = Board::new(BoardSize::Three);
    let marks = [
        Mark::X,
        Mark::X,
        Mark::X,
        Mark::O,
        Mark::O,
        Mark::X,
        Mark::O,
        Mark::X,
        Mark::O,
    ];
    for (pos, mark) in marks.iter().enumerate() {
        board.set(pos, Cell::Occupied(*mark)).unwrap();
    }
    assert!(is_full(&board));
    assert!(check_winner(&board).is_some());
    assert!(matches!(evaluate(&board), Outcome::Won { .. }));
}

#[test]
fn test_draw_requires_full_board_without_winner() {
    // X O X / O X X / O X O
    let mut game = Game::classic(BoardSize::Three);
    for pos in [0, 1, 2, 3, 4, 6, 5, 8, 7] {
        game.make_move(pos).unwrap();
    }
    assert_eq!(game.state().outcome(), &Outcome::Draw);
}

#[test]
fn test_engine_rejects_bad_moves_in_order() {
    let mut game = Game::classic(BoardSize::Four);
    assert_eq!(
        game.make_move(16).unwrap_err(),
        MoveError::OutOfRange { position: 16 }
    );
    game.make_move(0).unwrap();
    assert_eq!(
        game.make_move(0).unwrap_err(),
        MoveError::CellOccupied { position: 0 }
    );
}
