//! Gridmatch - turn-based match engine for grid marking games.
//!
//! Three rule variants (classic NxN, nested meta-board, and the
//! sliding-window eviction variant), a computer opponent, and a
//! session server for remote play.
//!
//! # Architecture
//!
//! - **game**: rule evaluation and per-variant state transitions
//! - **ai**: computer opponent built on minimax with alpha-beta pruning
//! - **session** / **coordinator**: rooms, matchmaking, turn authority
//! - **local**: match driver for play against the computer
//! - **server**: WebSocket transport for remote play
//!
//! # Example
//!
//! ```
//! use gridmatch::{BoardSize, Game, Outcome};
//!
//! let mut game = Game::classic(BoardSize::Three);
//! game.make_move(4).expect("center is empty");
//! assert_eq!(game.state().outcome(), &Outcome::InProgress);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod ai;
pub mod coordinator;
pub mod game;
pub mod local;
pub mod protocol;
pub mod server;
pub mod session;

// Crate-level exports - game types and rules
pub use game::{
    Board, BoardSize, Cell, Game, MARK_CAP, Mark, MatchState, Move, MoveError, MoveHistory,
    MoveRecord, NestedGame, NestedMoveRecord, Outcome, PlayerHistories, SubOutcome, Variant,
};

// Crate-level exports - computer opponent
pub use ai::{Difficulty, select_move};

// Crate-level exports - session management
pub use coordinator::{Coordinator, ValidationError};
pub use session::{ConnectionId, Participant, Room, RoomCode, RoomState};

// Crate-level exports - wire protocol
pub use protocol::{ClientMessage, ServerMessage, WireBoard, board_to_wire};

// Crate-level exports - local play
pub use local::{AiRequestError, LocalMatch, MatchEvent, MatchSnapshot};
