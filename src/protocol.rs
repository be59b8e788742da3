//! Wire protocol for the multiplayer session server.
//!
//! Messages form a closed tagged-union schema, validated here before
//! any value reaches the coordinator. The tag travels in a `type`
//! field; message names are snake_case and payload fields camelCase to
//! stay compatible with existing clients.

use crate::game::{Board, Cell, Mark};
use serde::{Deserialize, Serialize};

/// Board cells as they travel on the wire (`null` = empty).
pub type WireBoard = Vec<Option<Mark>>;

/// Flattens a board into its wire representation.
pub fn board_to_wire(board: &Board) -> WireBoard {
    board
        .cells()
        .iter()
        .map(|c| match c {
            Cell::Empty => None,
            Cell::Occupied(mark) => Some(*mark),
        })
        .collect()
}

/// Messages sent by clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Open a new room, optionally with a caller-supplied code.
    CreateRoom {
        /// Requested room code; one is generated when absent.
        #[serde(
            rename = "roomCode",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        room_code: Option<String>,
    },
    /// Join an existing room by code.
    JoinRoom {
        /// Code of the room to join.
        #[serde(rename = "roomCode")]
        room_code: String,
    },
    /// Place a mark. The room is the one this connection is bound to.
    MakeMove {
        /// Target cell index.
        position: usize,
        /// Mark the client believes it plays; checked against the binding.
        symbol: Mark,
        /// Client's view of the board; ignored in favor of server state.
        board: WireBoard,
    },
    /// Enter the matchmaking queue.
    FindRandomMatch,
    /// Leave the current room.
    LeaveRoom,
}

/// Messages sent by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// A room was created for the requester.
    RoomCreated {
        /// Code of the new room.
        #[serde(rename = "roomCode")]
        room_code: String,
    },
    /// Both participants are bound; the match begins.
    GameStart {
        /// Code of the room.
        #[serde(rename = "roomCode")]
        room_code: String,
        /// Mark assigned to the receiving participant.
        #[serde(rename = "playerSymbol")]
        player_symbol: Mark,
        /// Identities of both participants.
        players: Vec<String>,
        /// Mark that moves first.
        #[serde(rename = "currentTurn")]
        current_turn: Mark,
    },
    /// Authoritative state after an accepted move.
    MoveMade {
        /// Cell the mark was placed at.
        position: usize,
        /// Mark that moved.
        symbol: Mark,
        /// Authoritative board after the move.
        board: WireBoard,
        /// Mark that moves next.
        #[serde(rename = "currentTurn")]
        current_turn: Mark,
    },
    /// The match reached a terminal standing.
    GameOver {
        /// The winning mark, or `null` for a draw.
        winner: Option<Mark>,
    },
    /// No opponent queued yet; the requester is waiting.
    WaitingForMatch,
    /// The other participant left the room.
    PlayerLeft,
    /// A request failed; delivered only to the requester.
    Error {
        /// Human-readable failure reason.
        reason: String,
    },
}
