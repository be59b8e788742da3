//! Server-side authority for rooms, turns, and matchmaking.
//!
//! Every operation locks the shared [`Registry`], so the turn check
//! and the following mutation execute as one atomic unit per room and
//! queue pop-and-pair can never race. Validation failures are reported
//! only to the requesting participant; broadcasts carry authoritative
//! state to everyone bound to the room.

use crate::game::{Mark, MoveError, Outcome};
use crate::protocol::{ClientMessage, ServerMessage, board_to_wire};
use crate::session::{
    ConnectionId, Registry, Room, RoomCode, RoomState, generate_room_code,
};
use derive_more::{Display, Error, From};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, instrument, warn};

/// Validation failures. State is left unchanged and the failure is
/// reported only to the requesting participant.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error, From)]
pub enum ValidationError {
    /// No room exists under the given code.
    #[display("Room {code} not found")]
    RoomNotFound {
        /// The unknown code.
        code: String,
    },
    /// A caller-supplied room code is already in use.
    #[display("Room code {code} is already taken")]
    RoomCodeTaken {
        /// The clashing code.
        code: String,
    },
    /// Both slots of the room are bound to live connections.
    #[display("Room {code} is full")]
    RoomFull {
        /// The full room's code.
        code: String,
    },
    /// The connection never registered an outbound channel.
    #[display("Connection is not registered")]
    NotConnected,
    /// The requester is not bound to any room.
    #[display("Not bound to a room")]
    NotInRoom,
    /// The room is still waiting for an opponent.
    #[display("Match has not started")]
    MatchNotStarted,
    /// The requester's mark is not the room's active mark.
    #[display("Not your turn")]
    NotYourTurn,
    /// The symbol in the request does not match the assigned mark.
    #[display("Symbol does not match the assigned mark")]
    SymbolMismatch,
    /// The move itself was rejected by the rules.
    #[display("{_0}")]
    #[from]
    Move(MoveError),
}

/// Owns the room registry and the matchmaking queue.
#[derive(Debug, Clone, Default)]
pub struct Coordinator {
    registry: Arc<Mutex<Registry>>,
}

impl Coordinator {
    /// Creates a coordinator with an empty registry.
    #[instrument]
    pub fn new() -> Self {
        info!("Creating session coordinator");
        Self {
            registry: Arc::new(Mutex::new(Registry::new())),
        }
    }

    /// Registers a connection's outbound channel.
    #[instrument(skip(self, sender))]
    pub fn connect(&self, conn: ConnectionId, sender: UnboundedSender<ServerMessage>) {
        let mut reg = self.registry.lock().unwrap();
        reg.clients.insert(conn, sender);
        debug!(conn, "Connection registered");
    }

    /// Creates a room and binds the requester as the first participant.
    ///
    /// The requester plays X. A code is generated when none is
    /// supplied; a supplied code that is already in use is rejected.
    #[instrument(skip(self))]
    pub fn create_room(
        &self,
        conn: ConnectionId,
        code: Option<String>,
    ) -> Result<RoomCode, ValidationError> {
        let mut reg = self.registry.lock().unwrap();
        let sender = reg
            .clients
            .get(&conn)
            .cloned()
            .ok_or(ValidationError::NotConnected)?;
        detach(&mut reg, conn);

        let code = match code {
            Some(code) => {
                if reg.rooms.contains_key(&code) {
                    return Err(ValidationError::RoomCodeTaken { code });
                }
                code
            }
            None => {
                let mut rng = rand::thread_rng();
                loop {
                    let code = generate_room_code(&mut rng);
                    if !reg.rooms.contains_key(&code) {
                        break code;
                    }
                }
            }
        };

        let mut room = Room::new(code.clone());
        room.bind(conn, sender.clone())
            .map_err(|_| ValidationError::RoomFull { code: code.clone() })?;
        reg.rooms.insert(code.clone(), room);
        reg.conn_to_room.insert(conn, code.clone());

        sender
            .send(ServerMessage::RoomCreated {
                room_code: code.clone(),
            })
            .ok();
        info!(conn, room = %code, "Room created");
        Ok(code)
    }

    /// Binds the requester to an existing room.
    ///
    /// A connection already bound to the room is rebound in place; a
    /// dead binding may be taken over. Once both slots hold live
    /// connections, `game_start` is broadcast to both participants.
    #[instrument(skip(self))]
    pub fn join_room(&self, conn: ConnectionId, code: &str) -> Result<Mark, ValidationError> {
        let mut reg = self.registry.lock().unwrap();
        let sender = reg
            .clients
            .get(&conn)
            .cloned()
            .ok_or(ValidationError::NotConnected)?;
        if reg.conn_to_room.get(&conn).map(String::as_str) != Some(code) {
            detach(&mut reg, conn);
        }

        let room = reg
            .rooms
            .get_mut(code)
            .ok_or_else(|| ValidationError::RoomNotFound { code: code.into() })?;
        let mark = room
            .bind(conn, sender)
            .map_err(|_| ValidationError::RoomFull { code: code.into() })?;
        let started = room.state == RoomState::Playing;
        if started {
            broadcast_game_start(room);
        }
        reg.conn_to_room.insert(conn, code.to_string());

        info!(conn, room = %code, mark = %mark, started, "Joined room");
        Ok(mark)
    }

    /// Applies a move for the requester and broadcasts the result.
    ///
    /// Validates, in order, that the requester is bound to a room,
    /// that the match is underway, that the requester's mark is the
    /// active mark, and that the cell is a legal target. On a terminal
    /// standing, `game_over` follows `move_made` and the room ends.
    #[instrument(skip(self))]
    pub fn make_move(
        &self,
        conn: ConnectionId,
        position: usize,
        symbol: Mark,
    ) -> Result<(), ValidationError> {
        let mut reg = self.registry.lock().unwrap();
        let code = reg
            .conn_to_room
            .get(&conn)
            .cloned()
            .ok_or(ValidationError::NotInRoom)?;
        let room = reg
            .rooms
            .get_mut(&code)
            .ok_or(ValidationError::NotInRoom)?;
        let mark = room
            .participant(conn)
            .map(|p| p.mark)
            .ok_or(ValidationError::NotInRoom)?;

        if mark != symbol {
            warn!(conn, claimed = %symbol, bound = %mark, "Symbol mismatch");
            return Err(ValidationError::SymbolMismatch);
        }
        match room.state {
            RoomState::Waiting => return Err(ValidationError::MatchNotStarted),
            RoomState::Ended => return Err(MoveError::MatchOver.into()),
            RoomState::Playing => {}
        }
        if *room.game.state().active_mark() != mark {
            debug!(conn, "Rejected out-of-turn move");
            return Err(ValidationError::NotYourTurn);
        }

        let record = room.game.make_move(position)?;
        let terminal = record.outcome().is_terminal();
        if terminal {
            room.state = RoomState::Ended;
        }

        let update = ServerMessage::MoveMade {
            position,
            symbol: mark,
            board: board_to_wire(room.game.state().board()),
            current_turn: *room.game.state().active_mark(),
        };
        for participant in room.participants() {
            participant.sender.send(update.clone()).ok();
        }
        if terminal {
            let winner = match record.outcome() {
                Outcome::Won { mark, .. } => Some(*mark),
                _ => None,
            };
            info!(room = %code, winner = ?winner, "Match over");
            for participant in room.participants() {
                participant
                    .sender
                    .send(ServerMessage::GameOver { winner })
                    .ok();
            }
        }
        Ok(())
    }

    /// Pairs the requester with the earliest queued identity, or
    /// queues the requester when nobody is waiting.
    ///
    /// Dead identities are pruned first; the queued identity receives
    /// the first mark. Pop-and-pair happens under the registry lock.
    #[instrument(skip(self))]
    pub fn enqueue_random_match(&self, conn: ConnectionId) -> Result<(), ValidationError> {
        let mut reg = self.registry.lock().unwrap();
        let sender = reg
            .clients
            .get(&conn)
            .cloned()
            .ok_or(ValidationError::NotConnected)?;
        detach(&mut reg, conn);
        reg.prune_queue();

        let Some(other) = reg.queue.pop_front() else {
            reg.queue.push_back(conn);
            sender.send(ServerMessage::WaitingForMatch).ok();
            debug!(conn, "Queued for random match");
            return Ok(());
        };

        let other_sender = reg
            .clients
            .get(&other)
            .cloned()
            .ok_or(ValidationError::NotConnected)?;
        let mut rng = rand::thread_rng();
        let code = loop {
            let code = generate_room_code(&mut rng);
            if !reg.rooms.contains_key(&code) {
                break code;
            }
        };

        let mut room = Room::new(code.clone());
        room.bind(other, other_sender)
            .map_err(|_| ValidationError::RoomFull { code: code.clone() })?;
        room.bind(conn, sender)
            .map_err(|_| ValidationError::RoomFull { code: code.clone() })?;
        broadcast_game_start(&room);
        reg.conn_to_room.insert(other, code.clone());
        reg.conn_to_room.insert(conn, code.clone());
        reg.rooms.insert(code.clone(), room);

        info!(room = %code, first = other, second = conn, "Matched random pair");
        Ok(())
    }

    /// Unbinds the requester from any room and leaves the queue.
    #[instrument(skip(self))]
    pub fn leave_room(&self, conn: ConnectionId) -> Result<(), ValidationError> {
        let mut reg = self.registry.lock().unwrap();
        detach(&mut reg, conn);
        Ok(())
    }

    /// Handles a dropped connection. A disconnect is a lifecycle
    /// transition, not an error.
    #[instrument(skip(self))]
    pub fn disconnect(&self, conn: ConnectionId) {
        let mut reg = self.registry.lock().unwrap();
        detach(&mut reg, conn);
        reg.clients.remove(&conn);
        debug!(conn, "Connection removed");
    }

    /// Dispatches a validated client message.
    pub fn handle(&self, conn: ConnectionId, msg: ClientMessage) -> Result<(), ValidationError> {
        match msg {
            ClientMessage::CreateRoom { room_code } => {
                self.create_room(conn, room_code).map(|_| ())
            }
            ClientMessage::JoinRoom { room_code } => self.join_room(conn, &room_code).map(|_| ()),
            ClientMessage::MakeMove {
                position, symbol, ..
            } => self.make_move(conn, position, symbol),
            ClientMessage::FindRandomMatch => self.enqueue_random_match(conn),
            ClientMessage::LeaveRoom => self.leave_room(conn),
        }
    }

    /// Reports a failure back to the requesting connection only.
    pub fn send_error(&self, conn: ConnectionId, reason: String) {
        let reg = self.registry.lock().unwrap();
        if let Some(sender) = reg.clients.get(&conn) {
            sender.send(ServerMessage::Error { reason }).ok();
        }
    }
}

/// Sends `game_start` to every participant with their own mark.
fn broadcast_game_start(room: &Room) {
    let players: Vec<String> = room.participants().map(|p| p.conn.to_string()).collect();
    let current_turn = *room.game.state().active_mark();
    for participant in room.participants() {
        participant
            .sender
            .send(ServerMessage::GameStart {
                room_code: room.code.clone(),
                player_symbol: participant.mark,
                players: players.clone(),
                current_turn,
            })
            .ok();
    }
}

/// Removes a connection from the queue and from its room, notifying
/// the remaining participant and deleting the room once empty.
fn detach(reg: &mut Registry, conn: ConnectionId) {
    reg.queue.retain(|c| *c != conn);
    let Some(code) = reg.conn_to_room.remove(&conn) else {
        return;
    };
    let Some(room) = reg.rooms.get_mut(&code) else {
        return;
    };
    if room.unbind(conn).is_none() {
        return;
    }
    if room.occupancy() == 0 {
        reg.rooms.remove(&code);
        info!(room = %code, "Room deleted");
        return;
    }
    room.state = RoomState::Ended;
    for participant in room.participants() {
        participant.sender.send(ServerMessage::PlayerLeft).ok();
    }
    info!(room = %code, left = conn, "Participant left room");
}
