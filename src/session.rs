//! Room registry and matchmaking state for remote play.
//!
//! A [`Room`] binds up to two connections to marks around a classic
//! 3x3 match. The whole [`Registry`] sits behind one coordinator lock
//! so the turn check and the following mutation form a single atomic
//! unit per room, and queue pop-and-pair is atomic as well.

use crate::game::{BoardSize, Game, Mark};
use crate::protocol::ServerMessage;
use rand::Rng;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, instrument, warn};

/// Unique identifier for a client connection.
pub type ConnectionId = u64;

/// Code identifying a room.
pub type RoomCode = String;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Allocates the next connection id.
pub fn next_connection_id() -> ConnectionId {
    NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed)
}

/// Length of generated room codes.
const ROOM_CODE_LEN: usize = 6;

/// Generates a random room code.
pub fn generate_room_code<R: Rng>(rng: &mut R) -> RoomCode {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    (0..ROOM_CODE_LEN)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

/// A connection bound to a room slot.
#[derive(Debug, Clone)]
pub struct Participant {
    /// The bound connection.
    pub conn: ConnectionId,
    /// Mark this participant plays.
    pub mark: Mark,
    /// Outbound channel for authoritative broadcasts.
    pub sender: UnboundedSender<ServerMessage>,
}

impl Participant {
    /// Checks whether the connection can still receive messages.
    pub fn is_live(&self) -> bool {
        !self.sender.is_closed()
    }
}

/// Lifecycle state of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomState {
    /// One participant bound, waiting for an opponent.
    Waiting,
    /// Two participants bound, turns alternating.
    Playing,
    /// Terminal match standing reached, or a participant left.
    Ended,
}

/// Why a join attempt was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindRejection {
    /// Both slots are bound to live connections.
    Full,
}

/// A match room binding up to two participants to marks.
#[derive(Debug)]
pub struct Room {
    /// The room code.
    pub code: RoomCode,
    /// Lifecycle state.
    pub state: RoomState,
    /// Participant playing X.
    pub player_x: Option<Participant>,
    /// Participant playing O.
    pub player_o: Option<Participant>,
    /// The match.
    pub game: Game,
}

impl Room {
    /// Creates an empty room around a fresh classic 3x3 match.
    #[instrument]
    pub fn new(code: RoomCode) -> Self {
        info!(room = %code, "Creating room");
        Self {
            code,
            state: RoomState::Waiting,
            player_x: None,
            player_o: None,
            game: Game::classic(BoardSize::Three),
        }
    }

    /// Binds a connection to a slot and returns its assigned mark.
    ///
    /// A connection already bound here is rebound in place (reconnect).
    /// Otherwise the first free slot is taken; when the room looks full
    /// a slot whose connection has gone dead may be taken over instead
    /// of rejecting the join.
    #[instrument(skip(self, sender), fields(room = %self.code))]
    pub fn bind(
        &mut self,
        conn: ConnectionId,
        sender: UnboundedSender<ServerMessage>,
    ) -> Result<Mark, BindRejection> {
        for slot in [&mut self.player_x, &mut self.player_o] {
            if let Some(existing) = slot {
                if existing.conn == conn {
                    debug!(conn, mark = %existing.mark, "Rebinding existing participant");
                    existing.sender = sender;
                    return Ok(existing.mark);
                }
            }
        }

        let mut bound = None;
        for (slot, mark) in [
            (&mut self.player_x, Mark::X),
            (&mut self.player_o, Mark::O),
        ] {
            let replaceable = match slot {
                None => true,
                Some(existing) => !existing.is_live(),
            };
            if replaceable {
                if slot.is_some() {
                    warn!(conn, mark = %mark, "Taking over dead participant slot");
                }
                *slot = Some(Participant { conn, mark, sender });
                bound = Some(mark);
                break;
            }
        }

        match bound {
            Some(mark) => {
                self.refresh_state();
                Ok(mark)
            }
            None => Err(BindRejection::Full),
        }
    }

    /// Unbinds a connection, returning the removed participant.
    pub fn unbind(&mut self, conn: ConnectionId) -> Option<Participant> {
        for slot in [&mut self.player_x, &mut self.player_o] {
            if slot.as_ref().is_some_and(|p| p.conn == conn) {
                return slot.take();
            }
        }
        None
    }

    /// The participant bound to the given connection.
    pub fn participant(&self, conn: ConnectionId) -> Option<&Participant> {
        self.participants().find(|p| p.conn == conn)
    }

    /// Iterates over the bound participants.
    pub fn participants(&self) -> impl Iterator<Item = &Participant> {
        self.player_x.iter().chain(self.player_o.iter())
    }

    /// Number of bound participants.
    pub fn occupancy(&self) -> usize {
        self.participants().count()
    }

    /// Moves Waiting to Playing once both slots hold live bindings.
    /// Ended is final.
    fn refresh_state(&mut self) {
        if self.state == RoomState::Ended {
            return;
        }
        let live = self.participants().filter(|p| p.is_live()).count();
        self.state = if live >= 2 {
            RoomState::Playing
        } else {
            RoomState::Waiting
        };
    }
}

/// Shared mutable state behind the coordinator lock.
#[derive(Debug, Default)]
pub struct Registry {
    /// Rooms by code.
    pub rooms: HashMap<RoomCode, Room>,
    /// Matchmaking queue, earliest request first.
    pub queue: VecDeque<ConnectionId>,
    /// Outbound channel per connection.
    pub clients: HashMap<ConnectionId, UnboundedSender<ServerMessage>>,
    /// Which room each connection is bound to.
    pub conn_to_room: HashMap<ConnectionId, RoomCode>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops queued identities whose connections are gone.
    pub fn prune_queue(&mut self) {
        let clients = &self.clients;
        self.queue
            .retain(|conn| clients.get(conn).is_some_and(|s| !s.is_closed()));
    }
}
