//! Dispatch core: decode -> command handler -> state mutation -> outbound
//! datagram batch, plus the two per-tick sweepers.
//!
//! The engine owns all mutable server state but no transport. It consumes
//! `(bytes, sender, now)` and appends `(addr, bytes)` pairs to an outbound
//! batch; the network loop moves datagrams in and out of it. Protocol
//! violations and rejected operations are logged and produce no reply;
//! a silent server is the failure signal this protocol gives its callers.

use crate::game::{PlayerId, RoomId};
use crate::rooms::RoomManager;
use crate::sessions::{Assignment, SessionRegistry};
use log::{debug, info, warn};
use shared::ClientCommand;
use std::net::SocketAddr;

/// Housekeeping thresholds, all in wall-clock seconds.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Eviction threshold for sessions outside a closed-door game.
    pub idle_timeout_secs: u64,
    /// Tighter eviction threshold while a session's room door is closed.
    pub game_timeout_secs: u64,
    /// Delay between a game ending and its board being soft-reset.
    pub grace_period_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: 300,
            game_timeout_secs: 30,
            grace_period_secs: 2,
        }
    }
}

/// One datagram waiting to leave the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub addr: SocketAddr,
    pub bytes: Vec<u8>,
}

enum Outcome {
    Won(PlayerId),
    Draw,
}

/// The session/protocol engine. All state mutation happens inside its
/// handlers, which run to completion before the next datagram is read.
pub struct Engine {
    config: EngineConfig,
    sessions: SessionRegistry,
    rooms: RoomManager,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            sessions: SessionRegistry::new(),
            rooms: RoomManager::new(),
        }
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn rooms(&self) -> &RoomManager {
        &self.rooms
    }

    /// Decodes one datagram and routes it to its handler. Framing errors
    /// and unknown commands are logged and dropped; they never abort the
    /// loop.
    pub fn handle_datagram(
        &mut self,
        buffer: &[u8],
        sender: SocketAddr,
        now: u64,
        out: &mut Vec<Outbound>,
    ) {
        let (_, command) = match shared::decode_client_packet(buffer) {
            Ok(decoded) => decoded,
            Err(error) => {
                warn!(
                    "dropping {}-byte packet from {}: {}",
                    buffer.len(),
                    sender,
                    error
                );
                return;
            }
        };

        match command {
            ClientCommand::Join { name } => self.handle_join(sender, name, now, out),
            ClientCommand::CreateRoom => self.handle_create_room(sender, now, out),
            ClientCommand::Challenge { room_id } => {
                self.handle_challenge(sender, room_id, now, out)
            }
            ClientCommand::Move { cell } => self.handle_move(sender, cell, now, out),
            ClientCommand::Quit => self.handle_quit(sender, out),
        }
    }

    /// A join from an endpoint that already has a session kicks the stale
    /// session and does NOT admit the new one; the sender has to resend
    /// the join. Fresh sessions get one announce per open room.
    fn handle_join(
        &mut self,
        sender: SocketAddr,
        name: String,
        now: u64,
        out: &mut Vec<Outbound>,
    ) {
        if self.sessions.contains(&sender) {
            info!("{sender} has already joined, kicking the stale session");
            self.remove_session(sender, "has been kicked", out);
            return;
        }

        self.sessions.insert(sender, name.clone(), now);
        info!(
            "player \"{}\" joined from {} | {} players on server",
            name,
            sender,
            self.sessions.len()
        );

        self.send_open_rooms_to(sender, out);
    }

    fn handle_create_room(&mut self, sender: SocketAddr, now: u64, out: &mut Vec<Outbound>) {
        let (player, name) = match self.sessions.get(&sender) {
            None => {
                warn!("unknown player from {sender}");
                return;
            }
            Some(session) if session.assignment.is_some() => {
                info!("player \"{}\" already has a room", session.name);
                return;
            }
            Some(session) => (session.id, session.name.clone()),
        };

        let room_id = self.rooms.create(player);
        if let Some(session) = self.sessions.get_mut(&sender) {
            session.assignment = Some(Assignment {
                room: room_id,
                is_owner: true,
            });
            session.last_seen = now;
        }
        info!("room {room_id} created for player \"{name}\" [{sender}]");

        self.broadcast_open_rooms(out);
    }

    fn handle_challenge(
        &mut self,
        sender: SocketAddr,
        room_id: RoomId,
        now: u64,
        out: &mut Vec<Outbound>,
    ) {
        let (player, name) = match self.sessions.get(&sender) {
            None => {
                warn!("unknown player from {sender}");
                return;
            }
            Some(session) if session.assignment.is_some() => {
                info!("player \"{}\" is already in a room", session.name);
                return;
            }
            Some(session) => (session.id, session.name.clone()),
        };

        let owner = match self.rooms.get(room_id) {
            None => {
                info!("unknown room {room_id}");
                return;
            }
            Some(room) if !room.is_door_open() => {
                info!("room {room_id} is closed");
                return;
            }
            Some(room) => room.owner(),
        };

        if let Some(session) = self.sessions.get_mut(&sender) {
            session.assignment = Some(Assignment {
                room: room_id,
                is_owner: false,
            });
            session.last_seen = now;
        }
        self.sessions.touch_player(owner, now);
        self.rooms.seat_challenger(room_id, player);
        info!("player \"{name}\" took the challenge, game on room {room_id} started");

        // The room left the open index; rebroadcast what remains.
        self.broadcast_open_rooms(out);

        if let Some(room) = self.rooms.get_mut(room_id) {
            room.reset(false);
        }
        let start = shared::encode_start_game();
        for addr in self.sessions.in_room(room_id) {
            out.push(Outbound {
                addr,
                bytes: start.clone(),
            });
        }
    }

    fn handle_move(&mut self, sender: SocketAddr, cell: usize, now: u64, out: &mut Vec<Outbound>) {
        let (player, name, room_id) = match self.sessions.get(&sender) {
            None => {
                warn!("unknown player from {sender}");
                return;
            }
            Some(session) => match session.assignment {
                None => {
                    info!("player \"{}\" is not in a room", session.name);
                    return;
                }
                Some(assignment) => (session.id, session.name.clone(), assignment.room),
            },
        };

        let (symbols, outcome) = {
            let room = match self.rooms.get_mut(room_id) {
                Some(room) => room,
                None => {
                    warn!("session of \"{name}\" points at missing room {room_id}");
                    return;
                }
            };

            if let Err(error) = room.try_move(player, cell) {
                info!("player \"{name}\" did an invalid move: {error}");
                return;
            }

            let outcome = if let Some(winner) = room.winner_id() {
                room.mark_ended(now);
                Some(Outcome::Won(winner))
            } else if room.is_draw() {
                room.mark_ended(now);
                Some(Outcome::Draw)
            } else {
                None
            };
            (room.symbols(), outcome)
        };

        self.sessions.touch(&sender, now);

        let update = shared::encode_update_field(&symbols);
        for addr in self.sessions.in_room(room_id) {
            out.push(Outbound {
                addr,
                bytes: update.clone(),
            });
        }

        match outcome {
            Some(Outcome::Won(winner)) => {
                let winner_name = self
                    .sessions
                    .find_by_player(winner)
                    .map(|session| session.name.clone())
                    .unwrap_or_default();
                info!("player \"{winner_name}\" won on room {room_id}");
            }
            Some(Outcome::Draw) => info!("room {room_id} ended in a draw"),
            None => {}
        }
    }

    fn handle_quit(&mut self, sender: SocketAddr, out: &mut Vec<Outbound>) {
        if self.sessions.contains(&sender) {
            self.remove_session(sender, "has quit", out);
        } else {
            warn!("unknown player from {sender}");
        }
    }

    /// The one teardown path shared by quit, kick and liveness eviction.
    /// A leaving challenger reopens the room; a leaving owner dissolves
    /// it and frees the challenger back to the lobby. Affected clients
    /// get a reset, then the open-room set is rebroadcast.
    fn remove_session(&mut self, addr: SocketAddr, reason: &str, out: &mut Vec<Outbound>) {
        let (name, assignment) = match self.sessions.get(&addr) {
            None => return,
            Some(session) => (session.name.clone(), session.assignment),
        };

        let assignment = match assignment {
            None => {
                self.sessions.remove(&addr);
                info!("player \"{name}\" {reason}");
                return;
            }
            Some(assignment) => assignment,
        };

        let room_id = assignment.room;
        if self.rooms.get(room_id).is_none() {
            warn!("session of \"{name}\" points at missing room {room_id}");
            self.sessions.remove(&addr);
            info!("player \"{name}\" {reason}");
            return;
        }

        // Reset everyone still pointing at the room, the leaver included.
        let reset = shared::encode_reset_client();
        for member in self.sessions.in_room(room_id) {
            out.push(Outbound {
                addr: member,
                bytes: reset.clone(),
            });
        }

        if assignment.is_owner {
            self.rooms.destroy(room_id);
            self.sessions.clear_room(room_id);
            info!("room {room_id} destroyed");
        } else {
            self.rooms.release_challenger(room_id);
        }

        self.sessions.remove(&addr);
        info!("player \"{name}\" {reason}");

        self.broadcast_open_rooms(out);
    }

    /// Soft-resets every room whose end stamp has outlived the grace
    /// period and rebroadcasts the cleared board, returning the room to
    /// play with a fresh random first turn.
    pub fn sweep_ended_challenges(&mut self, now: u64, out: &mut Vec<Outbound>) {
        let due: Vec<RoomId> = self
            .rooms
            .iter()
            .filter(|room| {
                room.ended_at()
                    .map_or(false, |ended| now.saturating_sub(ended) > self.config.grace_period_secs)
            })
            .map(|room| room.id())
            .collect();

        for room_id in due {
            let symbols = match self.rooms.get_mut(room_id) {
                None => continue,
                Some(room) => {
                    room.reset(false);
                    room.symbols()
                }
            };
            debug!("room {room_id}: grace period over, field cleared");

            let update = shared::encode_update_field(&symbols);
            for addr in self.sessions.in_room(room_id) {
                out.push(Outbound {
                    addr,
                    bytes: update.clone(),
                });
            }
        }
    }

    /// Evicts every session that has been silent past its threshold: the
    /// short in-game timeout while its room's door is closed, the long
    /// idle timeout otherwise. Eviction runs through the quit teardown.
    pub fn sweep_liveness(&mut self, now: u64, out: &mut Vec<Outbound>) {
        let expired: Vec<SocketAddr> = self
            .sessions
            .iter()
            .filter(|(_, session)| {
                let in_closed_room = session
                    .assignment
                    .and_then(|assignment| self.rooms.get(assignment.room))
                    .map_or(false, |room| !room.is_door_open());
                let timeout = if in_closed_room {
                    self.config.game_timeout_secs
                } else {
                    self.config.idle_timeout_secs
                };
                session.is_timed_out(now, timeout)
            })
            .map(|(addr, _)| *addr)
            .collect();

        for addr in expired {
            self.remove_session(addr, "timed out", out);
        }
    }

    fn send_open_rooms_to(&self, addr: SocketAddr, out: &mut Vec<Outbound>) {
        for room_id in self.rooms.open_rooms() {
            out.push(Outbound {
                addr,
                bytes: shared::encode_announce_room(room_id),
            });
        }
    }

    /// One announce per open room, to every session still in the lobby.
    fn broadcast_open_rooms(&self, out: &mut Vec<Outbound>) {
        if !self.rooms.has_open_rooms() {
            return;
        }
        for addr in self.sessions.unassigned() {
            self.send_open_rooms_to(addr, out);
        }
    }
}
