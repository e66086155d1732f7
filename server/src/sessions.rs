//! Session registry: endpoint-keyed player sessions and their liveness
//! timestamps.
//!
//! The registry is the single source of truth for who is connected. A
//! session is created on a valid join, refreshed on every accepted
//! command from its endpoint, and destroyed on quit, liveness timeout or
//! forced kick. Rooms never hold references into the registry; they
//! refer to players by [`PlayerId`] and the registry resolves ids back
//! to endpoints when datagrams need sending.

use crate::game::{PlayerId, RoomId};
use std::collections::HashMap;
use std::net::SocketAddr;

/// A session's room membership: which room, and which seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment {
    pub room: RoomId,
    pub is_owner: bool,
}

/// One connected player.
#[derive(Debug, Clone)]
pub struct Session {
    /// Stable identity used by rooms for seat and turn checks.
    pub id: PlayerId,
    /// Display name chosen at join. Not necessarily unique.
    pub name: String,
    /// Transport endpoint; also the registry key.
    pub addr: SocketAddr,
    /// Current room membership, if any.
    pub assignment: Option<Assignment>,
    /// Wall-clock second of the last accepted packet from this endpoint.
    pub last_seen: u64,
}

impl Session {
    /// True once the endpoint has been silent longer than `timeout`.
    pub fn is_timed_out(&self, now: u64, timeout: u64) -> bool {
        now.saturating_sub(self.last_seen) > timeout
    }
}

/// All connected sessions, keyed by their network endpoint.
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: HashMap<SocketAddr, Session>,
    next_player_id: u32,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
            next_player_id: 1,
        }
    }

    /// Registers a new session and hands out the next player id.
    pub fn insert(&mut self, addr: SocketAddr, name: String, now: u64) -> PlayerId {
        let id = PlayerId(self.next_player_id);
        self.next_player_id += 1;

        self.sessions.insert(
            addr,
            Session {
                id,
                name,
                addr,
                assignment: None,
                last_seen: now,
            },
        );
        id
    }

    pub fn contains(&self, addr: &SocketAddr) -> bool {
        self.sessions.contains_key(addr)
    }

    pub fn get(&self, addr: &SocketAddr) -> Option<&Session> {
        self.sessions.get(addr)
    }

    pub fn get_mut(&mut self, addr: &SocketAddr) -> Option<&mut Session> {
        self.sessions.get_mut(addr)
    }

    pub fn remove(&mut self, addr: &SocketAddr) -> Option<Session> {
        self.sessions.remove(addr)
    }

    /// Refreshes the liveness stamp of the session behind `addr`.
    pub fn touch(&mut self, addr: &SocketAddr, now: u64) {
        if let Some(session) = self.sessions.get_mut(addr) {
            session.last_seen = now;
        }
    }

    /// Refreshes a session found by player id rather than endpoint.
    pub fn touch_player(&mut self, player: PlayerId, now: u64) {
        if let Some(session) = self.sessions.values_mut().find(|session| session.id == player) {
            session.last_seen = now;
        }
    }

    pub fn find_by_player(&self, player: PlayerId) -> Option<&Session> {
        self.sessions.values().find(|session| session.id == player)
    }

    /// Endpoints of every session assigned to `room`, in no particular
    /// order. Used for per-room broadcasts.
    pub fn in_room(&self, room: RoomId) -> Vec<SocketAddr> {
        self.sessions
            .values()
            .filter(|session| session.assignment.map(|a| a.room) == Some(room))
            .map(|session| session.addr)
            .collect()
    }

    /// Endpoints of every session with no room membership. These are the
    /// discovery-broadcast targets.
    pub fn unassigned(&self) -> Vec<SocketAddr> {
        self.sessions
            .values()
            .filter(|session| session.assignment.is_none())
            .map(|session| session.addr)
            .collect()
    }

    /// Drops the room membership of every session pointing at `room`.
    pub fn clear_room(&mut self, room: RoomId) {
        for session in self.sessions.values_mut() {
            if session.assignment.map(|a| a.room) == Some(room) {
                session.assignment = None;
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SocketAddr, &Session)> {
        self.sessions.iter()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
