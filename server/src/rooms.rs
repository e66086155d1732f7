//! Room manager: the live room collection, the monotonic id allocator
//! and the open-door index.
//!
//! The open-door index must mirror the challenger seats exactly, so
//! every operation that seats or releases a challenger goes through the
//! manager instead of poking the room directly.

use crate::game::{PlayerId, Room, RoomId};
use std::collections::{BTreeSet, HashMap};

/// Room ids start above the reserved "no room" space and are never
/// reused within a process lifetime.
pub const FIRST_ROOM_ID: RoomId = 100;

#[derive(Debug)]
pub struct RoomManager {
    rooms: HashMap<RoomId, Room>,
    /// Ids whose challenger seat is empty, kept sorted so announce
    /// batches go out in a stable order.
    open_rooms: BTreeSet<RoomId>,
    next_room_id: RoomId,
}

impl Default for RoomManager {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomManager {
    pub fn new() -> Self {
        Self {
            rooms: HashMap::new(),
            open_rooms: BTreeSet::new(),
            next_room_id: FIRST_ROOM_ID,
        }
    }

    /// Creates an open room owned by `owner` and returns its id.
    pub fn create(&mut self, owner: PlayerId) -> RoomId {
        let id = self.next_room_id;
        self.next_room_id += 1;

        self.rooms.insert(id, Room::new(id, owner));
        self.open_rooms.insert(id);
        id
    }

    pub fn get(&self, id: RoomId) -> Option<&Room> {
        self.rooms.get(&id)
    }

    pub fn get_mut(&mut self, id: RoomId) -> Option<&mut Room> {
        self.rooms.get_mut(&id)
    }

    pub fn is_open(&self, id: RoomId) -> bool {
        self.open_rooms.contains(&id)
    }

    /// Seats `challenger` and closes the door in the same step.
    pub fn seat_challenger(&mut self, id: RoomId, challenger: PlayerId) {
        if let Some(room) = self.rooms.get_mut(&id) {
            room.set_challenger(challenger);
            self.open_rooms.remove(&id);
        }
    }

    /// Empties the challenger seat (full room reset) and reopens the
    /// door, making the room discoverable again.
    pub fn release_challenger(&mut self, id: RoomId) {
        if let Some(room) = self.rooms.get_mut(&id) {
            room.reset(true);
            self.open_rooms.insert(id);
        }
    }

    /// Removes the room from the collection and both indexes.
    pub fn destroy(&mut self, id: RoomId) -> Option<Room> {
        self.open_rooms.remove(&id);
        self.rooms.remove(&id)
    }

    /// Currently discoverable room ids, ascending.
    pub fn open_rooms(&self) -> impl Iterator<Item = RoomId> + '_ {
        self.open_rooms.iter().copied()
    }

    pub fn has_open_rooms(&self) -> bool {
        !self.open_rooms.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Room> {
        self.rooms.values_mut()
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_start_at_first_and_increase() {
        let mut manager = RoomManager::new();
        assert_eq!(manager.create(PlayerId(1)), FIRST_ROOM_ID);
        assert_eq!(manager.create(PlayerId(2)), FIRST_ROOM_ID + 1);
        assert_eq!(manager.create(PlayerId(3)), FIRST_ROOM_ID + 2);
        assert_eq!(manager.len(), 3);
    }

    #[test]
    fn test_ids_are_never_reused() {
        let mut manager = RoomManager::new();
        let first = manager.create(PlayerId(1));
        manager.destroy(first);
        let second = manager.create(PlayerId(1));
        assert!(second > first);
    }

    #[test]
    fn test_open_index_follows_challenger_seat() {
        let mut manager = RoomManager::new();
        let id = manager.create(PlayerId(1));
        assert!(manager.is_open(id));

        manager.seat_challenger(id, PlayerId(2));
        assert!(!manager.is_open(id));
        assert!(!manager.get(id).unwrap().is_door_open());

        manager.release_challenger(id);
        assert!(manager.is_open(id));
        assert!(manager.get(id).unwrap().is_door_open());
    }

    #[test]
    fn test_destroy_purges_both_indexes() {
        let mut manager = RoomManager::new();
        let id = manager.create(PlayerId(1));

        let destroyed = manager.destroy(id).unwrap();
        assert_eq!(destroyed.id(), id);
        assert!(manager.get(id).is_none());
        assert!(!manager.is_open(id));
        assert!(manager.is_empty());
    }

    #[test]
    fn test_open_rooms_sorted() {
        let mut manager = RoomManager::new();
        let a = manager.create(PlayerId(1));
        let b = manager.create(PlayerId(2));
        let c = manager.create(PlayerId(3));
        manager.seat_challenger(b, PlayerId(4));

        let open: Vec<RoomId> = manager.open_rooms().collect();
        assert_eq!(open, vec![a, c]);
    }
}
