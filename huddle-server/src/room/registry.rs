use crate::room::Room;
use std::collections::HashMap;
use tracing::info;

/// Mapping from meeting id to live room state.
///
/// Owned exclusively by the coordinator task — not an ambient global — so
/// creation is naturally race-free: no two concurrent creates for the same
/// meeting id can produce two distinct rooms.
#[derive(Default)]
pub struct RoomRegistry {
    rooms: HashMap<String, Room>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rooms are created lazily on first join.
    pub fn get_or_create(&mut self, meeting_id: &str) -> &mut Room {
        self.rooms.entry(meeting_id.to_string()).or_insert_with(|| {
            info!("Creating new room: {}", meeting_id);
            Room::new(meeting_id)
        })
    }

    pub fn get(&self, meeting_id: &str) -> Option<&Room> {
        self.rooms.get(meeting_id)
    }

    pub fn get_mut(&mut self, meeting_id: &str) -> Option<&mut Room> {
        self.rooms.get_mut(meeting_id)
    }

    pub fn remove(&mut self, meeting_id: &str) -> Option<Room> {
        let removed = self.rooms.remove(meeting_id);
        if removed.is_some() {
            info!("Destroying room: {}", meeting_id);
        }
        removed
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
    fn get_or_create_returns_the_same_room() {
        let mut registry = RoomRegistry::new();
        registry.get_or_create("M1");
        registry.get_or_create("M1");
        assert_eq!(registry.len(), 1);
        assert!(registry.get("M1").is_some());
    }

    #[test]
    fn removed_room_is_no_longer_resolvable() {
        let mut registry = RoomRegistry::new();
        registry.get_or_create("M1");
        assert!(registry.remove("M1").is_some());
        assert!(registry.get("M1").is_none());
        assert!(registry.remove("M1").is_none());
    }
}
