use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;

use crate::room::Room;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Room already exists")]
    AlreadyExists,
    #[error("Server is at room capacity")]
    AtCapacity,
}

/// Shared application state: the registry of live rooms. The map carries
/// its own locking, independent of any per-room game lock.
pub struct AppState {
    rooms: DashMap<String, Arc<Room>>,
    max_rooms: usize,
}

impl AppState {
    pub fn new(max_rooms: usize) -> Self {
        AppState {
            rooms: DashMap::new(),
            max_rooms,
        }
    }

    pub fn create_room(&self, id: &str, m: i32, n: i32) -> Result<Arc<Room>, RegistryError> {
        if self.rooms.contains_key(id) {
            return Err(RegistryError::AlreadyExists);
        }
        if self.rooms.len() >= self.max_rooms {
            return Err(RegistryError::AtCapacity);
        }
        let room = Arc::new(Room::new(id.to_string(), m, n));
        match self.rooms.entry(id.to_string()) {
            dashmap::Entry::Occupied(_) => Err(RegistryError::AlreadyExists),
            dashmap::Entry::Vacant(entry) => {
                entry.insert(room.clone());
                Ok(room)
            }
        }
    }

    pub fn room(&self, id: &str) -> Option<Arc<Room>> {
        self.rooms.get(id).map(|entry| entry.value().clone())
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Drop every empty room past its retention window. Returns how many
    /// were removed. Removal is shard-locked, so a concurrent lookup sees
    /// either the whole room or nothing.
    pub fn reclaim_rooms(&self) -> usize {
        let before = self.rooms.len();
        self.rooms.retain(|_, room| !room.is_reclaimable());
        before - self.rooms.len()
    }
}
