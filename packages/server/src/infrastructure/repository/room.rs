//! InMemory Room Repository
//!
//! Rooms are stored by value. `save` overwrites whatever is stored, so two
//! concurrent read-modify-write cycles can lose an update. Room writes are
//! last-writer-wins throughout the system.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{RepositoryError, Room, RoomId, RoomRepository};

#[derive(Default)]
pub struct InMemoryRoomRepository {
    rooms: Mutex<HashMap<RoomId, Room>>,
}

impl InMemoryRoomRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn find(&self, id: &RoomId) -> Option<Room> {
        self.rooms.lock().await.get(id).cloned()
    }

    async fn insert(&self, room: Room) -> Result<(), RepositoryError> {
        let mut rooms = self.rooms.lock().await;
        if rooms.contains_key(&room.id) {
            return Err(RepositoryError::AlreadyExists(room.id.into_string()));
        }
        rooms.insert(room.id.clone(), room);
        Ok(())
    }

    async fn save(&self, room: Room) -> Result<(), RepositoryError> {
        let mut rooms = self.rooms.lock().await;
        if !rooms.contains_key(&room.id) {
            return Err(RepositoryError::NotFound(room.id.into_string()));
        }
        rooms.insert(room.id.clone(), room);
        Ok(())
    }
}
