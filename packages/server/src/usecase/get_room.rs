//! UseCase: fetch a room

use std::sync::Arc;

use crate::domain::{Room, RoomId, RoomRepository};

use super::error::RoomError;

pub struct GetRoomUseCase {
    repository: Arc<dyn RoomRepository>,
}

impl GetRoomUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self { repository }
    }

    pub async fn execute(&self, room_id: String) -> Result<Room, RoomError> {
        // a malformed id cannot name a stored room
        let Ok(id) = RoomId::new(room_id.clone()) else {
            return Err(RoomError::NotFound(room_id));
        };
        self.repository
            .find(&id)
            .await
            .ok_or(RoomError::NotFound(room_id))
    }
}
