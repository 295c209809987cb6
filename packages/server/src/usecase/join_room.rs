//! UseCase: take a seat in a room

use std::sync::Arc;

use turup_shared::time::Clock;

use crate::domain::{Player, RoomId, RoomRepository, RoomRuleError, Timestamp, UserId};

use super::error::RoomError;

pub struct JoinRoomUseCase {
    repository: Arc<dyn RoomRepository>,
    clock: Arc<dyn Clock>,
}

impl JoinRoomUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Seat the player and return the seat. Rejoining returns the held seat.
    pub async fn execute(
        &self,
        room_id: String,
        player_id: String,
        name: String,
    ) -> Result<Player, RoomError> {
        let Ok(id) = RoomId::new(room_id.clone()) else {
            return Err(RoomError::NotFound(room_id));
        };
        let player_id = UserId::new(player_id).map_err(RoomError::InvalidId)?;
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(RoomError::EmptyName);
        }

        let mut room = self
            .repository
            .find(&id)
            .await
            .ok_or(RoomError::NotFound(room_id))?;

        let now = Timestamp::new(self.clock.now_millis());
        let player = room
            .seat_player(player_id, name, now)
            .map_err(|e| match e {
                RoomRuleError::RoomFull(max) => RoomError::RoomFull(max),
            })?;

        self.repository
            .save(room)
            .await
            .map_err(RoomError::Repository)?;

        tracing::info!(
            "Player '{}' seated at position {} in room {}",
            player.id.as_str(),
            player.position,
            id.as_str()
        );
        Ok(player)
    }
}
