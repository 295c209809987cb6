//! UseCase: create a room
//!
//! The creator takes seat 0 and is recorded as host. The host flag is only
//! ever written here, so clients can treat it as confirmed.

use std::sync::Arc;

use turup_shared::time::Clock;

use crate::domain::{Room, RoomIdFactory, RoomRepository, Timestamp, UserId};

use super::error::RoomError;

pub struct CreateRoomUseCase {
    repository: Arc<dyn RoomRepository>,
    clock: Arc<dyn Clock>,
}

impl CreateRoomUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    pub async fn execute(
        &self,
        creator_id: String,
        creator_name: String,
        is_public: bool,
    ) -> Result<Room, RoomError> {
        let creator_id = UserId::new(creator_id).map_err(RoomError::InvalidId)?;
        let creator_name = creator_name.trim().to_string();
        if creator_name.is_empty() {
            return Err(RoomError::EmptyName);
        }

        let room = Room::new(
            RoomIdFactory::generate(),
            creator_id,
            creator_name,
            is_public,
            Timestamp::new(self.clock.now_millis()),
        );
        self.repository
            .insert(room.clone())
            .await
            .map_err(RoomError::Repository)?;

        tracing::info!(
            "Room {} created by '{}'",
            room.id.as_str(),
            room.players[0].id.as_str()
        );
        Ok(room)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::repository::InMemoryRoomRepository;
    use turup_shared::time::FixedClock;

    #[tokio::test]
    async fn test_execute_stores_room_with_host() {
        // テスト項目: 作成者がホストとして記録されたルームが保存される
        // given (前提条件):
        let repo = Arc::new(InMemoryRoomRepository::new());
        let usecase = CreateRoomUseCase::new(repo.clone(), Arc::new(FixedClock::new(7)));

        // when (操作):
        let room = usecase
            .execute("alice".to_string(), "Alice".to_string(), true)
            .await
            .unwrap();

        // then (期待する結果):
        let stored = repo.find(&room.id).await.unwrap();
        assert_eq!(stored.host().map(|p| p.name.as_str()), Some("Alice"));
        assert_eq!(stored.created_at, Timestamp::new(7));
    }

    #[tokio::test]
    async fn test_execute_rejects_blank_name() {
        // テスト項目: 作成者名が空の場合はエラーになる
        // given (前提条件):
        let usecase = CreateRoomUseCase::new(
            Arc::new(InMemoryRoomRepository::new()),
            Arc::new(FixedClock::new(7)),
        );

        // when (操作):
        let result = usecase
            .execute("alice".to_string(), " ".to_string(), true)
            .await;

        // then (期待する結果):
        assert_eq!(result.unwrap_err(), RoomError::EmptyName);
    }
}
