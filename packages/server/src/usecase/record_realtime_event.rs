//! UseCase: server-side effects of a realtime write
//!
//! Clients publish on the pub/sub channel and then post the same
//! `{type, payload}` here. The post is a secondary write: the publish has
//! already happened and is never rolled back, whatever this returns.
//!
//! Effects:
//! - any message naming a known room bumps its last-activity time
//! - `game_state` messages replace the room's game-state blob with
//!   `payload.state` (last writer wins, no version check)

use std::sync::Arc;

use turup_shared::{dto::BroadcastMessage, time::Clock};

use crate::domain::{RoomId, RoomRepository, Timestamp};

use super::error::RealtimeEventError;

/// Message type whose payload carries a full game-state snapshot
pub const GAME_STATE_EVENT: &str = "game_state";

/// What the event did to stored state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RealtimeEffect {
    /// The payload names no room
    NoRoom,
    /// The payload names a room the server does not know
    UnknownRoom(String),
    /// Last-activity time bumped
    Touched(RoomId),
    /// Game-state blob replaced
    GameStateReplaced(RoomId),
}

pub struct RecordRealtimeEventUseCase {
    repository: Arc<dyn RoomRepository>,
    clock: Arc<dyn Clock>,
}

impl RecordRealtimeEventUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    pub async fn execute(
        &self,
        message: BroadcastMessage,
    ) -> Result<RealtimeEffect, RealtimeEventError> {
        let Some(raw_room_id) = message.room_id() else {
            tracing::debug!("Realtime event '{}' names no room", message.r#type);
            return Ok(RealtimeEffect::NoRoom);
        };

        let room = match RoomId::new(raw_room_id.to_string()) {
            Ok(id) => self.repository.find(&id).await,
            Err(_) => None,
        };
        let Some(mut room) = room else {
            tracing::warn!(
                "Realtime event '{}' for unknown room '{}'",
                message.r#type,
                raw_room_id
            );
            return Ok(RealtimeEffect::UnknownRoom(raw_room_id.to_string()));
        };

        let now = Timestamp::new(self.clock.now_millis());
        let effect = match (message.r#type.as_str(), message.payload.get("state")) {
            (GAME_STATE_EVENT, Some(state)) => {
                room.replace_game_state(state.clone(), now);
                RealtimeEffect::GameStateReplaced(room.id.clone())
            }
            (GAME_STATE_EVENT, None) => {
                tracing::warn!(
                    "game_state event for room {} carries no state; only touching",
                    room.id.as_str()
                );
                room.touch(now);
                RealtimeEffect::Touched(room.id.clone())
            }
            _ => {
                room.touch(now);
                RealtimeEffect::Touched(room.id.clone())
            }
        };

        self.repository
            .save(room)
            .await
            .map_err(RealtimeEventError::Repository)?;

        Ok(effect)
    }
}
