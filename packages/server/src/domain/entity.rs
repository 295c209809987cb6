//! Entities: users, rooms and the players seated in them.

use serde::Serialize;
use serde_json::Value;

use super::{
    error::RoomRuleError,
    value_object::{RoomId, Timestamp, UserId},
};

/// Registered user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: UserId,
    /// Id issued by the external identity provider, if linked
    pub external_id: Option<String>,
    pub username: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub created_at: Timestamp,
}

/// A seat taken by a user inside a room
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Player {
    pub id: UserId,
    pub name: String,
    /// 0 or 1; partners sit opposite each other
    pub team: u8,
    pub position: u8,
    /// Set by the server when the room is created. Never inferred.
    pub is_host: bool,
    pub joined_at: Timestamp,
}

/// Game room
///
/// `game_state` is an opaque blob owned by whoever wrote it last.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Room {
    pub id: RoomId,
    pub created_at: Timestamp,
    pub last_activity_at: Timestamp,
    pub game_state: Value,
    pub players: Vec<Player>,
    pub creator_id: Option<UserId>,
    pub is_public: bool,
}

impl Room {
    /// Four seats, two teams.
    pub const MAX_PLAYERS: usize = 4;

    /// Create a room with its creator seated at position 0 as host.
    pub fn new(
        id: RoomId,
        creator_id: UserId,
        creator_name: String,
        is_public: bool,
        now: Timestamp,
    ) -> Self {
        let creator = Player {
            id: creator_id.clone(),
            name: creator_name,
            team: 0,
            position: 0,
            is_host: true,
            joined_at: now,
        };
        Self {
            id,
            created_at: now,
            last_activity_at: now,
            game_state: Value::Null,
            players: vec![creator],
            creator_id: Some(creator_id),
            is_public,
        }
    }

    /// Seat a player at the next free position.
    ///
    /// Seating someone who already holds a seat returns the existing seat.
    pub fn seat_player(
        &mut self,
        id: UserId,
        name: String,
        now: Timestamp,
    ) -> Result<Player, RoomRuleError> {
        if let Some(existing) = self.players.iter().find(|p| p.id == id) {
            return Ok(existing.clone());
        }
        if self.players.len() >= Self::MAX_PLAYERS {
            return Err(RoomRuleError::RoomFull(Self::MAX_PLAYERS));
        }

        let position = self.next_free_position();
        let player = Player {
            id,
            name,
            team: position % 2,
            position,
            is_host: false,
            joined_at: now,
        };
        self.players.push(player.clone());
        self.last_activity_at = now;
        Ok(player)
    }

    fn next_free_position(&self) -> u8 {
        (0..Self::MAX_PLAYERS as u8)
            .find(|pos| self.players.iter().all(|p| p.position != *pos))
            .unwrap_or(self.players.len() as u8)
    }

    /// The host recorded by the server, if any
    pub fn host(&self) -> Option<&Player> {
        self.players.iter().find(|p| p.is_host)
    }

    pub fn touch(&mut self, now: Timestamp) {
        if now > self.last_activity_at {
            self.last_activity_at = now;
        }
    }

    /// Overwrite the game-state blob. Last writer wins.
    pub fn replace_game_state(&mut self, state: Value, now: Timestamp) {
        self.game_state = state;
        self.touch(now);
    }
}
