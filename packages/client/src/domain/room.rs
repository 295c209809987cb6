//! Rooms and players as received from the server.

use serde_json::Value;
use turup_shared::dto::{PlayerDto, RoomDto};

/// A seat in a room.
///
/// `is_host` is advisory: `None` means the source did not say.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub team: u8,
    pub position: u8,
    pub is_host: Option<bool>,
    pub joined_at: i64,
}

impl Player {
    /// Player with only id and name known (e.g. tracked locally)
    pub fn named(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            team: 0,
            position: 0,
            is_host: None,
            joined_at: 0,
        }
    }

    #[must_use]
    pub fn with_host(mut self, is_host: bool) -> Self {
        self.is_host = Some(is_host);
        self
    }
}

impl From<PlayerDto> for Player {
    fn from(dto: PlayerDto) -> Self {
        Self {
            id: dto.id,
            name: dto.name,
            team: dto.team,
            position: dto.position,
            is_host: dto.is_host,
            joined_at: dto.joined_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Room {
    pub id: String,
    pub created_at: i64,
    pub last_activity_at: i64,
    pub game_state: Value,
    pub players: Vec<Player>,
    pub creator_id: Option<String>,
    pub is_public: bool,
}

impl Room {
    /// The host recorded by the server: a player explicitly flagged host.
    ///
    /// Preferred over [`crate::host::resolve_host`] whenever present.
    pub fn confirmed_host(&self) -> Option<&Player> {
        self.players.iter().find(|p| p.is_host == Some(true))
    }

    pub fn player(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }
}

impl From<RoomDto> for Room {
    fn from(dto: RoomDto) -> Self {
        Self {
            id: dto.id,
            created_at: dto.created_at,
            last_activity_at: dto.last_activity_at,
            game_state: dto.game_state,
            players: dto.players.into_iter().map(Player::from).collect(),
            creator_id: dto.creator_id,
            is_public: dto.is_public,
        }
    }
}
