//! Conversion between domain entities and the shared wire DTOs.

use turup_shared::dto::{PlayerDto, RoomDto, UserDto};

use crate::domain::{Player, Room, User};

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id.into_string(),
            external_id: user.external_id,
            username: user.username,
            display_name: user.display_name,
            email: user.email,
            created_at: user.created_at.value(),
        }
    }
}

impl From<Player> for PlayerDto {
    fn from(player: Player) -> Self {
        Self {
            id: player.id.into_string(),
            name: player.name,
            team: player.team,
            position: player.position,
            is_host: Some(player.is_host),
            joined_at: player.joined_at.value(),
        }
    }
}

impl From<Room> for RoomDto {
    fn from(room: Room) -> Self {
        Self {
            id: room.id.into_string(),
            created_at: room.created_at.value(),
            last_activity_at: room.last_activity_at.value(),
            game_state: room.game_state,
            players: room.players.into_iter().map(PlayerDto::from).collect(),
            creator_id: room.creator_id.map(|id| id.into_string()),
            is_public: room.is_public,
        }
    }
}
