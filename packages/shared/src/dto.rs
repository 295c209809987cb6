//! Wire DTOs shared by the server and the client.
//!
//! - [`BroadcastMessage`] / [`BroadcastEnvelope`]: pub/sub payloads
//! - [`HubFrame`]: framing spoken on the `/realtime` hub socket
//! - [`SocketFrame`]: raw `/api/socket` frames
//! - user and room REST bodies

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Prefix of every pub/sub topic bound to a room
pub const ROOM_TOPIC_PREFIX: &str = "room:";

/// Build the pub/sub topic name of a room (`room:<roomId>`)
pub fn room_topic(room_id: &str) -> String {
    format!("{}{}", ROOM_TOPIC_PREFIX, room_id)
}

/// Tagged application message `{type, payload}`.
///
/// No schema is enforced on `payload`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastMessage {
    pub r#type: String,
    #[serde(default)]
    pub payload: Value,
}

impl BroadcastMessage {
    pub fn new(r#type: impl Into<String>, payload: Value) -> Self {
        Self {
            r#type: r#type.into(),
            payload,
        }
    }

    /// Room id carried in the payload, if any (`room_id` or `roomId`)
    pub fn room_id(&self) -> Option<&str> {
        self.payload
            .get("room_id")
            .or_else(|| self.payload.get("roomId"))
            .and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeType {
    Broadcast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeEvent {
    Message,
}

/// Pub/sub wire message: `{type: "broadcast", event: "message", payload: {type, payload}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastEnvelope {
    pub r#type: EnvelopeType,
    pub event: EnvelopeEvent,
    pub payload: BroadcastMessage,
}

impl From<BroadcastMessage> for BroadcastEnvelope {
    fn from(payload: BroadcastMessage) -> Self {
        Self {
            r#type: EnvelopeType::Broadcast,
            event: EnvelopeEvent::Message,
            payload,
        }
    }
}

/// Frames exchanged with the pub/sub hub
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HubFrame {
    /// client → hub: subscribe to a topic
    Join { topic: String },
    /// hub → client: subscription acknowledged
    Joined { topic: String },
    /// client → hub: unsubscribe from a topic
    Leave { topic: String },
    /// both directions: a message published on a topic
    Broadcast {
        topic: String,
        envelope: BroadcastEnvelope,
    },
    /// hub → client: a request on the topic was rejected
    Error { topic: String, reason: String },
}

/// Raw socket frame: a JSON object with a `type` field plus arbitrary fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocketFrame {
    pub r#type: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl SocketFrame {
    pub fn new(r#type: impl Into<String>) -> Self {
        Self {
            r#type: r#type.into(),
            fields: Map::new(),
        }
    }

    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }
}

/// Response of `POST /api/realtime`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealtimeResponse {
    pub success: bool,
}

/// Error body returned by the REST handlers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// User as returned by `GET /api/users/{id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDto {
    pub id: String,
    pub external_id: Option<String>,
    pub username: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub created_at: i64,
}

/// Body of `POST /api/users`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CreateUserRequest {
    /// Explicit id; generated when omitted
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub external_id: Option<String>,
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Player seat inside a room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerDto {
    pub id: String,
    pub name: String,
    pub team: u8,
    pub position: u8,
    #[serde(default)]
    pub is_host: Option<bool>,
    pub joined_at: i64,
}

/// Room as returned by the room endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomDto {
    pub id: String,
    pub created_at: i64,
    pub last_activity_at: i64,
    #[serde(default)]
    pub game_state: Value,
    pub players: Vec<PlayerDto>,
    #[serde(default)]
    pub creator_id: Option<String>,
    pub is_public: bool,
}

/// Body of `POST /api/rooms`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRoomRequest {
    pub creator_id: String,
    pub creator_name: String,
    #[serde(default = "default_public")]
    pub is_public: bool,
}

fn default_public() -> bool {
    true
}

/// Body of `POST /api/rooms/{id}/players`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRoomRequest {
    pub player_id: String,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_wire_format() {
        // テスト項目: エンベロープが broadcast/message 形式でシリアライズされる
        // given (前提条件):
        let message = BroadcastMessage::new("chat", json!({"text": "hi"}));

        // when (操作):
        let envelope = BroadcastEnvelope::from(message);
        let value = serde_json::to_value(&envelope).unwrap();

        // then (期待する結果):
        assert_eq!(
            value,
            json!({
                "type": "broadcast",
                "event": "message",
                "payload": {"type": "chat", "payload": {"text": "hi"}}
            })
        );
    }

    #[test]
    fn test_hub_frame_is_tagged_by_kind() {
        // テスト項目: HubFrame が kind タグ付きで表現される
        // given (前提条件):
        let text = r#"{"kind":"join","topic":"room:abc"}"#;

        // when (操作):
        let frame: HubFrame = serde_json::from_str(text).unwrap();

        // then (期待する結果):
        assert_eq!(
            frame,
            HubFrame::Join {
                topic: "room:abc".to_string()
            }
        );
    }

    #[test]
    fn test_socket_frame_flattens_fields() {
        // テスト項目: SocketFrame の追加フィールドがトップレベルに展開される
        // given (前提条件):
        let frame = SocketFrame::new("play_card").with_field("card", json!("AS"));

        // when (操作):
        let value = serde_json::to_value(&frame).unwrap();

        // then (期待する結果):
        assert_eq!(value, json!({"type": "play_card", "card": "AS"}));
    }

    #[test]
    fn test_socket_frame_requires_type() {
        // テスト項目: type フィールドのないフレームはパースに失敗する
        // given (前提条件):
        let text = r#"{"card":"AS"}"#;

        // when (操作):
        let result = serde_json::from_str::<SocketFrame>(text);

        // then (期待する結果):
        assert!(result.is_err());
    }

    #[test]
    fn test_broadcast_message_room_id_accepts_both_spellings() {
        // テスト項目: payload の room_id / roomId の両方からルーム ID を取得できる
        // given (前提条件):
        let snake = BroadcastMessage::new("x", json!({"room_id": "r1"}));
        let camel = BroadcastMessage::new("x", json!({"roomId": "r2"}));
        let none = BroadcastMessage::new("x", json!(null));

        // when (操作) / then (期待する結果):
        assert_eq!(snake.room_id(), Some("r1"));
        assert_eq!(camel.room_id(), Some("r2"));
        assert_eq!(none.room_id(), None);
    }

    #[test]
    fn test_room_topic() {
        assert_eq!(room_topic("abc"), "room:abc");
    }
}
