//! In-process integration tests: the router is served on an ephemeral port
//! and driven over real HTTP and WebSocket connections.

use std::{sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::TcpListener;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use turup_server::ui::{AppState, router};
use turup_shared::dto::{BroadcastMessage, HubFrame, PlayerDto, RoomDto, UserDto};

/// Start the server and return its base address (`127.0.0.1:port`)
async fn start_server(api_key: Option<&str>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = Arc::new(AppState::in_memory(api_key.map(str::to_string)));
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });
    addr.to_string()
}

async fn next_text<S>(stream: &mut S) -> String
where
    S: StreamExt<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(2), stream.next())
            .await
            .expect("timed out waiting for frame")
            .expect("stream ended")
            .expect("websocket error");
        if let Message::Text(text) = msg {
            return text.as_str().to_string();
        }
    }
}

#[tokio::test]
async fn test_user_lookup_by_primary_and_external_id() {
    // テスト項目: ユーザー作成後、主 ID と外部 ID の両方で取得できる
    // given (前提条件):
    let addr = start_server(None).await;
    let client = reqwest::Client::new();
    let created = client
        .post(format!("http://{}/api/users", addr))
        .json(&json!({"id": "u1", "external_id": "auth-99", "username": "alice"}))
        .send()
        .await
        .unwrap();
    assert_eq!(created.status(), 201);

    // when (操作):
    let by_id: UserDto = client
        .get(format!("http://{}/api/users/u1", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let by_external: UserDto = client
        .get(format!("http://{}/api/users/auth-99", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let missing = client
        .get(format!("http://{}/api/users/nobody", addr))
        .send()
        .await
        .unwrap();

    // then (期待する結果):
    assert_eq!(by_id.username, "alice");
    assert_eq!(by_external.id, "u1");
    assert_eq!(missing.status(), 404);
}

#[tokio::test]
async fn test_create_user_failure_is_bad_request() {
    // テスト項目: ユーザー作成に失敗した場合は 400 が返る
    // given (前提条件):
    let addr = start_server(None).await;
    let client = reqwest::Client::new();

    // when (操作):
    let response = client
        .post(format!("http://{}/api/users", addr))
        .json(&json!({"username": "   "}))
        .send()
        .await
        .unwrap();

    // then (期待する結果):
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_room_lifecycle_and_realtime_fallback() {
    // テスト項目: ルーム作成・参加・realtime フォールバック書き込みが反映される
    // given (前提条件):
    let addr = start_server(None).await;
    let client = reqwest::Client::new();
    let room: RoomDto = client
        .post(format!("http://{}/api/rooms", addr))
        .json(&json!({"creator_id": "alice", "creator_name": "Alice"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // when (操作):
    let bob: PlayerDto = client
        .post(format!("http://{}/api/rooms/{}/players", addr, room.id))
        .json(&json!({"player_id": "bob", "name": "Bob"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let realtime = client
        .post(format!("http://{}/api/realtime", addr))
        .json(&BroadcastMessage::new(
            "game_state",
            json!({"room_id": room.id, "state": {"trump": "spades"}}),
        ))
        .send()
        .await
        .unwrap();
    let fetched: RoomDto = client
        .get(format!("http://{}/api/rooms/{}", addr, room.id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // then (期待する結果):
    assert_eq!(bob.position, 1);
    assert_eq!(realtime.status(), 200);
    assert_eq!(fetched.players.len(), 2);
    assert_eq!(fetched.players[0].is_host, Some(true));
    assert_eq!(fetched.game_state, json!({"trump": "spades"}));
}

#[tokio::test]
async fn test_full_room_is_conflict_and_unknown_room_is_not_found() {
    // テスト項目: 満席のルームへの 5 人目の参加は 409、存在しないルームの取得は 404
    // given (前提条件):
    let addr = start_server(None).await;
    let client = reqwest::Client::new();
    let room: RoomDto = client
        .post(format!("http://{}/api/rooms", addr))
        .json(&json!({"creator_id": "p0", "creator_name": "P0"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    for seat in 1..4 {
        let response = client
            .post(format!("http://{}/api/rooms/{}/players", addr, room.id))
            .json(&json!({"player_id": format!("p{}", seat), "name": format!("P{}", seat)}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }

    // when (操作):
    let fifth = client
        .post(format!("http://{}/api/rooms/{}/players", addr, room.id))
        .json(&json!({"player_id": "p4", "name": "P4"}))
        .send()
        .await
        .unwrap();
    let unknown = client
        .get(format!("http://{}/api/rooms/unknown", addr))
        .send()
        .await
        .unwrap();

    // then (期待する結果):
    assert_eq!(fifth.status(), 409);
    assert_eq!(unknown.status(), 404);
}

#[tokio::test]
async fn test_hub_relays_between_subscribers() {
    // テスト項目: 同じトピックを購読した別の接続にメッセージが中継される
    // given (前提条件):
    let addr = start_server(None).await;
    let (mut alice, _) = connect_async(format!("ws://{}/realtime", addr)).await.unwrap();
    let (mut bob, _) = connect_async(format!("ws://{}/realtime", addr)).await.unwrap();
    for ws in [&mut alice, &mut bob] {
        let join = serde_json::to_string(&HubFrame::Join {
            topic: "room:r1".to_string(),
        })
        .unwrap();
        ws.send(Message::Text(join.into())).await.unwrap();
        let ack: HubFrame = serde_json::from_str(&next_text(ws).await).unwrap();
        assert!(matches!(ack, HubFrame::Joined { .. }));
    }

    // when (操作):
    let publish = HubFrame::Broadcast {
        topic: "room:r1".to_string(),
        envelope: BroadcastMessage::new("chat", json!({"text": "hi"})).into(),
    };
    alice
        .send(Message::Text(serde_json::to_string(&publish).unwrap().into()))
        .await
        .unwrap();

    // then (期待する結果):
    let received: HubFrame = serde_json::from_str(&next_text(&mut bob).await).unwrap();
    assert_eq!(received, publish);
}

#[tokio::test]
async fn test_hub_rejects_wrong_api_key() {
    // テスト項目: API キーが一致しない hub 接続は拒否される
    // given (前提条件):
    let addr = start_server(Some("secret")).await;

    // when (操作):
    let result = connect_async(format!("ws://{}/realtime?apikey=wrong", addr)).await;
    let accepted = connect_async(format!("ws://{}/realtime?apikey=secret", addr)).await;

    // then (期待する結果):
    assert!(result.is_err());
    assert!(accepted.is_ok());
}

#[tokio::test]
async fn test_socket_relay_forwards_typed_frames() {
    // テスト項目: raw socket に送ったフレームが他の接続に届く
    // given (前提条件):
    let addr = start_server(None).await;
    let (mut a, _) = connect_async(format!("ws://{}/api/socket", addr)).await.unwrap();
    let (mut b, _) = connect_async(format!("ws://{}/api/socket", addr)).await.unwrap();
    // both sockets must be registered before sending
    tokio::time::sleep(Duration::from_millis(100)).await;

    // when (操作):
    a.send(Message::Text(r#"{"type":"ping","n":1}"#.into()))
        .await
        .unwrap();

    // then (期待する結果):
    let text = next_text(&mut b).await;
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value, json!({"type": "ping", "n": 1}));
}
