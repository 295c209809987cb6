//! Realtime channel bridge.
//!
//! Each room maps to one pub/sub channel named `room:<roomId>`, owned by a
//! [`ChannelRegistry`]. Sending publishes on the channel and also posts the
//! message to the backend's HTTP endpoint; both results are reported in
//! [`SendOutcome`].

mod channel;
mod fallback;
mod registry;
mod transport;

pub use channel::{RoomChannel, SendOutcome, SubscriptionStatus};
pub use fallback::{FallbackSink, HttpFallback};
pub use registry::ChannelRegistry;
pub use transport::{EnvelopeReceiver, PubSubTransport, WebSocketPubSub};

#[cfg(test)]
pub(crate) use fallback::MockFallbackSink;


#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;
    use turup_shared::dto::BroadcastMessage;

    use super::testing::FakeTransport;
    use super::*;
    use crate::error::ClientError;

    const WAIT: Duration = Duration::from_secs(1);

    fn accepting_fallback() -> MockFallbackSink {
        let mut fallback = MockFallbackSink::new();
        fallback.expect_post().returning(|_| Ok(()));
        fallback
    }

    fn registry(transport: Arc<FakeTransport>, fallback: MockFallbackSink) -> ChannelRegistry {
        ChannelRegistry::new(transport, Arc::new(fallback))
    }

    #[tokio::test]
    async fn test_open_or_reuse_returns_same_handle() {
        // テスト項目: 同じルームに対して 2 回開くと同一のハンドルが返り、購読は 1 回だけ
        // given (前提条件):
        let transport = Arc::new(FakeTransport::default());
        let registry = registry(transport.clone(), MockFallbackSink::new());

        // when (操作):
        let first = registry.open_or_reuse("r1").await;
        let second = registry.open_or_reuse("r1").await;
        first.wait_until_subscribed(WAIT).await.unwrap();

        // then (期待する結果):
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.topic(), "room:r1");
        assert_eq!(transport.joins(), vec!["room:r1".to_string()]);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_open_creates_one_channel() {
        // テスト項目: 同時に開いてもチャネルは 1 つしか作られない
        // given (前提条件):
        let transport = Arc::new(FakeTransport::default());
        let registry = registry(transport.clone(), MockFallbackSink::new());

        // when (操作):
        let (a, b) = tokio::join!(registry.open_or_reuse("r1"), registry.open_or_reuse("r1"));
        a.wait_until_subscribed(WAIT).await.unwrap();

        // then (期待する結果):
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(transport.joins().len(), 1);
    }

    #[tokio::test]
    async fn test_send_without_channel_is_not_connected() {
        // テスト項目: チャネルがないルームへの送信はネットワークに触れず NotConnected
        // given (前提条件):
        let transport = Arc::new(FakeTransport::default());
        let mut fallback = MockFallbackSink::new();
        fallback.expect_post().never();
        let registry = registry(transport.clone(), fallback);

        // when (操作):
        let outcome = registry
            .send_message("r1", BroadcastMessage::new("chat", json!({})))
            .await;

        // then (期待する結果):
        assert!(matches!(outcome, SendOutcome::NotConnected));
        assert!(transport.published().is_empty());
    }

    #[tokio::test]
    async fn test_send_before_ack_is_not_connected() {
        // テスト項目: 購読確認前の送信は NotConnected で、確認後は送信される
        // given (前提条件):
        let transport = Arc::new(FakeTransport::manual_ack());
        let registry = registry(transport.clone(), accepting_fallback());
        let channel = registry.open_or_reuse("r1").await;

        // when (操作):
        let before = registry
            .send_message("r1", BroadcastMessage::new("chat", json!({"n": 1})))
            .await;
        transport.acknowledge();
        channel.wait_until_subscribed(WAIT).await.unwrap();
        let after = registry
            .send_message("r1", BroadcastMessage::new("chat", json!({"n": 2})))
            .await;

        // then (期待する結果):
        assert!(matches!(before, SendOutcome::NotConnected));
        assert!(after.is_complete());
        let published = transport.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].1.payload.payload, json!({"n": 2}));
    }

    #[tokio::test]
    async fn test_send_writes_both_legs() {
        // テスト項目: 送信は pub/sub への publish と HTTP フォールバックの両方を行う
        // given (前提条件):
        let transport = Arc::new(FakeTransport::default());
        let mut fallback = MockFallbackSink::new();
        fallback
            .expect_post()
            .withf(|message| message.r#type == "game_state" && message.payload["room_id"] == "r1")
            .times(1)
            .returning(|_| Ok(()));
        let registry = registry(transport.clone(), fallback);
        registry
            .open_or_reuse("r1")
            .await
            .wait_until_subscribed(WAIT)
            .await
            .unwrap();

        // when (操作):
        let outcome = registry
            .send_message(
                "r1",
                BroadcastMessage::new("game_state", json!({"room_id": "r1", "state": {}})),
            )
            .await;

        // then (期待する結果):
        assert!(outcome.is_complete());
        let published = transport.published();
        assert_eq!(published[0].0, "room:r1");
        assert_eq!(published[0].1.payload.r#type, "game_state");
    }

    #[tokio::test]
    async fn test_fallback_failure_keeps_publish() {
        // テスト項目: フォールバック失敗は publish を取り消さず、個別に報告される
        // given (前提条件):
        let transport = Arc::new(FakeTransport::default());
        let mut fallback = MockFallbackSink::new();
        fallback.expect_post().returning(|_| {
            Err(ClientError::UnexpectedStatus {
                status: 500,
                body: "boom".to_string(),
            })
        });
        let registry = registry(transport.clone(), fallback);
        let channel = registry.open_or_reuse("r1").await;
        channel.wait_until_subscribed(WAIT).await.unwrap();

        // when (操作):
        let outcome = channel
            .send(BroadcastMessage::new("chat", json!({"text": "hi"})))
            .await;

        // then (期待する結果):
        assert!(outcome.is_published());
        assert!(!outcome.is_complete());
        assert!(matches!(
            outcome,
            SendOutcome::Attempted {
                fallback: Err(ClientError::UnexpectedStatus { status: 500, .. }),
                ..
            }
        ));
        assert_eq!(transport.published().len(), 1);
    }

    #[tokio::test]
    async fn test_publish_failure_still_posts_fallback() {
        // テスト項目: publish が失敗してもフォールバックは送信される
        // given (前提条件):
        let transport = Arc::new(FakeTransport::failing_publish());
        let mut fallback = MockFallbackSink::new();
        fallback.expect_post().times(1).returning(|_| Ok(()));
        let registry = registry(transport, fallback);
        let channel = registry.open_or_reuse("r1").await;
        channel.wait_until_subscribed(WAIT).await.unwrap();

        // when (操作):
        let outcome = channel.send(BroadcastMessage::new("chat", json!({}))).await;

        // then (期待する結果):
        assert!(matches!(
            outcome,
            SendOutcome::Attempted {
                published: Err(ClientError::PublishFailed(_)),
                fallback: Ok(()),
            }
        ));
    }

    #[tokio::test]
    async fn test_inbound_messages_are_logged_and_fanned_out() {
        // テスト項目: 受信メッセージがログに追記され、ライブ購読者にも配信される
        // given (前提条件):
        let transport = Arc::new(FakeTransport::default());
        let registry = registry(transport.clone(), MockFallbackSink::new());
        let channel = registry.open_or_reuse("r1").await;
        channel.wait_until_subscribed(WAIT).await.unwrap();
        let mut live = channel.subscribe_messages();

        // when (操作):
        transport.deliver("room:r1", BroadcastMessage::new("chat", json!({"text": "a"})));
        transport.deliver("room:r1", BroadcastMessage::new("chat", json!({"text": "b"})));
        let first = live.recv().await.unwrap();
        let second = live.recv().await.unwrap();

        // then (期待する結果):
        assert_eq!(first.payload["text"], "a");
        assert_eq!(second.payload["text"], "b");
        let log = channel.messages().await;
        assert_eq!(log, vec![first, second]);
    }

    #[tokio::test]
    async fn test_rejected_subscription_reports_errored() {
        // テスト項目: 購読が拒否されるとステータスが Errored になり待機はエラーになる
        // given (前提条件):
        let transport = Arc::new(FakeTransport::rejecting("forbidden"));
        let registry = registry(transport, MockFallbackSink::new());

        // when (操作):
        let channel = registry.open_or_reuse("r1").await;
        let result = channel.wait_until_subscribed(WAIT).await;

        // then (期待する結果):
        assert!(matches!(result, Err(ClientError::SubscriptionFailed { .. })));
        assert!(matches!(channel.status(), SubscriptionStatus::Errored(_)));
        assert!(!channel.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_subscribed_times_out() {
        // テスト項目: 購読確認が来なければ待機はタイムアウトする
        // given (前提条件):
        let transport = Arc::new(FakeTransport::manual_ack());
        let registry = registry(transport, MockFallbackSink::new());
        let channel = registry.open_or_reuse("r1").await;

        // when (操作):
        let result = channel.wait_until_subscribed(Duration::from_secs(5)).await;

        // then (期待する結果):
        assert!(result.is_err());
        assert_eq!(channel.status(), SubscriptionStatus::Pending);
    }

    #[tokio::test]
    async fn test_close_all_leaves_and_empties() {
        // テスト項目: close_all で全チャネルから離脱しキャッシュが空になる
        // given (前提条件):
        let transport = Arc::new(FakeTransport::default());
        let registry = registry(transport.clone(), MockFallbackSink::new());
        let r1 = registry.open_or_reuse("r1").await;
        let r2 = registry.open_or_reuse("r2").await;
        r1.wait_until_subscribed(WAIT).await.unwrap();
        r2.wait_until_subscribed(WAIT).await.unwrap();

        // when (操作):
        registry.close_all().await;

        // then (期待する結果):
        assert!(registry.is_empty().await);
        assert!(registry.get("r1").await.is_none());
        let mut leaves = transport.leaves();
        leaves.sort();
        assert_eq!(leaves, vec!["room:r1".to_string(), "room:r2".to_string()]);
        assert_eq!(r1.status(), SubscriptionStatus::Closed);
        let reopened = registry.open_or_reuse("r1").await;
        assert!(!Arc::ptr_eq(&r1, &reopened));
    }

    #[tokio::test]
    async fn test_ended_subscription_closes_live_receivers() {
        // テスト項目: 購読が終了するとライブ受信側に Closed が通知される
        // given (前提条件):
        let transport = Arc::new(FakeTransport::default());
        let registry = registry(transport.clone(), MockFallbackSink::new());
        let channel = registry.open_or_reuse("r1").await;
        channel.wait_until_subscribed(WAIT).await.unwrap();
        let mut live = channel.subscribe_messages();

        // when (操作):
        transport.leave("room:r1").await.unwrap();
        let received = tokio::time::timeout(WAIT, live.recv()).await.unwrap();

        // then (期待する結果):
        assert_eq!(received, Err(tokio::sync::broadcast::error::RecvError::Closed));
        assert_eq!(channel.status(), SubscriptionStatus::Closed);
        assert!(channel.subscribe_messages().try_recv().is_err());
    }

    #[tokio::test]
    async fn test_close_all_closes_live_receivers() {
        // テスト項目: close_all の後、ライブ受信側は Closed で終了する
        // given (前提条件):
        let transport = Arc::new(FakeTransport::default());
        let registry = registry(transport, MockFallbackSink::new());
        let channel = registry.open_or_reuse("r1").await;
        channel.wait_until_subscribed(WAIT).await.unwrap();
        let mut live = channel.subscribe_messages();

        // when (操作):
        registry.close_all().await;
        let received = tokio::time::timeout(WAIT, live.recv()).await.unwrap();

        // then (期待する結果):
        assert_eq!(received, Err(tokio::sync::broadcast::error::RecvError::Closed));
    }
}
