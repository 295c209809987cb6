//! UseCase: raw socket relay
//!
//! Every connection on `/api/socket` receives every valid frame sent by the
//! other connections. A frame is valid if it is a JSON object with a `type`
//! field; anything else is rejected without being relayed.

use std::sync::Arc;

use turup_shared::dto::SocketFrame;

use crate::domain::{ConnectionId, MessagePusher, PusherChannel};

use super::error::RelayError;

pub struct SocketRelayUseCase {
    message_pusher: Arc<dyn MessagePusher>,
}

impl SocketRelayUseCase {
    pub fn new(message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self { message_pusher }
    }

    pub async fn connect(&self, connection_id: ConnectionId, sender: PusherChannel) {
        self.message_pusher
            .register_client(connection_id, sender)
            .await;
    }

    /// Relay a text frame to every other connection.
    pub async fn relay(
        &self,
        from: ConnectionId,
        text: &str,
    ) -> Result<Vec<ConnectionId>, RelayError> {
        let frame: SocketFrame =
            serde_json::from_str(text).map_err(|e| RelayError::InvalidFrame(e.to_string()))?;

        let targets: Vec<ConnectionId> = self
            .message_pusher
            .client_ids()
            .await
            .into_iter()
            .filter(|id| *id != from)
            .collect();

        self.message_pusher
            .broadcast(targets.clone(), text)
            .await
            .map_err(RelayError::Push)?;

        tracing::debug!(
            "Relayed '{}' frame from '{}' to {} connection(s)",
            frame.r#type,
            from,
            targets.len()
        );
        Ok(targets)
    }

    pub async fn disconnect(&self, connection_id: ConnectionId) {
        self.message_pusher.unregister_client(&connection_id).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::message_pusher::WebSocketMessagePusher;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_relay_reaches_everyone_but_sender() {
        // テスト項目: フレームは送信者以外の全接続に中継される
        // given (前提条件):
        let relay = SocketRelayUseCase::new(Arc::new(WebSocketMessagePusher::new()));
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        let a = ConnectionId::generate();
        let b = ConnectionId::generate();
        relay.connect(a, tx_a).await;
        relay.connect(b, tx_b).await;
        let text = r#"{"type":"play_card","card":"QH"}"#;

        // when (操作):
        let targets = relay.relay(a, text).await.unwrap();

        // then (期待する結果):
        assert_eq!(targets, vec![b]);
        assert_eq!(rx_b.recv().await.as_deref(), Some(text));
        assert!(rx_a.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_relay_rejects_frame_without_type() {
        // テスト項目: type を持たないフレームは中継されない
        // given (前提条件):
        let relay = SocketRelayUseCase::new(Arc::new(WebSocketMessagePusher::new()));
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        let b = ConnectionId::generate();
        relay.connect(b, tx_b).await;

        // when (操作):
        let result = relay.relay(ConnectionId::generate(), "not json").await;

        // then (期待する結果):
        assert!(matches!(result, Err(RelayError::InvalidFrame(_))));
        assert!(rx_b.try_recv().is_err());
    }
}
