//! UseCase: pub/sub hub for room channels
//!
//! A connection joins topics (`room:<roomId>`) and publishes broadcast
//! envelopes on them. Envelopes are relayed to every other subscriber of the
//! topic; the publisher does not get its own message back. Delivery order is
//! the order in which publishes reach the hub. Nothing is stored.

use std::sync::Arc;

use turup_shared::dto::{BroadcastEnvelope, HubFrame};

use crate::domain::{ConnectionId, MessagePusher, PusherChannel, SubscriptionRepository, Topic};

use super::error::HubError;

pub struct RealtimeHubUseCase {
    subscriptions: Arc<dyn SubscriptionRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl RealtimeHubUseCase {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            subscriptions,
            message_pusher,
        }
    }

    pub async fn connect(&self, connection_id: ConnectionId, sender: PusherChannel) {
        self.message_pusher
            .register_client(connection_id, sender)
            .await;
    }

    /// Subscribe and acknowledge with a `joined` frame.
    ///
    /// Joining a topic twice is acknowledged again.
    pub async fn join(&self, connection_id: ConnectionId, topic: String) -> Result<Topic, HubError> {
        let topic = Topic::new(topic).map_err(HubError::InvalidTopic)?;
        if !self.subscriptions.subscribe(connection_id, topic.clone()).await {
            tracing::debug!("Connection '{}' re-joined '{}'", connection_id, topic.as_str());
        }

        let ack = encode(&HubFrame::Joined {
            topic: topic.as_str().to_string(),
        })?;
        self.message_pusher
            .push_to(&connection_id, &ack)
            .await
            .map_err(HubError::Push)?;

        tracing::info!("Connection '{}' joined '{}'", connection_id, topic.as_str());
        Ok(topic)
    }

    pub async fn leave(&self, connection_id: ConnectionId, topic: String) -> Result<(), HubError> {
        let topic = Topic::new(topic).map_err(HubError::InvalidTopic)?;
        if self.subscriptions.unsubscribe(&connection_id, &topic).await {
            tracing::info!("Connection '{}' left '{}'", connection_id, topic.as_str());
        }
        Ok(())
    }

    /// Relay an envelope to the other subscribers of `topic`.
    ///
    /// Returns the connections the envelope was pushed to.
    pub async fn publish(
        &self,
        connection_id: ConnectionId,
        topic: String,
        envelope: BroadcastEnvelope,
    ) -> Result<Vec<ConnectionId>, HubError> {
        let topic = Topic::new(topic).map_err(HubError::InvalidTopic)?;
        if !self.subscriptions.is_subscribed(&connection_id, &topic).await {
            return Err(HubError::NotSubscribed(topic.as_str().to_string()));
        }

        let targets: Vec<ConnectionId> = self
            .subscriptions
            .subscribers(&topic)
            .await
            .into_iter()
            .filter(|id| *id != connection_id)
            .collect();

        let frame = encode(&HubFrame::Broadcast {
            topic: topic.as_str().to_string(),
            envelope,
        })?;
        self.message_pusher
            .broadcast(targets.clone(), &frame)
            .await
            .map_err(HubError::Push)?;

        tracing::debug!(
            "Relayed message on '{}' to {} subscriber(s)",
            topic.as_str(),
            targets.len()
        );
        Ok(targets)
    }

    /// Tell a connection that a request on `topic` was rejected.
    pub async fn reject(&self, connection_id: ConnectionId, topic: String, reason: String) {
        let frame = HubFrame::Error { topic, reason };
        match encode(&frame) {
            Ok(text) => {
                if let Err(e) = self.message_pusher.push_to(&connection_id, &text).await {
                    tracing::warn!("Failed to send error frame to '{}': {}", connection_id, e);
                }
            }
            Err(e) => tracing::error!("{}", e),
        }
    }

    /// Drop the connection and all of its subscriptions.
    pub async fn disconnect(&self, connection_id: ConnectionId) -> Vec<Topic> {
        let left = self.subscriptions.remove_connection(&connection_id).await;
        self.message_pusher.unregister_client(&connection_id).await;
        left
    }
}

fn encode(frame: &HubFrame) -> Result<String, HubError> {
    serde_json::to_string(frame).map_err(|e| HubError::Encode(e.to_string()))
}
