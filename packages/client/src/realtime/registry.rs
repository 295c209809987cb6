//! Registry of open room channels.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use turup_shared::dto::BroadcastMessage;

use super::{
    channel::{RoomChannel, SendOutcome},
    fallback::FallbackSink,
    transport::PubSubTransport,
};

/// At most one open channel per room.
///
/// Every channel shares the registry's transport and fallback sink.
pub struct ChannelRegistry {
    transport: Arc<dyn PubSubTransport>,
    fallback: Arc<dyn FallbackSink>,
    channels: Mutex<HashMap<String, Arc<RoomChannel>>>,
}

impl ChannelRegistry {
    pub fn new(transport: Arc<dyn PubSubTransport>, fallback: Arc<dyn FallbackSink>) -> Self {
        Self {
            transport,
            fallback,
            channels: Mutex::new(HashMap::new()),
        }
    }

    /// Return the room's channel, opening it on first use.
    ///
    /// A cached channel is returned as the same `Arc`, whatever its status.
    pub async fn open_or_reuse(&self, room_id: &str) -> Arc<RoomChannel> {
        let mut channels = self.channels.lock().await;
        if let Some(channel) = channels.get(room_id) {
            tracing::debug!("Reusing channel for room '{}'", room_id);
            return channel.clone();
        }

        tracing::info!("Opening channel for room '{}'", room_id);
        let channel = Arc::new(RoomChannel::open(
            room_id,
            self.transport.clone(),
            self.fallback.clone(),
        ));
        channels.insert(room_id.to_string(), channel.clone());
        channel
    }

    pub async fn get(&self, room_id: &str) -> Option<Arc<RoomChannel>> {
        self.channels.lock().await.get(room_id).cloned()
    }

    /// Send on the room's channel; [`SendOutcome::NotConnected`] if there is none
    pub async fn send_message(&self, room_id: &str, message: BroadcastMessage) -> SendOutcome {
        match self.get(room_id).await {
            Some(channel) => channel.send(message).await,
            None => {
                tracing::warn!(
                    "No channel for room '{}', dropping '{}' message",
                    room_id,
                    message.r#type
                );
                SendOutcome::NotConnected
            }
        }
    }

    /// Leave every channel and forget them
    pub async fn close_all(&self) {
        let channels: Vec<_> = self.channels.lock().await.drain().collect();
        for (room_id, channel) in channels {
            tracing::debug!("Closing channel for room '{}'", room_id);
            channel.close().await;
        }
    }

    pub async fn len(&self) -> usize {
        self.channels.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.channels.lock().await.is_empty()
    }
}
