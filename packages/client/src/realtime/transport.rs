//! Pub/sub transport.
//!
//! The hosted provider is modelled as [`PubSubTransport`]; [`WebSocketPubSub`]
//! speaks the [`HubFrame`] protocol of the `/realtime` hub over one socket and
//! multiplexes every joined topic on it.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::{
    sync::{Mutex, mpsc, oneshot},
    task::JoinHandle,
};
use turup_shared::dto::{BroadcastEnvelope, HubFrame};

use crate::{
    error::ClientError,
    socket::connector::{SocketConnector, SocketStream},
};

/// Inbound envelopes of one joined topic
pub type EnvelopeReceiver = mpsc::UnboundedReceiver<BroadcastEnvelope>;

#[async_trait]
pub trait PubSubTransport: Send + Sync {
    /// Subscribe to `topic`.
    ///
    /// Resolves once the provider acknowledged the subscription. The
    /// receiver ends when the subscription or the connection goes away.
    async fn join(&self, topic: &str) -> Result<EnvelopeReceiver, ClientError>;

    async fn publish(&self, topic: &str, envelope: BroadcastEnvelope) -> Result<(), ClientError>;

    async fn leave(&self, topic: &str) -> Result<(), ClientError>;
}

/// Per-topic state kept by the hub connection
struct TopicSlot {
    inbound: mpsc::UnboundedSender<BroadcastEnvelope>,
    ack: Option<oneshot::Sender<Result<(), String>>>,
}

type Topics = Arc<Mutex<HashMap<String, TopicSlot>>>;

/// Client of the `/realtime` hub
pub struct WebSocketPubSub {
    outbound: mpsc::UnboundedSender<HubFrame>,
    topics: Topics,
    task: JoinHandle<()>,
}

impl WebSocketPubSub {
    /// Connect to the hub at `url` (see [`crate::endpoint::hub_url`])
    pub async fn connect(connector: &dyn SocketConnector, url: &str) -> Result<Self, ClientError> {
        let stream = connector.connect(url).await?;
        tracing::info!("Connected to pub/sub hub");
        Ok(Self::over(stream))
    }

    /// Run the hub protocol over an already open stream
    pub fn over(stream: Box<dyn SocketStream>) -> Self {
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let topics: Topics = Arc::new(Mutex::new(HashMap::new()));
        let task = tokio::spawn(hub_loop(stream, outbound_rx, topics.clone()));

        Self {
            outbound,
            topics,
            task,
        }
    }

    fn send_frame(&self, frame: HubFrame) -> Result<(), ClientError> {
        self.outbound
            .send(frame)
            .map_err(|_| ClientError::ConnectionError("hub connection closed".to_string()))
    }
}

impl Drop for WebSocketPubSub {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[async_trait]
impl PubSubTransport for WebSocketPubSub {
    async fn join(&self, topic: &str) -> Result<EnvelopeReceiver, ClientError> {
        let (inbound, receiver) = mpsc::unbounded_channel();
        let (ack_tx, ack_rx) = oneshot::channel();

        self.topics.lock().await.insert(
            topic.to_string(),
            TopicSlot {
                inbound,
                ack: Some(ack_tx),
            },
        );
        if let Err(e) = self.send_frame(HubFrame::Join {
            topic: topic.to_string(),
        }) {
            self.topics.lock().await.remove(topic);
            return Err(e);
        }

        let failed = |reason: String| ClientError::SubscriptionFailed {
            topic: topic.to_string(),
            reason,
        };
        match ack_rx.await {
            Ok(Ok(())) => Ok(receiver),
            Ok(Err(reason)) => {
                self.topics.lock().await.remove(topic);
                Err(failed(reason))
            }
            Err(_) => Err(failed("connection closed before acknowledgement".to_string())),
        }
    }

    async fn publish(&self, topic: &str, envelope: BroadcastEnvelope) -> Result<(), ClientError> {
        self.send_frame(HubFrame::Broadcast {
            topic: topic.to_string(),
            envelope,
        })
        .map_err(|e| ClientError::PublishFailed(e.to_string()))
    }

    async fn leave(&self, topic: &str) -> Result<(), ClientError> {
        self.topics.lock().await.remove(topic);
        self.send_frame(HubFrame::Leave {
            topic: topic.to_string(),
        })
    }
}

async fn hub_loop(
    mut stream: Box<dyn SocketStream>,
    mut outbound: mpsc::UnboundedReceiver<HubFrame>,
    topics: Topics,
) {
    loop {
        tokio::select! {
            frame = outbound.recv() => {
                let Some(frame) = frame else {
                    let _ = stream.close().await;
                    break;
                };
                let text = match serde_json::to_string(&frame) {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::error!("Failed to serialize hub frame: {}", e);
                        continue;
                    }
                };
                if let Err(e) = stream.send(text).await {
                    tracing::warn!("Hub send failed: {}", e);
                    break;
                }
            }
            incoming = stream.recv() => {
                match incoming {
                    Some(Ok(text)) => handle_hub_frame(&text, &topics).await,
                    Some(Err(e)) => {
                        tracing::warn!("Hub receive failed: {}", e);
                        break;
                    }
                    None => {
                        tracing::info!("Hub closed the connection");
                        break;
                    }
                }
            }
        }
    }

    // ends every inbound receiver and fails pending joins
    topics.lock().await.clear();
}

async fn handle_hub_frame(text: &str, topics: &Topics) {
    let frame = match serde_json::from_str::<HubFrame>(text) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::warn!("Ignoring malformed hub frame: {}", e);
            return;
        }
    };

    let mut topics = topics.lock().await;
    match frame {
        HubFrame::Joined { topic } => {
            if let Some(ack) = topics.get_mut(&topic).and_then(|slot| slot.ack.take()) {
                let _ = ack.send(Ok(()));
            }
        }
        HubFrame::Broadcast { topic, envelope } => match topics.get(&topic) {
            Some(slot) => {
                let _ = slot.inbound.send(envelope);
            }
            None => tracing::debug!("Dropping broadcast for unjoined topic '{}'", topic),
        },
        HubFrame::Error { topic, reason } => {
            tracing::warn!("Hub rejected request on '{}': {}", topic, reason);
            if let Some(ack) = topics.get_mut(&topic).and_then(|slot| slot.ack.take()) {
                let _ = ack.send(Err(reason));
            }
        }
        HubFrame::Join { .. } | HubFrame::Leave { .. } => {
            tracing::debug!("Ignoring client-only hub frame");
        }
    }
}
