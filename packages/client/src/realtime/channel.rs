//! One room's pub/sub channel.

use std::sync::{Arc, Mutex as SyncMutex, PoisonError};
use std::time::Duration;

use tokio::{
    sync::{Mutex, broadcast, watch},
    task::JoinHandle,
};
use turup_shared::dto::{BroadcastEnvelope, BroadcastMessage, room_topic};

use super::{fallback::FallbackSink, transport::PubSubTransport};
use crate::error::ClientError;

/// Capacity of the live inbound fanout; slow subscribers see `Lagged`
const INBOUND_CAPACITY: usize = 256;

/// Live fanout sender; cleared when the subscription ends so receivers see `Closed`
type Inbound = Arc<SyncMutex<Option<broadcast::Sender<BroadcastMessage>>>>;

fn close_inbound(inbound: &Inbound) {
    inbound.lock().unwrap_or_else(PoisonError::into_inner).take();
}

/// Subscription lifecycle, driven by the transport only
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionStatus {
    Unsubscribed,
    Pending,
    Subscribed,
    Errored(String),
    Closed,
}

/// Result of sending on a channel.
///
/// The publish and the HTTP fallback are independent writes; each result is
/// kept so a caller can retry either one.
#[derive(Debug)]
pub enum SendOutcome {
    /// No subscribed channel; nothing touched the network
    NotConnected,
    Attempted {
        published: Result<(), ClientError>,
        fallback: Result<(), ClientError>,
    },
}

impl SendOutcome {
    /// The pub/sub publish went out
    pub fn is_published(&self) -> bool {
        matches!(self, SendOutcome::Attempted { published: Ok(()), .. })
    }

    /// Both writes succeeded
    pub fn is_complete(&self) -> bool {
        matches!(
            self,
            SendOutcome::Attempted {
                published: Ok(()),
                fallback: Ok(())
            }
        )
    }
}

/// Handle to the channel `room:<roomId>`.
///
/// Created through [`super::ChannelRegistry::open_or_reuse`]. A background
/// task holds the subscription and appends every inbound message to the log.
pub struct RoomChannel {
    room_id: String,
    topic: String,
    transport: Arc<dyn PubSubTransport>,
    fallback: Arc<dyn FallbackSink>,
    status: Arc<watch::Sender<SubscriptionStatus>>,
    log: Arc<Mutex<Vec<BroadcastMessage>>>,
    inbound: Inbound,
    listener: JoinHandle<()>,
}

impl RoomChannel {
    /// Create the channel and start subscribing in the background
    pub(crate) fn open(
        room_id: &str,
        transport: Arc<dyn PubSubTransport>,
        fallback: Arc<dyn FallbackSink>,
    ) -> Self {
        let topic = room_topic(room_id);
        let status = Arc::new(watch::Sender::new(SubscriptionStatus::Unsubscribed));
        let log = Arc::new(Mutex::new(Vec::new()));
        let (sender, _) = broadcast::channel(INBOUND_CAPACITY);
        let inbound: Inbound = Arc::new(SyncMutex::new(Some(sender.clone())));

        let listener = tokio::spawn(listen(
            topic.clone(),
            transport.clone(),
            status.clone(),
            log.clone(),
            sender,
            inbound.clone(),
        ));

        Self {
            room_id: room_id.to_string(),
            topic,
            transport,
            fallback,
            status,
            log,
            inbound,
            listener,
        }
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn status(&self) -> SubscriptionStatus {
        self.status.borrow().clone()
    }

    pub fn is_connected(&self) -> bool {
        *self.status.borrow() == SubscriptionStatus::Subscribed
    }

    pub fn watch_status(&self) -> watch::Receiver<SubscriptionStatus> {
        self.status.subscribe()
    }

    /// Wait until the subscription settles.
    ///
    /// Fails if it ends errored or closed, or does not settle within `timeout`.
    pub async fn wait_until_subscribed(&self, timeout: Duration) -> Result<(), ClientError> {
        let mut status = self.watch_status();
        let settled = tokio::time::timeout(
            timeout,
            status.wait_for(|s| {
                !matches!(s, SubscriptionStatus::Unsubscribed | SubscriptionStatus::Pending)
            }),
        )
        .await;

        let settled = match settled {
            Ok(Ok(status)) => status.clone(),
            Ok(Err(_)) => SubscriptionStatus::Closed,
            Err(_) => {
                return Err(ClientError::SubscriptionFailed {
                    topic: self.topic.clone(),
                    reason: format!("not acknowledged within {:?}", timeout),
                });
            }
        };

        match settled {
            SubscriptionStatus::Subscribed => Ok(()),
            SubscriptionStatus::Errored(reason) => Err(ClientError::SubscriptionFailed {
                topic: self.topic.clone(),
                reason,
            }),
            other => Err(ClientError::SubscriptionFailed {
                topic: self.topic.clone(),
                reason: format!("{:?}", other),
            }),
        }
    }

    /// Snapshot of every message received so far
    pub async fn messages(&self) -> Vec<BroadcastMessage> {
        self.log.lock().await.clone()
    }

    /// Live inbound messages from now on.
    ///
    /// The receiver reports `Closed` once the subscription ends.
    pub fn subscribe_messages(&self) -> broadcast::Receiver<BroadcastMessage> {
        let inbound = self.inbound.lock().unwrap_or_else(PoisonError::into_inner);
        match inbound.as_ref() {
            Some(sender) => sender.subscribe(),
            None => broadcast::channel(1).1,
        }
    }

    /// Publish `message` and post it to the HTTP fallback.
    ///
    /// Returns [`SendOutcome::NotConnected`] without any network call unless
    /// the channel is subscribed. A failed fallback does not undo the publish.
    pub async fn send(&self, message: BroadcastMessage) -> SendOutcome {
        if !self.is_connected() {
            tracing::warn!(
                "Channel '{}' is not connected ({:?}), dropping '{}' message",
                self.topic,
                self.status(),
                message.r#type
            );
            return SendOutcome::NotConnected;
        }

        let published = self
            .transport
            .publish(&self.topic, BroadcastEnvelope::from(message.clone()))
            .await;
        if let Err(e) = &published {
            tracing::warn!("Publish on '{}' failed: {}", self.topic, e);
        }

        let fallback = self.fallback.post(&message).await;
        if let Err(e) = &fallback {
            tracing::warn!("Fallback write of '{}' failed: {}", message.r#type, e);
        }

        SendOutcome::Attempted {
            published,
            fallback,
        }
    }

    /// Stop listening and leave the topic
    pub(crate) async fn close(&self) {
        self.listener.abort();
        close_inbound(&self.inbound);
        if let Err(e) = self.transport.leave(&self.topic).await {
            tracing::warn!("Leaving '{}' failed: {}", self.topic, e);
        }
        self.status.send_replace(SubscriptionStatus::Closed);
        tracing::debug!("Channel '{}' closed", self.topic);
    }
}

impl Drop for RoomChannel {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

async fn listen(
    topic: String,
    transport: Arc<dyn PubSubTransport>,
    status: Arc<watch::Sender<SubscriptionStatus>>,
    log: Arc<Mutex<Vec<BroadcastMessage>>>,
    sender: broadcast::Sender<BroadcastMessage>,
    inbound: Inbound,
) {
    status.send_replace(SubscriptionStatus::Pending);
    let mut receiver = match transport.join(&topic).await {
        Ok(receiver) => receiver,
        Err(e) => {
            tracing::warn!("Subscription to '{}' failed: {}", topic, e);
            status.send_replace(SubscriptionStatus::Errored(e.to_string()));
            close_inbound(&inbound);
            return;
        }
    };
    status.send_replace(SubscriptionStatus::Subscribed);
    tracing::info!("Subscribed to '{}'", topic);

    while let Some(envelope) = receiver.recv().await {
        let message = envelope.payload;
        tracing::debug!("Received '{}' on '{}'", message.r#type, topic);
        log.lock().await.push(message.clone());
        // no live subscribers is fine, the log still has it
        let _ = sender.send(message);
    }

    tracing::info!("Subscription to '{}' ended", topic);
    drop(sender);
    close_inbound(&inbound);
    status.send_replace(SubscriptionStatus::Closed);
}
