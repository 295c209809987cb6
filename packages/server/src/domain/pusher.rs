//! MessagePusher trait.
//!
//! The domain only knows that text can be pushed to a connection. How the
//! connection is held (WebSocket sink, test channel) is an infrastructure
//! detail.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{error::MessagePushError, value_object::ConnectionId};

/// Channel that delivers outbound text to one connection
pub type PusherChannel = mpsc::UnboundedSender<String>;

#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// Register a connection's outbound channel
    async fn register_client(&self, connection_id: ConnectionId, sender: PusherChannel);

    /// Forget a connection
    async fn unregister_client(&self, connection_id: &ConnectionId);

    /// Ids of every registered connection
    async fn client_ids(&self) -> Vec<ConnectionId>;

    /// Push to a single connection
    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        content: &str,
    ) -> Result<(), MessagePushError>;

    /// Push to several connections. Individual failures are tolerated.
    async fn broadcast(
        &self,
        targets: Vec<ConnectionId>,
        content: &str,
    ) -> Result<(), MessagePushError>;
}
