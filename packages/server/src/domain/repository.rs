//! Repository traits
//!
//! Data-access ports required by the use cases. Implementations live in the
//! infrastructure layer.

use async_trait::async_trait;

use super::{
    entity::{Room, User},
    error::RepositoryError,
    value_object::{ConnectionId, RoomId, Topic, UserId},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Look up by primary id
    async fn find_by_id(&self, id: &UserId) -> Option<User>;

    /// Look up by the external identity-provider id
    async fn find_by_external_id(&self, external_id: &str) -> Option<User>;

    /// Insert a new user. Fails if the id is taken.
    async fn insert(&self, user: User) -> Result<(), RepositoryError>;
}

/// Room storage.
///
/// `save` overwrites unconditionally: there is no version check.
#[async_trait]
pub trait RoomRepository: Send + Sync {
    async fn find(&self, id: &RoomId) -> Option<Room>;

    async fn insert(&self, room: Room) -> Result<(), RepositoryError>;

    async fn save(&self, room: Room) -> Result<(), RepositoryError>;
}

/// Topic subscriptions of hub connections
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Returns `false` if the connection was already subscribed
    async fn subscribe(&self, connection_id: ConnectionId, topic: Topic) -> bool;

    /// Returns `false` if the connection was not subscribed
    async fn unsubscribe(&self, connection_id: &ConnectionId, topic: &Topic) -> bool;

    async fn is_subscribed(&self, connection_id: &ConnectionId, topic: &Topic) -> bool;

    async fn subscribers(&self, topic: &Topic) -> Vec<ConnectionId>;

    /// Drop every subscription of a connection, returning the topics it left
    async fn remove_connection(&self, connection_id: &ConnectionId) -> Vec<Topic>;
}
