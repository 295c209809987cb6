//! Domain layer: entities, value objects and the ports implemented by
//! the infrastructure layer.

pub mod entity;
pub mod error;
pub mod pusher;
pub mod repository;
pub mod value_object;

pub use entity::{Player, Room, User};
pub use error::{MessagePushError, RepositoryError, RoomRuleError, ValueObjectError};
pub use pusher::{MessagePusher, PusherChannel};
pub use repository::{RoomRepository, SubscriptionRepository, UserRepository};
pub use value_object::{ConnectionId, RoomId, RoomIdFactory, Timestamp, Topic, UserId};
