//! In-memory implementations of the domain repositories.
//!
//! Everything is lost on restart. Good enough for a lobby server whose
//! authoritative state lives with the clients.

mod room;
mod subscription;
mod user;

pub use room::InMemoryRoomRepository;
pub use subscription::InMemorySubscriptionRepository;
pub use user::InMemoryUserRepository;
