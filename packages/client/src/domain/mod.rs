//! Client-side view of rooms, players and identities.

mod identity;
mod room;
mod suit;

pub use identity::Identity;
pub use room::{Player, Room};
pub use suit::Suit;
