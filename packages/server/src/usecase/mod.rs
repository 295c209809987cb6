//! UseCase layer.
//!
//! Each use case owns the ports it needs and nothing else; the UI layer maps
//! their errors to HTTP status codes or socket frames.

mod create_room;
mod create_user;
mod error;
mod get_room;
mod get_user;
mod join_room;
mod realtime_hub;
mod record_realtime_event;
mod socket_relay;

pub use create_room::CreateRoomUseCase;
pub use create_user::{CreateUserUseCase, NewUser};
pub use error::{
    CreateUserError, GetUserError, HubError, RealtimeEventError, RelayError, RoomError,
};
pub use get_room::GetRoomUseCase;
pub use get_user::GetUserUseCase;
pub use join_room::JoinRoomUseCase;
pub use realtime_hub::RealtimeHubUseCase;
pub use record_realtime_event::{RealtimeEffect, RecordRealtimeEventUseCase};
pub use socket_relay::SocketRelayUseCase;
