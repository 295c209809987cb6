//! Request handlers.

mod http;
mod websocket;

pub use http::{
    create_room, create_user, get_room, get_user, health_check, join_room, post_realtime,
};
pub use websocket::{hub_handler, socket_handler};
