//! `MessagePusher` implementations.
//!
//! - `websocket`: pushes through the per-connection channel drained by the
//!   WebSocket handler

pub mod websocket;

pub use websocket::WebSocketMessagePusher;
