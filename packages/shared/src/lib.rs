//! Code shared by the Turup's Gambit server and client.
//!
//! Logging setup, time helpers, backend configuration and the wire DTOs that
//! both sides of the realtime glue serialize.

pub mod config;
pub mod dto;
pub mod logger;
pub mod time;
