//! Realtime session bridge for Turup's Gambit.
//!
//! - [`realtime`]: per-room pub/sub channels with a secondary HTTP write
//! - [`socket`]: the independent raw socket fallback with fixed-delay reconnect
//! - [`host`]: best-effort "am I the host" resolution
//! - [`bots`]: staggered, cancellable trump votes for bot seats
//! - [`api`]: user and room REST client
//! - [`endpoint`]: hub, socket and REST URLs derived from the backend base URL

pub mod api;
pub mod bots;
pub mod domain;
pub mod endpoint;
pub mod error;
pub mod host;
pub mod realtime;
pub mod socket;

// CLI
mod formatter;
mod runner;
mod session;
mod ui;

pub use runner::{ClientOptions, run_client};
