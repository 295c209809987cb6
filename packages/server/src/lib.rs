//! Server glue for Turup's Gambit.
//!
//! Hosts the HTTP fallback endpoint for realtime writes, the raw socket relay,
//! a minimal pub/sub hub for room channels, and the user/room REST surface.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
