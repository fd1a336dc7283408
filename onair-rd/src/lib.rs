//! # OnAir Radio Daemon (onair-rd)
//!
//! Schedule resolution and playback continuity engine for a browser-based
//! internet radio station.
//!
//! **Purpose:** Determine which scheduled program is on-air, keep a listener
//! joining mid-show synchronized to wall-clock time, and fall back to a
//! gapless worship-filler rotation when nothing is scheduled. Exposes an
//! HTTP/SSE control surface for the browser player and the admin console.
//!
//! **Architecture:** SQLite-backed schedule repository pushing full
//! snapshots over watch channels, a single controller task driving a
//! channel-based audio sink, and an axum API with an SSE event stream.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod playback;
pub mod presence;
pub mod repo;
pub mod state;

pub use error::{Error, Result};
pub use state::SharedState;
