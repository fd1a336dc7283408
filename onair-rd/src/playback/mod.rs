//! Playback core: schedule resolution and playback continuity
//!
//! - `resolver` — pure on-air resolution against the wall clock
//! - `rotation` — uniform filler-track selection
//! - `sink` — channel seam to the audio sink (the listener's browser)
//! - `controller` — the Idle/Live/Filler mode state machine

pub mod controller;
pub mod resolver;
pub mod rotation;
pub mod sink;

pub use controller::ModeController;
pub use resolver::{resolve, ResolvedState};
pub use sink::SinkHandle;
