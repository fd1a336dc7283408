//! HTTP API for onair-rd
//!
//! Axum server exposing the listener surface (SSE event stream, state and
//! schedule reads, playback controls, sink event reports) and the
//! bearer-token admin surface (schedule and filler writes).

pub mod auth;
pub mod handlers;
pub mod server;
pub mod sse;

pub use server::{create_router, run, AppContext};
