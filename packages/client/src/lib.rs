//! CLI client for the Kairo chat room.
//!
//! Sends each input line to the room and prints every message the room
//! broadcasts, reconnecting when the connection drops.

pub mod error;
pub mod runner;
pub mod session;
pub mod ui;

pub use runner::run_client;
