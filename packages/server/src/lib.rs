//! Broadcast chat room server library.
//!
//! One [`domain::Hub`] owns the room's membership and serializes every join,
//! leave and broadcast through a single control loop. Each WebSocket
//! connection runs a read pump feeding the hub and a write pump draining the
//! client's outbound queue.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
