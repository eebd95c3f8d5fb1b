//! UI layer: HTTP routing, the access gate and the WebSocket acceptor.

pub mod gate;
mod handler;
mod server;
mod signal;
pub mod state;

pub use handler::pump;
pub use server::Server;
