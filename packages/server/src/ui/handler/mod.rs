//! Request handlers.

pub mod http;
pub mod pump;
pub mod websocket;
