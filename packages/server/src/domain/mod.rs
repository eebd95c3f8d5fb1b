//! Domain layer: the hub, its clients and the trace sink it reports to.

pub mod client;
pub mod error;
pub mod hub;
pub mod tracer;

pub use client::{ChatMessage, ClientHandle, ClientId, MESSAGE_BUFFER_SIZE};
pub use error::HubError;
pub use hub::{HUB_QUEUE_SIZE, Hub, HubHandle};
pub use tracer::{NoopTracer, Tracer};
