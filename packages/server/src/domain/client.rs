//! Client handle: the hub's view of one connected client.

use std::{fmt, sync::Arc};

use tokio::sync::mpsc;
use uuid::Uuid;

/// Capacity of each client's outbound queue
pub const MESSAGE_BUFFER_SIZE: usize = 256;

/// Identity of one connection
///
/// Ordered so that the hub iterates its members deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(Uuid);

impl ClientId {
    /// Generate a fresh random identity
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl From<Uuid> for ClientId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Text payload broadcast through the room
///
/// Cloning shares the underlying buffer, so fan-out does not copy the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage(Arc<str>);

impl ChatMessage {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ChatMessage {
    fn from(value: String) -> Self {
        Self(value.into())
    }
}

impl From<&str> for ChatMessage {
    fn from(value: &str) -> Self {
        Self(value.into())
    }
}

impl fmt::Display for ChatMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One connected client as seen by the hub
///
/// Holds the producer side of the client's outbound queue. The queue closes
/// when the handle is dropped, which only the hub does after removing the
/// handle from membership.
#[derive(Debug)]
pub struct ClientHandle {
    id: ClientId,
    name: String,
    outbound: mpsc::Sender<ChatMessage>,
}

impl ClientHandle {
    /// Create a handle with a fresh identity and an outbound queue of
    /// [`MESSAGE_BUFFER_SIZE`].
    ///
    /// Returns the handle together with the consumer side of its queue,
    /// which belongs to the connection's write pump.
    pub fn new(name: impl Into<String>) -> (Self, mpsc::Receiver<ChatMessage>) {
        Self::with_capacity(ClientId::generate(), name, MESSAGE_BUFFER_SIZE)
    }

    /// Create a handle with an explicit identity and queue capacity.
    pub fn with_capacity(
        id: ClientId,
        name: impl Into<String>,
        capacity: usize,
    ) -> (Self, mpsc::Receiver<ChatMessage>) {
        let (outbound, receiver) = mpsc::channel(capacity);
        let handle = Self {
            id,
            name: name.into(),
            outbound,
        };
        (handle, receiver)
    }

    pub fn id(&self) -> ClientId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Enqueue a message, waiting while the queue is full.
    ///
    /// Returns `false` when the write pump has already gone away.
    pub(crate) async fn deliver(&self, message: ChatMessage) -> bool {
        self.outbound.send(message).await.is_ok()
    }
}
