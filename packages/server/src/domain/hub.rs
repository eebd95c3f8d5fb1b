//! The hub: single coordination point of one chat room.
//!
//! ## Design
//!
//! The hub owns the membership set and is driven by one control loop
//! ([`Hub::run`]). Connections never touch the membership directly: they
//! submit join, leave and forward requests through a cloneable [`HubHandle`],
//! and the loop services exactly one request at a time. Membership changes
//! and fan-out are therefore atomic with respect to each other without locks.
//!
//! ## Backpressure
//!
//! [`Hub::broadcast`] waits on every member's bounded outbound queue in turn.
//! A client whose queue is full stalls the fan-out to the members after it,
//! and the loop services no other request until that client drains or
//! disconnects. There is no timeout or drop policy.

use std::{collections::BTreeMap, sync::Arc};

use tokio::sync::mpsc;

use super::{
    client::{ChatMessage, ClientHandle, ClientId},
    error::HubError,
    tracer::{self, Tracer},
};

/// Capacity of the join and forward queues.
///
/// Kept at one so a submitter waits for the loop, close to a rendezvous.
pub const HUB_QUEUE_SIZE: usize = 1;

/// Chat room hub
///
/// Create it with [`Hub::new`] or [`Hub::with_tracer`], spawn [`Hub::run`]
/// and hand the returned [`HubHandle`] to the connection acceptor.
pub struct Hub {
    /// Registered clients, iterated in `ClientId` order during fan-out
    clients: BTreeMap<ClientId, ClientHandle>,
    join_rx: mpsc::Receiver<ClientHandle>,
    leave_rx: mpsc::UnboundedReceiver<ClientId>,
    forward_rx: mpsc::Receiver<ChatMessage>,
    tracer: Arc<dyn Tracer>,
}

/// Submission side of a [`Hub`]
#[derive(Clone)]
pub struct HubHandle {
    join_tx: mpsc::Sender<ClientHandle>,
    leave_tx: mpsc::UnboundedSender<ClientId>,
    forward_tx: mpsc::Sender<ChatMessage>,
}

impl Hub {
    /// Create a hub with tracing disabled.
    pub fn new() -> (Self, HubHandle) {
        Self::with_tracer(tracer::off())
    }

    /// Create a hub reporting its activity to `tracer`.
    pub fn with_tracer(tracer: Arc<dyn Tracer>) -> (Self, HubHandle) {
        let (join_tx, join_rx) = mpsc::channel(HUB_QUEUE_SIZE);
        let (leave_tx, leave_rx) = mpsc::unbounded_channel();
        let (forward_tx, forward_rx) = mpsc::channel(HUB_QUEUE_SIZE);

        let hub = Self {
            clients: BTreeMap::new(),
            join_rx,
            leave_rx,
            forward_rx,
            tracer,
        };
        let handle = HubHandle {
            join_tx,
            leave_tx,
            forward_tx,
        };
        (hub, handle)
    }

    /// Number of registered clients
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn contains(&self, id: &ClientId) -> bool {
        self.clients.contains_key(id)
    }

    /// Register a client.
    pub fn join(&mut self, client: ClientHandle) {
        tracing::info!(
            "Client '{}' ({}) joined, {} connected",
            client.name(),
            client.id(),
            self.clients.len() + 1
        );
        self.clients.insert(client.id(), client);
        self.tracer.trace("New client joined");
    }

    /// Remove a client and close its outbound queue.
    ///
    /// Unknown ids are ignored, so a repeated leave is harmless.
    pub fn leave(&mut self, id: &ClientId) {
        match self.clients.remove(id) {
            Some(client) => {
                tracing::info!(
                    "Client '{}' ({}) left, {} connected",
                    client.name(),
                    id,
                    self.clients.len()
                );
                // dropping the handle closes the queue; the write pump drains and stops
                drop(client);
                self.tracer.trace("Client left");
            }
            None => tracing::warn!("Leave for unknown client {}, ignoring", id),
        }
    }

    /// Enqueue `message` onto every registered client's outbound queue.
    ///
    /// Waits on full queues; see the module documentation.
    pub async fn broadcast(&self, message: ChatMessage) {
        self.tracer.trace(&format!("Message received: {}", message));
        tracing::debug!("Broadcasting to {} clients: {}", self.clients.len(), message);

        for (id, client) in &self.clients {
            if client.deliver(message.clone()).await {
                self.tracer.trace(" -- sent to client");
            } else {
                // leave is already on its way from the acceptor
                tracing::debug!("Write pump of client {} is gone, skipping", id);
            }
        }
    }

    /// Run the control loop.
    ///
    /// Services one request at a time. When several are ready, joins go first,
    /// then leaves, then forwards, so a join submitted before a forward is
    /// always registered before that forward is broadcast. Returns once every
    /// [`HubHandle`] has been dropped.
    pub async fn run(mut self) {
        tracing::info!("Hub loop started");

        loop {
            tokio::select! {
                biased;
                Some(client) = self.join_rx.recv() => self.join(client),
                Some(id) = self.leave_rx.recv() => self.leave(&id),
                Some(message) = self.forward_rx.recv() => self.broadcast(message).await,
                else => break,
            }
        }

        tracing::info!(
            "Hub loop stopped, {} clients still registered",
            self.clients.len()
        );
    }
}

impl HubHandle {
    /// Submit a join request, waiting for room in the join queue.
    pub async fn join(&self, client: ClientHandle) -> Result<(), HubError> {
        self.join_tx
            .send(client)
            .await
            .map_err(|_| HubError::Closed)
    }

    /// Submit a leave request.
    ///
    /// Never waits, so it can be issued from `Drop`.
    pub fn leave(&self, id: ClientId) -> Result<(), HubError> {
        self.leave_tx.send(id).map_err(|_| HubError::Closed)
    }

    /// Submit a message for broadcast, waiting for room in the forward queue.
    pub async fn forward(&self, message: ChatMessage) -> Result<(), HubError> {
        self.forward_tx
            .send(message)
            .await
            .map_err(|_| HubError::Closed)
    }
}
