//! WebSocket connection acceptor.

use std::sync::Arc;

use axum::{
    Extension,
    extract::{
        State,
        ws::{WebSocket, WebSocketUpgrade, rejection::WebSocketUpgradeRejection},
    },
    response::{IntoResponse, Response},
};
use futures_util::StreamExt;

use crate::{
    domain::{ClientHandle, ClientId, HubHandle},
    ui::{gate::SessionName, state::AppState},
};

use super::pump::{read_pump, write_pump};

/// Read and write buffer size of each WebSocket connection
pub const SOCKET_BUFFER_SIZE: usize = 1024;

/// Submits the leave request for one client when dropped.
///
/// Created right after the join succeeds, so every exit path from the
/// connection (return, panic unwind, task cancellation) issues exactly one
/// leave.
struct LeaveGuard {
    hub: HubHandle,
    client_id: ClientId,
}

impl LeaveGuard {
    fn new(hub: HubHandle, client_id: ClientId) -> Self {
        Self { hub, client_id }
    }
}

impl Drop for LeaveGuard {
    fn drop(&mut self) {
        if let Err(e) = self.hub.leave(self.client_id) {
            tracing::warn!("Could not submit leave for client {}: {}", self.client_id, e);
        }
    }
}

/// Upgrade a gated request to a WebSocket and hand it to [`serve_connection`].
///
/// A request that cannot be upgraded fails with the rejection's status code;
/// the hub and the other connections are unaffected.
pub async fn websocket_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionName>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => {
            tracing::warn!("Cannot upgrade request from '{}': {}", session, rejection);
            return rejection.into_response();
        }
    };

    let hub = state.hub.clone();
    ws.read_buffer_size(SOCKET_BUFFER_SIZE)
        .write_buffer_size(SOCKET_BUFFER_SIZE)
        .on_failed_upgrade(|e| tracing::warn!("WebSocket upgrade failed: {}", e))
        .on_upgrade(move |socket| serve_connection(socket, hub, session))
}

/// Run one client's connection until either pump ends.
///
/// Registers a fresh client with the hub, starts the write pump as its own
/// task and runs the read pump on the current one. When the read pump
/// returns, or the write pump fails first, the leave guard fires; the hub
/// then closes the outbound queue and the write pump finishes draining.
pub async fn serve_connection(socket: WebSocket, hub: HubHandle, session: SessionName) {
    let (client, outbound) = ClientHandle::new(session.to_string());
    let client_id = client.id();

    if let Err(e) = hub.join(client).await {
        tracing::error!("Cannot register '{}' with the hub: {}", session, e);
        return;
    }
    let _leave = LeaveGuard::new(hub.clone(), client_id);
    tracing::info!("Client '{}' connected as {}", session, client_id);

    let (sink, stream) = socket.split();
    let mut write_task = tokio::spawn(write_pump(sink, outbound, client_id));

    tokio::select! {
        _ = read_pump(stream, hub, client_id) => {}
        _ = &mut write_task => {
            tracing::debug!("Write pump of client {} ended first", client_id);
        }
    }

    tracing::info!("Client '{}' ({}) disconnected", session, client_id);
}
