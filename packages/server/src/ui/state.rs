//! Server state shared by the handlers.

use std::sync::Arc;

use crate::{domain::HubHandle, ui::gate::AccessGate};

/// Shared application state
pub struct AppState {
    /// Submission side of the room's hub
    pub hub: HubHandle,
    /// Gate approving requests before the WebSocket upgrade
    pub gate: Arc<dyn AccessGate>,
}
