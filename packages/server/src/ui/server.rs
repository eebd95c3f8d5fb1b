//! Server execution logic.

use std::sync::Arc;

use axum::{Router, middleware, routing::get};
use tower_http::trace::TraceLayer;

use crate::domain::HubHandle;

use super::{
    gate::{AccessGate, require_access},
    handler::{http::health_check, websocket::websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// Path of the gated WebSocket endpoint
pub const ROOM_PATH: &str = "/room";

/// Broadcast chat room server
///
/// This struct encapsulates the server configuration and provides methods to run the server.
/// The hub's control loop must be running on its own task.
///
/// # Example
///
/// ```ignore
/// let (hub, handle) = Hub::new();
/// tokio::spawn(hub.run());
/// let server = Server::new(handle, Arc::new(CookieGate::default()));
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    /// Submission side of the room's hub
    hub: HubHandle,
    /// Gate in front of the WebSocket endpoint
    gate: Arc<dyn AccessGate>,
}

impl Server {
    /// Create a new Server instance
    ///
    /// # Arguments
    ///
    /// * `hub` - Handle of a running hub
    /// * `gate` - Gate approving requests to the WebSocket endpoint
    pub fn new(hub: HubHandle, gate: Arc<dyn AccessGate>) -> Self {
        Self { hub, gate }
    }

    /// Build the router without binding a listener
    pub fn router(self) -> Router {
        let app_state = Arc::new(AppState {
            hub: self.hub,
            gate: self.gate,
        });

        // only the WebSocket endpoint sits behind the gate
        let gated = Router::new()
            .route(ROOM_PATH, get(websocket_handler))
            .route_layer(middleware::from_fn_with_state(
                app_state.clone(),
                require_access,
            ));

        Router::new()
            .merge(gated)
            .route("/api/health", get(health_check))
            .layer(TraceLayer::new_for_http())
            .with_state(app_state)
    }

    /// Run the chat room server
    ///
    /// # Arguments
    ///
    /// * `host` - The host address to bind to (e.g., "127.0.0.1")
    /// * `port` - The port number to bind to (e.g., 8080)
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let app = self.router();

        // Bind the server to the host and port
        let bind_addr = format!("{}:{}", host, port);
        let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

        tracing::info!("Chat room server listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}{}", bind_addr, ROOM_PATH);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::Hub,
        ui::gate::{GateDecision, GateError, MockAccessGate, SessionName},
    };
    use axum::http::StatusCode;

    async fn serve(gate: MockAccessGate) -> String {
        let (hub, handle) = Hub::new();
        tokio::spawn(hub.run());
        let app = Server::new(handle, Arc::new(gate)).router();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_health_check_bypasses_gate() {
        // テスト項目: ヘルスチェックはゲートを通らずに応答する
        // given (前提条件):
        let mut gate = MockAccessGate::new();
        gate.expect_check().never();
        let base = serve(gate).await;

        // when (操作):
        let response = reqwest::get(format!("{}/api/health", base)).await.unwrap();

        // then (期待する結果):
        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body, serde_json::json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_denied_request_gets_error_text() {
        // テスト項目: ゲートが拒否した場合、500 とエラー文言が返される
        // given (前提条件):
        let mut gate = MockAccessGate::new();
        gate.expect_check()
            .times(1)
            .returning(|_| GateDecision::Deny(GateError::UnreadableCookie("bad".to_string())));
        let base = serve(gate).await;

        // when (操作):
        let response = reqwest::get(format!("{}{}", base, ROOM_PATH)).await.unwrap();

        // then (期待する結果):
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.text().await.unwrap(),
            "unreadable cookie header: bad"
        );
    }

    #[tokio::test]
    async fn test_approved_plain_request_fails_upgrade_only() {
        // テスト項目: ゲートを通過しても WebSocket でないリクエストはそのリクエストだけが失敗する
        // given (前提条件):
        let mut gate = MockAccessGate::new();
        gate.expect_check()
            .times(2)
            .returning(|_| GateDecision::Proceed(SessionName("alice".to_string())));
        let base = serve(gate).await;

        // when (操作):
        let first = reqwest::get(format!("{}{}", base, ROOM_PATH)).await.unwrap();
        let second = reqwest::get(format!("{}{}", base, ROOM_PATH)).await.unwrap();

        // then (期待する結果):
        assert!(first.status().is_client_error());
        assert!(second.status().is_client_error());
        let health = reqwest::get(format!("{}/api/health", base)).await.unwrap();
        assert_eq!(health.status(), StatusCode::OK);
    }
}
