//! WebSocket client session management.

use futures_util::{SinkExt, StreamExt};
use kairo_shared::time::get_timestamp;
use tokio::sync::mpsc;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        self, Message,
        client::IntoClientRequest,
        http::{HeaderValue, StatusCode, header},
    },
};

use super::{
    error::ClientError,
    ui::{format_incoming, redisplay_prompt},
};

/// Value of the `Cookie` header carrying the session credential
pub fn auth_cookie(name: &str) -> String {
    format!("auth={}", name)
}

/// Map a failed handshake to a client error.
fn handshake_error(error: tungstenite::Error) -> ClientError {
    if let tungstenite::Error::Http(response) = &error
        && response.status() == StatusCode::TEMPORARY_REDIRECT
    {
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        return ClientError::Unauthorized(location);
    }
    ClientError::ConnectionError(error.to_string())
}

/// Run the WebSocket client session
///
/// Lines are taken from `input`, which outlives the session so a reconnect
/// keeps reading the same terminal. Returns `Ok(())` when the input ends and
/// an error when the connection could not be established or was lost.
pub async fn run_client_session(
    url: &str,
    name: &str,
    input: &mut mpsc::UnboundedReceiver<String>,
) -> Result<(), ClientError> {
    let mut request = url
        .into_client_request()
        .map_err(|e| ClientError::ConnectionError(e.to_string()))?;
    let cookie = HeaderValue::from_str(&auth_cookie(name))
        .map_err(|e| ClientError::ConnectionError(e.to_string()))?;
    request.headers_mut().insert(header::COOKIE, cookie);

    let (ws_stream, _response) = connect_async(request).await.map_err(handshake_error)?;

    tracing::info!("Connected to chat room!");
    println!(
        "\nYou are '{}'. Type messages and press Enter to send. Press Ctrl+C to exit.\n",
        name
    );

    let (mut write, mut read) = ws_stream.split();

    // Spawn a task to print every message broadcast by the room
    let name_for_read = name.to_string();
    let mut read_task = tokio::spawn(async move {
        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    print!("{}", format_incoming(text.as_str(), get_timestamp()));
                    redisplay_prompt(&name_for_read);
                }
                Ok(Message::Close(_)) => {
                    tracing::info!("Server closed the connection");
                    break;
                }
                Err(e) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    break;
                }
                _ => {}
            }
        }
    });

    // Send every input line to the room until the input ends
    let write_loop = async {
        while let Some(line) = input.recv().await {
            if let Err(e) = write.send(Message::text(line)).await {
                tracing::warn!("Failed to send message: {}", e);
                return Err(ClientError::ConnectionError(e.to_string()));
            }
        }
        // user ended the input
        let _ = write.close().await;
        Ok(())
    };

    // If either side completes, stop the other
    tokio::select! {
        _ = &mut read_task => {
            Err(ClientError::ConnectionError("Connection lost".to_string()))
        }
        result = write_loop => {
            read_task.abort();
            result
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_tungstenite::tungstenite::http::Response;

    #[test]
    fn test_auth_cookie_carries_name() {
        // テスト項目: Cookie ヘッダーに名前が auth として設定される
        // given (前提条件):
        let name = "alice";

        // when (操作):
        let cookie = auth_cookie(name);

        // then (期待する結果):
        assert_eq!(cookie, "auth=alice");
    }

    #[test]
    fn test_redirect_maps_to_unauthorized() {
        // テスト項目: 307 リダイレクトは Unauthorized に変換される
        // given (前提条件):
        let response = Response::builder()
            .status(StatusCode::TEMPORARY_REDIRECT)
            .header(header::LOCATION, "/login")
            .body(None)
            .unwrap();

        // when (操作):
        let error = handshake_error(tungstenite::Error::Http(response.into()));

        // then (期待する結果):
        assert!(matches!(error, ClientError::Unauthorized(location) if location == "/login"));
    }

    #[tokio::test]
    async fn test_failed_connect_leaves_input_for_next_attempt() {
        // テスト項目: 接続に失敗しても入力チャネルは消費されず、次の接続で再利用できる
        // given (前提条件):
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("ws://{}/room", listener.local_addr().unwrap());
        drop(listener);
        let (input_tx, mut input) = mpsc::unbounded_channel();
        input_tx.send("hello".to_string()).unwrap();

        // when (操作):
        let first = run_client_session(&url, "alice", &mut input).await;
        let second = run_client_session(&url, "alice", &mut input).await;

        // then (期待する結果):
        assert!(first.unwrap_err().is_retryable());
        assert!(second.unwrap_err().is_retryable());
        assert_eq!(input.try_recv().unwrap(), "hello");
    }

    #[test]
    fn test_other_failures_map_to_connection_error() {
        // テスト項目: その他の失敗は再接続可能な接続エラーになる
        // given (前提条件):
        let failure = tungstenite::Error::ConnectionClosed;

        // when (操作):
        let error = handshake_error(failure);

        // then (期待する結果):
        assert!(error.is_retryable());
    }
}
