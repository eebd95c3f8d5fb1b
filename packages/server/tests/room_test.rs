//! Integration tests for the chat room server over real sockets.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use futures_util::{SinkExt, StreamExt};
use kairo_server::{
    domain::{Hub, Tracer, tracer},
    ui::{Server, gate::CookieGate},
};
use tokio::{net::TcpStream, time::timeout};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{Message, client::IntoClientRequest, http::HeaderValue},
};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WAIT: Duration = Duration::from_secs(2);

/// Tracer keeping every hub event
#[derive(Default)]
struct RecordingTracer {
    events: Mutex<Vec<String>>,
}

impl RecordingTracer {
    fn count(&self, event: &str) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|recorded| *recorded == event)
            .count()
    }
}

impl Tracer for RecordingTracer {
    fn trace(&self, event: &str) {
        self.events.lock().unwrap().push(event.to_string());
    }
}

/// Start a server with a running hub on an ephemeral port and return its address
async fn start_server() -> String {
    start_server_with_tracer(tracer::off()).await
}

/// Same as [`start_server`], reporting hub activity to `tracer`
async fn start_server_with_tracer(tracer: Arc<dyn Tracer>) -> String {
    let (hub, handle) = Hub::with_tracer(tracer);
    tokio::spawn(hub.run());
    let app = Server::new(handle, Arc::new(CookieGate::default())).router();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    addr.to_string()
}

/// Connect to the room with the `auth` cookie set to `name`
async fn connect(addr: &str, name: &str) -> Socket {
    let mut request = format!("ws://{}/room", addr).into_client_request().unwrap();
    request.headers_mut().insert(
        "Cookie",
        HeaderValue::from_str(&format!("auth={}", name)).unwrap(),
    );
    let (socket, _response) = connect_async(request).await.unwrap();
    socket
}

/// Wait for the next text frame
async fn next_text(socket: &mut Socket) -> String {
    loop {
        let frame = timeout(WAIT, socket.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("connection closed")
            .expect("read error");
        if let Message::Text(text) = frame {
            return text.as_str().to_owned();
        }
    }
}

/// Skip text frames until `expected` arrives
async fn wait_for(socket: &mut Socket, expected: &str) {
    while next_text(socket).await != expected {}
}

/// Send a probe and wait for its echo, proving the hub registered the client
async fn connect_joined(addr: &str, name: &str) -> Socket {
    let mut socket = connect(addr, name).await;
    let probe = format!("{} joined", name);
    socket.send(Message::text(probe.clone())).await.unwrap();
    wait_for(&mut socket, &probe).await;
    socket
}

#[tokio::test]
async fn test_request_without_credential_is_redirected() {
    // テスト項目: auth クッキーのないリクエストは 307 でログインページへリダイレクトされる
    // given (前提条件):
    let recorder = Arc::new(RecordingTracer::default());
    let addr = start_server_with_tracer(recorder.clone()).await;
    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    // when (操作):
    // the gate answers before the upgrade is even attempted
    let response = client
        .get(format!("http://{}/room", addr))
        .header("Cookie", "theme=dark")
        .send()
        .await
        .unwrap();

    // then (期待する結果):
    assert_eq!(response.status().as_u16(), 307);
    assert_eq!(
        response.headers().get("location").unwrap().to_str().unwrap(),
        "/login"
    );
    // the hub serves joins in arrival order, so once alice is in, an
    // earlier join from the redirected request would have been recorded too
    let _alice = connect_joined(&addr, "alice").await;
    assert_eq!(recorder.count("New client joined"), 1);
}

#[tokio::test]
async fn test_websocket_without_credential_is_refused() {
    // テスト項目: auth クッキーなしでは WebSocket 接続が確立されない
    // given (前提条件):
    let addr = start_server().await;

    // when (操作):
    let result = connect_async(format!("ws://{}/room", addr)).await;

    // then (期待する結果):
    assert!(result.is_err());
}

#[tokio::test]
async fn test_message_reaches_every_client_once() {
    // テスト項目: 送信されたメッセージが送信者を含む全員に 1 回ずつ届く
    // given (前提条件):
    let addr = start_server().await;
    let mut alice = connect_joined(&addr, "alice").await;
    let mut bob = connect_joined(&addr, "bob").await;

    // when (操作):
    alice.send(Message::text("hello")).await.unwrap();
    alice.send(Message::text("end")).await.unwrap();

    // then (期待する結果):
    for socket in [&mut alice, &mut bob] {
        wait_for(socket, "hello").await;
        assert_eq!(next_text(socket).await, "end");
    }
}

#[tokio::test]
async fn test_messages_arrive_in_submission_order() {
    // テスト項目: 1 つのクライアントから送った複数のメッセージが全員に同じ順序で届く
    // given (前提条件):
    let addr = start_server().await;
    let mut alice = connect_joined(&addr, "alice").await;
    let mut bob = connect_joined(&addr, "bob").await;

    // when (操作):
    for i in 0..10 {
        bob.send(Message::text(format!("m{}", i))).await.unwrap();
    }

    // then (期待する結果):
    for socket in [&mut alice, &mut bob] {
        wait_for(socket, "m0").await;
        for i in 1..10 {
            assert_eq!(next_text(socket).await, format!("m{}", i));
        }
    }
}

#[tokio::test]
async fn test_disconnect_does_not_affect_others() {
    // テスト項目: 1 人が切断しても残りのクライアントは送受信を続けられる
    // given (前提条件):
    let addr = start_server().await;
    let mut alice = connect_joined(&addr, "alice").await;
    let mut bob = connect_joined(&addr, "bob").await;
    wait_for(&mut alice, "bob joined").await;

    // when (操作):
    alice.close(None).await.unwrap();
    drop(alice);
    bob.send(Message::text("anyone here?")).await.unwrap();

    // then (期待する結果):
    wait_for(&mut bob, "anyone here?").await;
    let mut carol = connect_joined(&addr, "carol").await;
    bob.send(Message::text("welcome")).await.unwrap();
    wait_for(&mut carol, "welcome").await;
}
