//! Connection pumps moving messages between a WebSocket and the hub.
//!
//! Each connection runs two pumps:
//!
//! - the read pump owns the read half and forwards every frame to the hub
//! - the write pump owns the write half and drains the client's outbound queue
//!
//! Both are generic over `Stream`/`Sink` so they can run on any transport
//! that speaks axum's [`Message`].

use std::fmt::Display;

use axum::extract::ws::Message;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;

use crate::domain::{ChatMessage, ClientId, HubHandle};

/// Forward every frame read from `stream` to the hub.
///
/// Returns on the first read error, a close frame or the end of the stream,
/// dropping the read half. Graceful closes and transport errors are treated
/// alike.
pub async fn read_pump<S, E>(mut stream: S, hub: HubHandle, client_id: ClientId)
where
    S: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    while let Some(frame) = stream.next().await {
        let message = match frame {
            Ok(Message::Text(text)) => ChatMessage::from(text.as_str()),
            Ok(Message::Binary(data)) => {
                ChatMessage::from(String::from_utf8_lossy(&data).into_owned())
            }
            // pongs are answered by the protocol layer
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => continue,
            Ok(Message::Close(_)) => {
                tracing::info!("Client {} requested close", client_id);
                break;
            }
            Err(e) => {
                tracing::info!("Read from client {} failed: {}", client_id, e);
                break;
            }
        };

        tracing::debug!("Received from client {}: {}", client_id, message);
        if let Err(e) = hub.forward(message).await {
            tracing::warn!("Dropping message from client {}: {}", client_id, e);
            break;
        }
    }
}

/// Write every message taken from `outbound` to `sink`.
///
/// Returns after a write error, or once the hub has closed the queue and it
/// is drained. Either way the write half is closed.
pub async fn write_pump<S>(
    mut sink: S,
    mut outbound: mpsc::Receiver<ChatMessage>,
    client_id: ClientId,
) where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    while let Some(message) = outbound.recv().await {
        if let Err(e) = sink.send(Message::Text(message.to_string().into())).await {
            tracing::info!("Write to client {} failed: {}", client_id, e);
            break;
        }
    }

    release(&mut sink, client_id).await;
}

/// Close the write half. Safe to call on an already closed sink.
pub async fn release<S>(sink: &mut S, client_id: ClientId)
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    if let Err(e) = sink.close().await {
        tracing::debug!(
            "Connection of client {} already released: {}",
            client_id,
            e
        );
    }
}
