//! WebSocket session handler.
//!
//! One task per connection. The first payload is the requested name; every
//! later payload is a chat message. The session ends when the peer closes or
//! a read fails, and the client then leaves the room. Outgoing frames are
//! written by the broadcaster through the registered connection, never from
//! here.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::stream::{SplitStream, StreamExt};

use crate::{
    domain::{ClientConnection, ClientName, JoinError, MessageError},
    infrastructure::connection::WebSocketConnection,
    ui::state::AppState,
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (sender, mut receiver) = socket.split();
    let connection: Arc<dyn ClientConnection> = Arc::new(WebSocketConnection::new(sender));

    let Some(requested) = read_payload(&mut receiver).await else {
        tracing::debug!("Connection ended before a join request arrived");
        connection.close().await;
        return;
    };

    let client = match state
        .room
        .join(ClientName::from(requested), Arc::clone(&connection))
        .await
    {
        Ok(client) => client,
        Err(JoinError::NameTaken(name)) => {
            tracing::warn!("Name '{}' is already taken. Rejecting connection.", name);
            connection.close().await;
            return;
        }
    };

    while let Some(text) = read_payload(&mut receiver).await {
        tracing::debug!("Received message from '{}': {}", client.name(), text);
        match client.new_message(text).await {
            Ok(()) => {}
            Err(MessageError::Departed(_)) => {
                tracing::info!(
                    "Client '{}' is no longer in the room. Ending session.",
                    client.name()
                );
                break;
            }
            Err(e) => tracing::warn!("Dropped message from '{}': {}", client.name(), e),
        }
    }

    tracing::info!("Connection of '{}' ended", client.name());
    client.exit().await;
}

/// Read the next text or binary payload.
///
/// Binary payloads are decoded as lossy UTF-8. Returns `None` once the peer
/// closes or the read fails.
async fn read_payload(receiver: &mut SplitStream<WebSocket>) -> Option<String> {
    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => return Some(text.to_string()),
            Ok(Message::Binary(data)) => return Some(String::from_utf8_lossy(&data).into_owned()),
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                // answered by the protocol layer
            }
            Ok(Message::Close(_)) => {
                tracing::debug!("Peer requested close");
                return None;
            }
            Err(e) => {
                tracing::warn!("WebSocket error: {}", e);
                return None;
            }
        }
    }
    None
}
