//! `ClientConnection` over an axum WebSocket.
//!
//! The session handler splits the socket: it keeps reading from the stream
//! half and hands the sink half to this type, which the registry stores for
//! the broadcaster. Writes are serialized through a mutex so a block always
//! goes out as one frame.

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures_util::{sink::SinkExt, stream::SplitSink};
use tokio::sync::Mutex;

use crate::domain::{ClientConnection, ConnectionError};

/// Write half of one client's WebSocket
pub struct WebSocketConnection {
    sink: Mutex<SplitSink<WebSocket, Message>>,
}

impl WebSocketConnection {
    pub fn new(sink: SplitSink<WebSocket, Message>) -> Self {
        Self {
            sink: Mutex::new(sink),
        }
    }
}

#[async_trait]
impl ClientConnection for WebSocketConnection {
    async fn send_text(&self, block: &str) -> Result<(), ConnectionError> {
        let mut sink = self.sink.lock().await;
        sink.send(Message::Text(block.to_owned().into()))
            .await
            .map_err(|e| ConnectionError::SendFailed(e.to_string()))
    }

    async fn close(&self) {
        let mut sink = self.sink.lock().await;
        if let Err(e) = sink.close().await {
            tracing::debug!("Failed to close WebSocket cleanly: {}", e);
        }
    }
}
