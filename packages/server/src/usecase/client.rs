//! Handle for one joined session.

use std::sync::Arc;

use crate::domain::{
    ClientConnection, ClientName, ConnectionError, MessageError, OutgoingMessage, SessionId,
};

use super::{ChatRoom, broadcaster::deliver};

/// A client that joined the room.
///
/// Created by [`ChatRoom::join`]. The room's registry stores only the
/// connection, never the `Client`, so the handle's reference to the room does
/// not form a cycle. [`Client::exit`] consumes the handle: a departed client
/// cannot rejoin, a new `Client` has to be created by a fresh join.
pub struct Client {
    name: ClientName,
    session_id: SessionId,
    connection: Arc<dyn ClientConnection>,
    room: Arc<ChatRoom>,
}

impl Client {
    pub(crate) fn new(
        name: ClientName,
        session_id: SessionId,
        connection: Arc<dyn ClientConnection>,
        room: Arc<ChatRoom>,
    ) -> Self {
        Self {
            name,
            session_id,
            connection,
            room,
        }
    }

    pub fn name(&self) -> &ClientName {
        &self.name
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Queue `text` as a chat message from this client.
    ///
    /// Fails with [`MessageError::Departed`] once the client has been evicted;
    /// the session should end then.
    pub async fn new_message(&self, text: impl Into<String>) -> Result<(), MessageError> {
        let message = OutgoingMessage::Chat {
            from: self.name.clone(),
            text: text.into(),
        };
        self.room
            .post(&self.name, self.session_id, message.render())
            .await
    }

    /// Leave the room after the connection ended.
    pub async fn exit(self) {
        self.room.depart(&self.name, self.session_id).await;
    }

    /// Write `block` to this client as one frame.
    ///
    /// Same write and send timeout the broadcaster applies to each recipient.
    pub async fn send(&self, block: &str) -> Result<(), ConnectionError> {
        deliver(self.connection.as_ref(), block, self.room.send_timeout()).await
    }
}
