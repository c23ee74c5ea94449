//! The chat room: registry of joined clients and the producer side of the
//! outgoing message queue.

use std::{sync::Arc, time::Duration};

use kotatsu_shared::time::{Clock, SystemClock};
use tokio::task::JoinHandle;

use crate::{
    domain::{
        ClientConnection, ClientName, JoinError, MessageError, OutgoingMessage, Participant,
        QueueError, SessionId,
    },
    infrastructure::{ClientRegistry, MessageQueue, message_queue},
};

use super::{Broadcaster, Client, RoomConfig};

/// Registry of named clients plus the queue every outgoing message goes
/// through.
///
/// Constructed explicitly and shared as `Arc<ChatRoom>`; there is no global
/// instance. Clients keep the room alive, and the broadcaster stops on its
/// own once the room and every client handle have been dropped.
pub struct ChatRoom {
    registry: Arc<ClientRegistry>,
    queue: MessageQueue,
    send_timeout: Option<Duration>,
}

impl ChatRoom {
    /// Create a room and its broadcaster without starting the broadcaster.
    ///
    /// The caller decides how the broadcaster runs: spawn [`Broadcaster::run`]
    /// or drive [`Broadcaster::broadcast`] by hand.
    pub fn new(config: RoomConfig, clock: Arc<dyn Clock>) -> (Arc<Self>, Broadcaster) {
        let registry = Arc::new(ClientRegistry::new(clock));
        let (queue, consumer) = message_queue(config.queue_capacity, config.enqueue_timeout);
        let broadcaster = Broadcaster::new(Arc::clone(&registry), consumer, &config);

        let room = Self {
            registry,
            queue,
            send_timeout: config.send_timeout,
        };
        (Arc::new(room), broadcaster)
    }

    /// Create a room on the system clock and spawn its broadcaster.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(config: RoomConfig) -> (Arc<Self>, JoinHandle<()>) {
        let (room, broadcaster) = Self::new(config, Arc::new(SystemClock));
        let handle = tokio::spawn(broadcaster.run());
        (room, handle)
    }

    /// Register `name` for `connection`.
    ///
    /// Fails with [`JoinError::NameTaken`] when a live client already holds
    /// the name; nothing is registered or announced in that case. On success
    /// the join announcement is queued after the registry has been updated.
    pub async fn join(
        self: &Arc<Self>,
        name: ClientName,
        connection: Arc<dyn ClientConnection>,
    ) -> Result<Client, JoinError> {
        let session_id = self
            .registry
            .try_insert(name.clone(), Arc::clone(&connection))
            .await?;
        tracing::info!("Client '{}' joined (session {})", name, session_id);

        self.announce(OutgoingMessage::Joined(name.clone())).await;

        Ok(Client::new(name, session_id, connection, Arc::clone(self)))
    }

    /// Remove `name` and queue the leave announcement.
    ///
    /// Removing a name that is not present is not an error.
    pub async fn leave(&self, name: &ClientName) {
        if self.registry.remove(name).await {
            tracing::info!("Client '{}' left", name);
        } else {
            tracing::debug!("Client '{}' was not in the room", name);
        }
        self.announce(OutgoingMessage::Left(name.clone())).await;
    }

    /// Leave on behalf of one session. No-op when the session no longer holds
    /// the name, which happens after an eviction.
    pub(crate) async fn depart(&self, name: &ClientName, session_id: SessionId) {
        if self.registry.remove_session(name, session_id).await {
            tracing::info!("Client '{}' left (session {})", name, session_id);
            self.announce(OutgoingMessage::Left(name.clone())).await;
        } else {
            tracing::debug!(
                "Session {} of '{}' was already removed from the room",
                session_id,
                name
            );
        }
    }

    /// Append an already formatted fragment to the outgoing queue.
    ///
    /// Waits while the queue is full.
    pub async fn add_msg(&self, text: impl Into<String>) -> Result<(), QueueError> {
        self.queue.enqueue(text.into()).await
    }

    /// Queue `text` on behalf of one session.
    ///
    /// The membership check and the enqueue happen under the registry lock,
    /// so a session that has been evicted or has left can never get a message
    /// out, even if it raced with the removal. The queue slot is reserved
    /// before the lock is taken.
    pub(crate) async fn post(
        &self,
        name: &ClientName,
        session_id: SessionId,
        text: String,
    ) -> Result<(), MessageError> {
        let slot = self.queue.reserve().await?;
        self.registry
            .with_session(name, session_id, || slot.send(text))
            .await
            .ok_or_else(|| MessageError::Departed(name.to_string()))
    }

    pub(crate) fn send_timeout(&self) -> Option<Duration> {
        self.send_timeout
    }

    async fn announce(&self, message: OutgoingMessage) {
        if let Err(e) = self.add_msg(message.render()).await {
            tracing::warn!("Dropped announcement {:?}: {}", message, e);
        }
    }

    /// Joined participants sorted by name
    pub async fn participants(&self) -> Vec<Participant> {
        self.registry.participants().await
    }

    pub async fn contains(&self, name: &ClientName) -> bool {
        self.registry.contains(name).await
    }

    pub async fn len(&self) -> usize {
        self.registry.len().await
    }

    pub async fn is_empty(&self) -> bool {
        self.registry.is_empty().await
    }
}
