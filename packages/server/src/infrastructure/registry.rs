//! In-memory client registry.
//!
//! Maps each participant name to the live connection of the session that
//! holds it. A single `tokio::sync::Mutex` guards the map. It is held only for
//! the map access itself and never across a network write: the broadcaster
//! takes a snapshot and writes after releasing the lock.

use std::{collections::HashMap, sync::Arc};

use kotatsu_shared::time::Clock;
use tokio::sync::Mutex;

use crate::domain::{ClientConnection, ClientName, JoinError, Participant, SessionId, Timestamp};

struct RegistryEntry {
    session_id: SessionId,
    connection: Arc<dyn ClientConnection>,
    joined_at: Timestamp,
}

/// Delivery target captured by [`ClientRegistry::snapshot`]
#[derive(Clone)]
pub struct Recipient {
    pub name: ClientName,
    pub session_id: SessionId,
    pub connection: Arc<dyn ClientConnection>,
}

/// Registry of joined clients, keyed by name
pub struct ClientRegistry {
    clients: Mutex<HashMap<ClientName, RegistryEntry>>,
    clock: Arc<dyn Clock>,
}

impl ClientRegistry {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clients: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Register `name` unless a live client already holds it.
    pub async fn try_insert(
        &self,
        name: ClientName,
        connection: Arc<dyn ClientConnection>,
    ) -> Result<SessionId, JoinError> {
        let mut clients = self.clients.lock().await;
        if clients.contains_key(&name) {
            return Err(JoinError::NameTaken(name.into_string()));
        }

        let session_id = SessionId::generate();
        clients.insert(
            name,
            RegistryEntry {
                session_id,
                connection,
                joined_at: Timestamp::new(self.clock.now_millis()),
            },
        );
        Ok(session_id)
    }

    /// Remove `name` whoever holds it. Returns whether an entry was removed.
    pub async fn remove(&self, name: &ClientName) -> bool {
        let mut clients = self.clients.lock().await;
        clients.remove(name).is_some()
    }

    /// Remove `name` only while it still belongs to `session_id`.
    pub async fn remove_session(&self, name: &ClientName, session_id: SessionId) -> bool {
        let mut clients = self.clients.lock().await;
        match clients.get(name) {
            Some(entry) if entry.session_id == session_id => {
                clients.remove(name);
                true
            }
            _ => false,
        }
    }

    /// Run `action` under the registry lock, but only while `name` still
    /// belongs to `session_id`. Returns `None` without running it otherwise.
    ///
    /// `action` must not wait on anything that needs this lock.
    pub async fn with_session<R>(
        &self,
        name: &ClientName,
        session_id: SessionId,
        action: impl FnOnce() -> R,
    ) -> Option<R> {
        let clients = self.clients.lock().await;
        match clients.get(name) {
            Some(entry) if entry.session_id == session_id => Some(action()),
            _ => None,
        }
    }

    /// Copy out the current delivery targets.
    pub async fn snapshot(&self) -> Vec<Recipient> {
        let clients = self.clients.lock().await;
        clients
            .iter()
            .map(|(name, entry)| Recipient {
                name: name.clone(),
                session_id: entry.session_id,
                connection: Arc::clone(&entry.connection),
            })
            .collect()
    }

    /// Joined participants sorted by name
    pub async fn participants(&self) -> Vec<Participant> {
        let mut participants: Vec<Participant> = {
            let clients = self.clients.lock().await;
            clients
                .iter()
                .map(|(name, entry)| Participant {
                    name: name.clone(),
                    joined_at: entry.joined_at,
                })
                .collect()
        };
        participants.sort_by(|a, b| a.name.cmp(&b.name));
        participants
    }

    pub async fn contains(&self, name: &ClientName) -> bool {
        self.clients.lock().await.contains_key(name)
    }

    pub async fn len(&self) -> usize {
        self.clients.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.clients.lock().await.is_empty()
    }
}
