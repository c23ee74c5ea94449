//! Domain layer error definitions.

use thiserror::Error;

/// Errors returned when a client tries to join the room
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JoinError {
    /// Another live client already holds the name
    #[error("Name '{0}' is already taken")]
    NameTaken(String),
}

/// Errors returned when enqueueing an outgoing message
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// The queue stayed full for the whole enqueue timeout
    #[error("Message queue stayed full for {0} ms")]
    Timeout(u64),

    /// The broadcaster is no longer consuming the queue
    #[error("Message queue is closed")]
    Closed,
}

/// Errors returned when a joined client posts a chat message
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MessageError {
    /// The session no longer holds its name, e.g. after an eviction
    #[error("Client '{0}' is no longer in the room")]
    Departed(String),

    #[error(transparent)]
    Queue(#[from] QueueError),
}

/// Errors raised while delivering a frame to a client
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// The underlying write failed
    #[error("Send failed: {0}")]
    SendFailed(String),

    /// The write did not complete within the send timeout
    #[error("Send timed out after {0} ms")]
    Timeout(u64),

    /// The connection was already closed
    #[error("Connection closed")]
    Closed,
}
