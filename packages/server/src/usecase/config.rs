//! Room-level settings.

use std::time::Duration;

/// Default number of pending messages before producers block
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Default limit for one write to one client
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Settings for a [`ChatRoom`](super::ChatRoom) and its broadcaster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomConfig {
    /// Capacity of the outgoing message queue
    pub queue_capacity: usize,
    /// How long a producer waits on a full queue before the message is
    /// dropped. `None` waits indefinitely.
    pub enqueue_timeout: Option<Duration>,
    /// How long one client write may take before it counts as failed.
    /// `None` waits indefinitely.
    pub send_timeout: Option<Duration>,
    /// Remove a client from the room when a write to it fails
    pub evict_on_send_failure: bool,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            enqueue_timeout: None,
            send_timeout: Some(DEFAULT_SEND_TIMEOUT),
            evict_on_send_failure: true,
        }
    }
}
