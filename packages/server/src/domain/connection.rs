//! Outbound connection interface.
//!
//! The room never touches sockets directly. Each joined client is registered
//! together with a `ClientConnection`, and the broadcaster delivers blocks
//! through it. The WebSocket implementation lives in the infrastructure layer.

use async_trait::async_trait;

use super::error::ConnectionError;

/// Write side of one client's connection
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClientConnection: Send + Sync {
    /// Write `block` as a single text frame.
    async fn send_text(&self, block: &str) -> Result<(), ConnectionError>;

    /// Close the connection. Best effort; errors are swallowed.
    async fn close(&self);
}
