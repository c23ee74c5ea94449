//! Chat room broadcast engine.
//!
//! - `ChatRoom`: registry of named clients plus the producer side of the
//!   outgoing queue
//! - `Client`: handle for one joined session
//! - `Broadcaster`: background loop that drains the queue and fans each batch
//!   out to every client

mod broadcaster;
mod chat_room;
mod client;
mod config;

#[cfg(test)]
pub(crate) mod testing;

pub use broadcaster::{BroadcastReport, Broadcaster};
pub use chat_room::ChatRoom;
pub use client::Client;
pub use config::RoomConfig;
