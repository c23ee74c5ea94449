//! Infrastructure layer: the outgoing message queue, the client registry,
//! and concrete connection implementations.

pub mod connection;
pub mod dto;
pub mod queue;
pub mod registry;

pub use queue::{MessageQueue, QueueConsumer, QueueSlot, message_queue};
pub use registry::{ClientRegistry, Recipient};
