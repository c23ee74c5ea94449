//! Domain layer: value objects, message formatting, and the outbound
//! connection interface.

pub mod connection;
pub mod entity;
pub mod error;
pub mod message;
pub mod value_object;

pub use connection::ClientConnection;
pub use entity::Participant;
pub use error::{ConnectionError, JoinError, MessageError, QueueError};
pub use message::{MessageBlock, OutgoingMessage};
pub use value_object::{ClientName, SessionId, Timestamp};
