//! Entities.

use super::value_object::{ClientName, Timestamp};

/// A joined participant as seen from outside the room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub name: ClientName,
    pub joined_at: Timestamp,
}
