//! HTTP API response bodies.

use serde::{Deserialize, Serialize};

use crate::domain::Participant;
use kotatsu_shared::time::millis_to_rfc3339;

/// One joined participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantDto {
    pub name: String,
    /// RFC 3339, UTC
    pub joined_at: String,
}

impl From<Participant> for ParticipantDto {
    fn from(participant: Participant) -> Self {
        Self {
            name: participant.name.into_string(),
            joined_at: millis_to_rfc3339(participant.joined_at.value()),
        }
    }
}

/// Health check body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthDto {
    pub status: String,
}
