//! Shared handler state.

use std::sync::Arc;

use crate::usecase::ChatRoom;

/// Shared application state
pub struct AppState {
    /// The room every connection joins
    pub room: Arc<ChatRoom>,
}
