//! Kotatsu chat relay.
//!
//! A single broadcast chat room over WebSocket. Clients join with a name,
//! their messages are queued, and a background broadcaster drains the queue
//! and delivers each batch to every participant as one HTML fragment.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
