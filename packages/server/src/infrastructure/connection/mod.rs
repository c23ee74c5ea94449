//! Concrete `ClientConnection` implementations.
//!
//! - `websocket`: the write half of an axum WebSocket

pub mod websocket;

pub use websocket::WebSocketConnection;
