//! Outgoing message formatting.
//!
//! Everything the room sends is an HTML fragment: names are wrapped in
//! `<B>`/`</B>` and every queued message is terminated by `<BR>` inside a
//! broadcast block. Names and text are inserted verbatim, without escaping.

use super::value_object::ClientName;

/// Separator appended after every message in a block
pub const LINE_BREAK: &str = "<BR>";

/// A message waiting to be queued
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutgoingMessage {
    /// System announcement for a successful join
    Joined(ClientName),
    /// System announcement for a departure
    Left(ClientName),
    /// Chat text sent by a participant
    Chat { from: ClientName, text: String },
}

impl OutgoingMessage {
    /// Render the message as the HTML fragment placed on the queue.
    pub fn render(&self) -> String {
        match self {
            Self::Joined(name) => format!("<B>{name}</B> joined."),
            Self::Left(name) => format!("<B>{name}</B> left the chat."),
            Self::Chat { from, text } => format!("<B>{from}:</B> {text}"),
        }
    }
}

/// Accumulates drained messages into a single broadcast payload.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MessageBlock {
    content: String,
    count: usize,
}

impl MessageBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one message followed by the line break.
    pub fn push(&mut self, message: &str) {
        self.content.push_str(message);
        self.content.push_str(LINE_BREAK);
        self.count += 1;
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of messages in the block
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn as_str(&self) -> &str {
        &self.content
    }
}
