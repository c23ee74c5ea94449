//! Test doubles shared by the engine's unit tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::{ClientConnection, ConnectionError};

/// Connection that records every frame it is asked to send
#[derive(Default)]
pub(crate) struct RecordingConnection {
    frames: Mutex<Vec<String>>,
}

impl RecordingConnection {
    pub(crate) fn frames(&self) -> Vec<String> {
        self.frames.lock().unwrap().clone()
    }
}

#[async_trait]
impl ClientConnection for RecordingConnection {
    async fn send_text(&self, block: &str) -> Result<(), ConnectionError> {
        self.frames.lock().unwrap().push(block.to_string());
        Ok(())
    }

    async fn close(&self) {}
}

/// Connection whose writes never complete
pub(crate) struct StalledConnection;

#[async_trait]
impl ClientConnection for StalledConnection {
    async fn send_text(&self, _block: &str) -> Result<(), ConnectionError> {
        std::future::pending::<()>().await;
        Ok(())
    }

    async fn close(&self) {}
}
