//! Bounded outgoing message queue.
//!
//! Many sessions produce, the broadcaster alone consumes. A full queue blocks
//! producers; that is the only backpressure in the system. With an enqueue
//! timeout configured, a producer gives up after the timeout and the message
//! is dropped.

use std::time::Duration;

use tokio::sync::mpsc::{self, error::TryRecvError};

use crate::domain::{MessageBlock, QueueError};

/// Create a queue holding at most `capacity` pending messages.
///
/// A capacity of zero is raised to one.
pub fn message_queue(
    capacity: usize,
    enqueue_timeout: Option<Duration>,
) -> (MessageQueue, QueueConsumer) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    (
        MessageQueue {
            sender,
            enqueue_timeout,
        },
        QueueConsumer { receiver },
    )
}

/// Producer side of the queue
#[derive(Debug, Clone)]
pub struct MessageQueue {
    sender: mpsc::Sender<String>,
    enqueue_timeout: Option<Duration>,
}

impl MessageQueue {
    /// Append `message` to the tail, waiting while the queue is full.
    pub async fn enqueue(&self, message: String) -> Result<(), QueueError> {
        self.reserve().await?.send(message);
        Ok(())
    }

    /// Wait for a free slot without sending anything yet.
    ///
    /// The slot is held until it is used or dropped, so the caller can decide
    /// whether to send after the wait is over.
    pub async fn reserve(&self) -> Result<QueueSlot<'_>, QueueError> {
        let permit = match self.enqueue_timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.sender.reserve())
                .await
                .map_err(|_| QueueError::Timeout(timeout.as_millis() as u64))?,
            None => self.sender.reserve().await,
        };
        permit
            .map(|permit| QueueSlot { permit })
            .map_err(|_| QueueError::Closed)
    }
}

/// A reserved place at the tail of the queue
pub struct QueueSlot<'a> {
    permit: mpsc::Permit<'a, String>,
}

impl QueueSlot<'_> {
    /// Fill the slot. Never waits.
    pub fn send(self, message: String) {
        self.permit.send(message);
    }
}

/// Consumer side of the queue
#[derive(Debug)]
pub struct QueueConsumer {
    receiver: mpsc::Receiver<String>,
}

impl QueueConsumer {
    /// Wait for the next message.
    ///
    /// Returns `None` once every producer is gone and the queue is empty.
    pub async fn recv(&mut self) -> Option<String> {
        self.receiver.recv().await
    }

    /// Pop messages without waiting until the queue reports empty, appending
    /// each to `block` in FIFO order. Returns the number of messages taken.
    pub fn drain_into(&mut self, block: &mut MessageBlock) -> usize {
        let mut taken = 0;
        loop {
            match self.receiver.try_recv() {
                Ok(message) => {
                    block.push(&message);
                    taken += 1;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        taken
    }
}
