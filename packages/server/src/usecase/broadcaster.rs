//! Background loop that drains the outgoing queue and fans each batch out to
//! every joined client.

use std::{collections::VecDeque, sync::Arc, time::Duration};

use futures_util::future::join_all;

use crate::{
    domain::{ClientConnection, ConnectionError, MessageBlock, OutgoingMessage},
    infrastructure::{ClientRegistry, QueueConsumer, Recipient},
};

use super::RoomConfig;

/// Outcome of one broadcast iteration
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Messages in the delivered block
    pub messages: usize,
    /// Clients the block was written to
    pub delivered: usize,
    /// Clients whose write failed or timed out
    pub failed: usize,
    /// Failed clients removed from the room
    pub evicted: usize,
}

/// Single consumer of the room's message queue.
///
/// Each iteration drains everything queued so far into one block and writes
/// that block once to every client, so a burst of messages costs one frame
/// per client rather than one per message.
pub struct Broadcaster {
    registry: Arc<ClientRegistry>,
    consumer: QueueConsumer,
    /// Taken off the queue (or produced by evictions) but not delivered yet
    pending: VecDeque<String>,
    send_timeout: Option<Duration>,
    evict_on_send_failure: bool,
}

impl Broadcaster {
    pub(crate) fn new(
        registry: Arc<ClientRegistry>,
        consumer: QueueConsumer,
        config: &RoomConfig,
    ) -> Self {
        Self {
            registry,
            consumer,
            pending: VecDeque::new(),
            send_timeout: config.send_timeout,
            evict_on_send_failure: config.evict_on_send_failure,
        }
    }

    /// Broadcast until the queue is closed.
    ///
    /// Sleeps while there is nothing to send instead of polling.
    pub async fn run(mut self) {
        tracing::info!("Broadcaster started");
        while self.wait_for_message().await {
            self.broadcast().await;
        }
        tracing::info!("Broadcaster stopped: message queue closed");
    }

    async fn wait_for_message(&mut self) -> bool {
        if !self.pending.is_empty() {
            return true;
        }
        match self.consumer.recv().await {
            Some(message) => {
                self.pending.push_back(message);
                true
            }
            None => false,
        }
    }

    /// Run one broadcast iteration without waiting.
    ///
    /// Drains the queue into a block. An empty block is not delivered and no
    /// client is touched. Otherwise the registry is snapshotted and the block
    /// is written to every client concurrently, outside the registry lock.
    /// A failing client never stops delivery to the others.
    pub async fn broadcast(&mut self) -> BroadcastReport {
        let mut block = MessageBlock::new();
        for message in self.pending.drain(..) {
            block.push(&message);
        }
        self.consumer.drain_into(&mut block);

        if block.is_empty() {
            return BroadcastReport::default();
        }

        let recipients = self.registry.snapshot().await;
        let send_timeout = self.send_timeout;
        let results = join_all(
            recipients
                .iter()
                .map(|r| deliver(r.connection.as_ref(), block.as_str(), send_timeout)),
        )
        .await;

        let mut report = BroadcastReport {
            messages: block.len(),
            ..BroadcastReport::default()
        };
        for (recipient, result) in recipients.into_iter().zip(results) {
            match result {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!("Failed to deliver to client '{}': {}", recipient.name, e);
                    if self.evict_on_send_failure && self.evict(recipient).await {
                        report.evicted += 1;
                    }
                }
            }
        }

        tracing::debug!(
            "Broadcasted {} message(s) to {} client(s) ({} failed)",
            report.messages,
            report.delivered,
            report.failed
        );
        report
    }

    /// Treat a failed write as a disconnect.
    ///
    /// The leave announcement is kept locally and goes out with the next
    /// iteration; pushing it onto the queue from here could block forever on
    /// a full queue that only this loop drains.
    async fn evict(&mut self, recipient: Recipient) -> bool {
        if !self
            .registry
            .remove_session(&recipient.name, recipient.session_id)
            .await
        {
            return false;
        }

        match self.send_timeout {
            Some(limit) => {
                if tokio::time::timeout(limit, recipient.connection.close())
                    .await
                    .is_err()
                {
                    tracing::debug!("Timed out closing connection of '{}'", recipient.name);
                }
            }
            None => recipient.connection.close().await,
        }

        tracing::info!("Evicted client '{}' after a failed send", recipient.name);
        self.pending
            .push_back(OutgoingMessage::Left(recipient.name).render());
        true
    }
}

/// Write `block` to one connection, failing with
/// [`ConnectionError::Timeout`] when the write outlasts `send_timeout`.
pub(crate) async fn deliver(
    connection: &dyn ClientConnection,
    block: &str,
    send_timeout: Option<Duration>,
) -> Result<(), ConnectionError> {
    match send_timeout {
        Some(limit) => tokio::time::timeout(limit, connection.send_text(block))
            .await
            .map_err(|_| ConnectionError::Timeout(limit.as_millis() as u64))?,
        None => connection.send_text(block).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{ClientName, MessageError, connection::MockClientConnection},
        usecase::{
            ChatRoom,
            testing::{RecordingConnection, StalledConnection},
        },
    };
    use kotatsu_shared::time::FixedClock;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - 送信失敗時の振る舞い（他クライアントへの配信継続、追い出し、退出通知）
    // - 送信タイムアウト
    // - run ループがキューのクローズで終了すること
    // ========================================

    fn failing_connection(expected_closes: usize) -> MockClientConnection {
        let mut connection = MockClientConnection::new();
        connection
            .expect_send_text()
            .returning(|_| Err(ConnectionError::SendFailed("broken pipe".to_string())));
        connection
            .expect_close()
            .times(expected_closes)
            .returning(|| ());
        connection
    }

    #[tokio::test]
    async fn test_send_failure_does_not_stop_other_deliveries() {
        // テスト項目: 1 クライアントへの送信失敗があっても他のクライアントには届く
        // given (前提条件):
        let config = RoomConfig {
            evict_on_send_failure: false,
            ..RoomConfig::default()
        };
        let (room, mut broadcaster) = ChatRoom::new(config, Arc::new(FixedClock::new(0)));
        let healthy = Arc::new(RecordingConnection::default());
        let _broken = room
            .join(ClientName::from("broken"), Arc::new(failing_connection(0)))
            .await
            .unwrap();
        let _healthy = room
            .join(ClientName::from("healthy"), healthy.clone())
            .await
            .unwrap();

        // when (操作):
        let report = broadcaster.broadcast().await;

        // then (期待する結果):
        assert_eq!(report.delivered, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.evicted, 0);
        assert!(room.contains(&ClientName::from("broken")).await);
        assert_eq!(
            healthy.frames(),
            vec!["<B>broken</B> joined.<BR><B>healthy</B> joined.<BR>".to_string()]
        );
    }

    #[tokio::test]
    async fn test_send_failure_evicts_and_announces_departure() {
        // テスト項目: 送信失敗したクライアントは追い出され、次の配信で退出が通知される
        // given (前提条件):
        let (room, mut broadcaster) =
            ChatRoom::new(RoomConfig::default(), Arc::new(FixedClock::new(0)));
        let healthy = Arc::new(RecordingConnection::default());
        let _broken = room
            .join(ClientName::from("broken"), Arc::new(failing_connection(1)))
            .await
            .unwrap();
        let _healthy = room
            .join(ClientName::from("healthy"), healthy.clone())
            .await
            .unwrap();

        // when (操作):
        let first = broadcaster.broadcast().await;
        let second = broadcaster.broadcast().await;

        // then (期待する結果):
        assert_eq!(first.evicted, 1);
        assert!(!room.contains(&ClientName::from("broken")).await);
        assert_eq!(second.messages, 1);
        assert_eq!(second.delivered, 1);
        assert_eq!(
            healthy.frames().last(),
            Some(&"<B>broken</B> left the chat.<BR>".to_string())
        );
    }

    #[tokio::test]
    async fn test_stalled_client_times_out() {
        // テスト項目: 書き込みが終わらないクライアントは送信タイムアウトで失敗扱いになる
        // given (前提条件):
        let config = RoomConfig {
            send_timeout: Some(Duration::from_millis(20)),
            ..RoomConfig::default()
        };
        let (room, mut broadcaster) = ChatRoom::new(config, Arc::new(FixedClock::new(0)));
        let healthy = Arc::new(RecordingConnection::default());
        let _stalled = room
            .join(ClientName::from("stalled"), Arc::new(StalledConnection))
            .await
            .unwrap();
        let _healthy = room
            .join(ClientName::from("healthy"), healthy.clone())
            .await
            .unwrap();

        // when (操作):
        let report = broadcaster.broadcast().await;

        // then (期待する結果):
        assert_eq!(report.delivered, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.evicted, 1);
        assert!(!room.contains(&ClientName::from("stalled")).await);
        assert_eq!(healthy.frames().len(), 1);
    }

    #[tokio::test]
    async fn test_run_delivers_and_stops_when_room_is_dropped() {
        // テスト項目: run ループは配信を行い、ルームが破棄されると終了する
        // given (前提条件):
        let (room, broadcaster) =
            ChatRoom::new(RoomConfig::default(), Arc::new(FixedClock::new(0)));
        let recorder = Arc::new(RecordingConnection::default());
        let handle = tokio::spawn(broadcaster.run());

        // when (操作):
        let client = room
            .join(ClientName::from("alice"), recorder.clone())
            .await
            .unwrap();
        client.new_message("hi").await.unwrap();
        tokio::time::timeout(Duration::from_secs(1), async {
            while !recorder.frames().concat().contains("hi<BR>") {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("chat message should be delivered");
        client.exit().await;
        drop(room);

        // then (期待する結果):
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("broadcaster should stop once the queue is closed")
            .unwrap();
        let delivered = recorder.frames().concat();
        assert!(delivered.starts_with("<B>alice</B> joined.<BR>"));
        assert!(delivered.contains("<B>alice:</B> hi<BR>"));
    }

    #[tokio::test]
    async fn test_run_folds_queued_messages_into_one_frame() {
        // テスト項目: run ループ開始前に溜まっていたメッセージは 1 フレームにまとめて配信される
        // given (前提条件):
        let (room, broadcaster) =
            ChatRoom::new(RoomConfig::default(), Arc::new(FixedClock::new(0)));
        let recorder = Arc::new(RecordingConnection::default());
        let _watcher = room
            .join(ClientName::from("watcher"), recorder.clone())
            .await
            .unwrap();
        room.add_msg("one").await.unwrap();
        room.add_msg("two").await.unwrap();
        room.add_msg("three").await.unwrap();

        // when (操作):
        let handle = tokio::spawn(broadcaster.run());
        tokio::time::timeout(Duration::from_secs(1), async {
            while recorder.frames().is_empty() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("queued messages should be delivered");
        handle.abort();

        // then (期待する結果):
        assert_eq!(
            recorder.frames(),
            vec!["<B>watcher</B> joined.<BR>one<BR>two<BR>three<BR>".to_string()]
        );
    }

    #[tokio::test]
    async fn test_evicted_client_cannot_post_as_successor() {
        // テスト項目: 追い出されたクライアントの発言は受け付けられず、同名で参加し直した新しいクライアントにも届かない
        // given (前提条件):
        let (room, mut broadcaster) =
            ChatRoom::new(RoomConfig::default(), Arc::new(FixedClock::new(0)));
        let name = ClientName::from("alice");
        let stale = room
            .join(name.clone(), Arc::new(failing_connection(1)))
            .await
            .unwrap();
        let evicted = broadcaster.broadcast().await.evicted;
        let successor = Arc::new(RecordingConnection::default());
        let _fresh = room.join(name.clone(), successor.clone()).await.unwrap();
        broadcaster.broadcast().await;

        // when (操作):
        let result = stale.new_message("I am the real alice").await;
        let report = broadcaster.broadcast().await;

        // then (期待する結果):
        assert_eq!(evicted, 1);
        assert_eq!(result, Err(MessageError::Departed("alice".to_string())));
        assert_eq!(report.messages, 0);
        assert_eq!(room.len().await, 1);
        assert!(
            !successor
                .frames()
                .concat()
                .contains("I am the real alice")
        );
    }
}
