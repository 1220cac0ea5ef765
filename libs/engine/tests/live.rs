mod common;

#[cfg(test)]
mod tests {
    use crate::common::{self, MockSource, stake_log, transfer_log, wait_for_cursor};
    use alloy::rpc::types::Log;
    use engine::args::{Args, LiveMode};
    use engine::error::EngineError;
    use engine::live::sink::event::EventSink;
    use engine::live::sink::handle::Sink;
    use engine::live::source::handle::Source;
    use engine::live::tracker::{self, track, watcher_cursor_key};
    use eyre::{Result, eyre};
    use std::sync::Arc;
    use std::sync::atomic::Ordering;
    use std::time::Duration;
    use store::cursor::model::DEFAULT_CURSOR_KEY;
    use store::cursor::store::Store as CursorStore;
    use store::event::model::{DomainEvent, EventKind};
    use store::event::store::Store as EventStore;
    use tokio::task::JoinHandle;
    use tokio_util::sync::CancellationToken;

    const WAIT: Duration = Duration::from_secs(5);

    /// Persists everything but stakes.
    struct StakeRejectingSink {
        inner: EventSink,
    }

    #[async_trait::async_trait]
    impl Sink for StakeRejectingSink {
        type Item = DomainEvent;

        async fn process(&self, element: &DomainEvent) -> Result<()> {
            self.process_batch(std::slice::from_ref(element)).await
        }

        async fn process_batch(&self, elements: &[DomainEvent]) -> Result<()> {
            if elements.iter().any(|e| e.kind() == EventKind::Stake) {
                return Err(eyre!("disk I/O error"));
            }
            self.inner.process_batch(elements).await
        }
    }

    fn spawn_tracker(
        args: Args,
        handoff: u64,
        source: Arc<MockSource>,
        cursor_store: &CursorStore,
        sink: Arc<dyn Sink<Item = DomainEvent>>,
        cancel: &CancellationToken,
    ) -> JoinHandle<Result<()>> {
        let watchers = tracker::watchers(&args, cursor_store);
        let source: Arc<dyn Source<Item = Log>> = source;
        let cancel = cancel.clone();
        tokio::spawn(async move { track(&args, watchers, handoff, source, sink, &cancel).await })
    }

    fn event_sink(event_store: &EventStore) -> Arc<dyn Sink<Item = DomainEvent>> {
        Arc::new(EventSink { store: event_store.clone() })
    }

    #[tokio::test]
    async fn test_poll_follows_new_blocks() -> Result<()> {
        let (cursor_store, event_store) = common::stores().await?;
        let source = Arc::new(MockSource::new(10, vec![]));
        let cancel = CancellationToken::new();

        let handle = spawn_tracker(
            common::args(),
            10,
            Arc::clone(&source),
            &cursor_store,
            event_sink(&event_store),
            &cancel,
        );
        wait_for_cursor(&cursor_store, DEFAULT_CURSOR_KEY, 10, WAIT).await?;

        source.push_log(transfer_log(12, 0));
        source.push_log(transfer_log(15, 0));
        source.push_log(transfer_log(15, 1));
        source.set_head(15);
        wait_for_cursor(&cursor_store, DEFAULT_CURSOR_KEY, 15, WAIT).await?;
        assert_eq!(event_store.count(EventKind::Transfer).await?, 3);

        source.push_log(transfer_log(16, 0));
        source.set_head(20);
        wait_for_cursor(&cursor_store, DEFAULT_CURSOR_KEY, 20, WAIT).await?;
        assert_eq!(event_store.count(EventKind::Transfer).await?, 4);

        // every range starts right after the previous one
        let chunks = source.chunks();
        assert!(chunks.windows(2).all(|pair| pair[1].0 == pair[0].1 + 1), "{chunks:?}");

        cancel.cancel();
        handle.await??;
        Ok(())
    }

    #[tokio::test]
    async fn test_poll_cancel_returns_cleanly() -> Result<()> {
        let (cursor_store, event_store) = common::stores().await?;
        let source = Arc::new(MockSource::new(10, vec![]));
        let cancel = CancellationToken::new();

        let handle = spawn_tracker(
            common::args(),
            10,
            Arc::clone(&source),
            &cursor_store,
            event_sink(&event_store),
            &cancel,
        );
        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();

        tokio::time::timeout(Duration::from_millis(200), handle).await???;
        assert_eq!(cursor_store.get(DEFAULT_CURSOR_KEY).await?, Some(10));
        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_interrupts_head_retries() -> Result<()> {
        let (cursor_store, event_store) = common::stores().await?;
        let source = Arc::new(MockSource::new(10, vec![]));
        source.fail_head.store(true, Ordering::SeqCst);
        let cancel = CancellationToken::new();
        let mut args = common::args();
        args.retry_deadline = Duration::from_secs(60);

        let handle = spawn_tracker(
            args,
            5,
            Arc::clone(&source),
            &cursor_store,
            event_sink(&event_store),
            &cancel,
        );
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();

        tokio::time::timeout(Duration::from_millis(100), handle).await???;
        assert_eq!(cursor_store.get(DEFAULT_CURSOR_KEY).await?, Some(5));
        Ok(())
    }

    #[tokio::test]
    async fn test_head_deadline_terminates_tracker() -> Result<()> {
        let (cursor_store, event_store) = common::stores().await?;
        let source = Arc::new(MockSource::new(10, vec![]));
        source.fail_head.store(true, Ordering::SeqCst);
        let cancel = CancellationToken::new();
        let mut args = common::args();
        args.retry_deadline = Duration::from_millis(100);

        let handle = spawn_tracker(
            args,
            10,
            Arc::clone(&source),
            &cursor_store,
            event_sink(&event_store),
            &cancel,
        );

        let e = tokio::time::timeout(WAIT, handle).await??.expect_err("tracker must fail");
        assert!(matches!(e.downcast_ref::<EngineError>(), Some(EngineError::DeadlineExceeded { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_watcher_per_event_cursors_and_watermark() -> Result<()> {
        let (cursor_store, event_store) = common::stores().await?;
        let source = Arc::new(MockSource::new(10, vec![transfer_log(12, 0), stake_log(14, 0)]));
        let cancel = CancellationToken::new();
        let mut args = common::args();
        args.events = vec![EventKind::Transfer, EventKind::Stake];
        args.watcher_per_event = true;

        let handle = spawn_tracker(
            args,
            10,
            Arc::clone(&source),
            &cursor_store,
            event_sink(&event_store),
            &cancel,
        );
        source.set_head(20);

        let transfer_key = watcher_cursor_key(DEFAULT_CURSOR_KEY, EventKind::Transfer);
        let stake_key = watcher_cursor_key(DEFAULT_CURSOR_KEY, EventKind::Stake);
        assert_eq!(transfer_key, "block:Transfer");
        wait_for_cursor(&cursor_store, &transfer_key, 20, WAIT).await?;
        wait_for_cursor(&cursor_store, &stake_key, 20, WAIT).await?;
        wait_for_cursor(&cursor_store, DEFAULT_CURSOR_KEY, 20, WAIT).await?;

        assert_eq!(event_store.count(EventKind::Transfer).await?, 1);
        assert_eq!(event_store.count(EventKind::Stake).await?, 1);

        cancel.cancel();
        handle.await??;
        Ok(())
    }

    #[tokio::test]
    async fn test_watchers_fail_as_a_unit() -> Result<()> {
        let (cursor_store, event_store) = common::stores().await?;
        let source = Arc::new(MockSource::new(10, vec![stake_log(12, 0)]));
        let cancel = CancellationToken::new();
        let mut args = common::args();
        args.events = vec![EventKind::Transfer, EventKind::Stake];
        args.watcher_per_event = true;
        let sink = Arc::new(StakeRejectingSink { inner: EventSink { store: event_store.clone() } });

        let handle =
            spawn_tracker(args, 10, Arc::clone(&source), &cursor_store, sink, &cancel);
        source.set_head(20);

        let e = tokio::time::timeout(WAIT, handle).await??.expect_err("group must fail");
        assert!(e.to_string().contains("disk I/O error"));
        // the failed range was not checkpointed, and the shared cursor never passed it
        let stake_key = watcher_cursor_key(DEFAULT_CURSOR_KEY, EventKind::Stake);
        assert_eq!(cursor_store.get(&stake_key).await?, Some(10));
        assert!(cursor_store.get(DEFAULT_CURSOR_KEY).await?.unwrap_or_default() <= 10);
        // the group token is a child, the caller's token is untouched
        assert!(!cancel.is_cancelled());
        Ok(())
    }

    #[tokio::test]
    async fn test_subscribe_checkpoints_previous_block() -> Result<()> {
        let (cursor_store, event_store) = common::stores().await?;
        let source = Arc::new(MockSource::new(10, vec![]));
        *source.stream_logs.lock().unwrap() =
            vec![transfer_log(11, 0), transfer_log(11, 1), transfer_log(13, 0)];
        let cancel = CancellationToken::new();
        let mut args = common::args();
        args.live_mode = LiveMode::Subscribe;

        let handle = spawn_tracker(
            args,
            10,
            Arc::clone(&source),
            &cursor_store,
            event_sink(&event_store),
            &cancel,
        );

        wait_for_cursor(&cursor_store, DEFAULT_CURSOR_KEY, 12, WAIT).await?;
        assert_eq!(event_store.count(EventKind::Transfer).await?, 3);

        // block 13 may still receive logs
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(cursor_store.get(DEFAULT_CURSOR_KEY).await?, Some(12));

        cancel.cancel();
        handle.await??;
        Ok(())
    }

    #[tokio::test]
    async fn test_subscribe_catches_up_blocks_before_the_stream() -> Result<()> {
        let (cursor_store, event_store) = common::stores().await?;
        // blocks 11..=20 were produced after the handoff but before the stream opened
        let source =
            Arc::new(MockSource::new(20, vec![transfer_log(11, 0), transfer_log(15, 0)]));
        *source.stream_logs.lock().unwrap() = vec![transfer_log(22, 0)];
        let cancel = CancellationToken::new();
        let mut args = common::args();
        args.live_mode = LiveMode::Subscribe;
        args.max_range_width = 4;

        let handle = spawn_tracker(
            args,
            10,
            Arc::clone(&source),
            &cursor_store,
            event_sink(&event_store),
            &cancel,
        );

        wait_for_cursor(&cursor_store, DEFAULT_CURSOR_KEY, 21, WAIT).await?;
        // 11 and 15 came from ranged queries, 22 from the stream
        assert_eq!(event_store.count(EventKind::Transfer).await?, 3);
        assert_eq!(source.chunks(), vec![(11, 14), (15, 18), (19, 20)]);

        cancel.cancel();
        handle.await??;
        Ok(())
    }

    #[tokio::test]
    async fn test_subscribe_stream_end_is_an_error() -> Result<()> {
        let (cursor_store, event_store) = common::stores().await?;
        let source = Arc::new(MockSource { end_stream: true, ..MockSource::new(10, vec![]) });
        *source.stream_logs.lock().unwrap() = vec![transfer_log(11, 0)];
        let cancel = CancellationToken::new();
        let mut args = common::args();
        args.live_mode = LiveMode::Subscribe;

        let handle = spawn_tracker(
            args,
            10,
            Arc::clone(&source),
            &cursor_store,
            event_sink(&event_store),
            &cancel,
        );

        let e = tokio::time::timeout(WAIT, handle).await??.expect_err("stream end must fail");
        assert!(matches!(e.downcast_ref::<EngineError>(), Some(EngineError::StreamEnded)));
        Ok(())
    }
}
