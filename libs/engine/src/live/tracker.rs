use crate::args::{Args, LiveMode};
use crate::checkpointer::{Checkpointer, Watermark};
use crate::error::EngineError;
use crate::live::pubsub::{publisher, subscriber};
use crate::live::sink::handle::Sink;
use crate::live::source::handle::{Source, SourceInput};
use crate::live::state::event::Events;
use crate::live::state::logic::State;
use crate::live::state::outcome::Outcome;
use alloy::primitives::BlockNumber;
use eyre::Result;
use std::fmt::Debug;
use std::sync::Arc;
use store::cursor::store::Store as CursorStore;
use store::event::model::EventKind;
use tokio::sync::{Mutex, mpsc};
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;

/// One producer/consumer pair and the cursor it owns.
pub struct Watcher {
    pub events: Vec<EventKind>,
    pub checkpointer: Checkpointer,
    /// Set when several watchers share the main cursor.
    pub watermark: Option<Arc<Watermark>>,
}

/// Cursor key of the watcher dedicated to `kind`.
pub fn watcher_cursor_key(cursor_key: &str, kind: EventKind) -> String {
    format!("{cursor_key}:{}", kind.name())
}

pub fn watchers(args: &Args, cursor_store: &CursorStore) -> Vec<Watcher> {
    let main = Checkpointer::new(cursor_store.clone(), args.cursor_key.clone());
    if !args.watcher_per_event {
        return vec![Watcher { events: args.events.clone(), checkpointer: main, watermark: None }];
    }

    let members: Vec<(EventKind, Checkpointer)> = args
        .events
        .iter()
        .map(|&kind| {
            let key = watcher_cursor_key(&args.cursor_key, kind);
            (kind, Checkpointer::new(cursor_store.clone(), key))
        })
        .collect();
    let watermark = Arc::new(Watermark::new(
        main,
        members.iter().map(|(_, checkpointer)| checkpointer.clone()).collect(),
    ));

    members
        .into_iter()
        .map(|(kind, checkpointer)| Watcher {
            events: vec![kind],
            checkpointer,
            watermark: Some(Arc::clone(&watermark)),
        })
        .collect()
}

fn channel_size(args: &Args) -> usize {
    match args.live_mode {
        // one message per polled range
        LiveMode::Poll => 16,
        // one message per log
        LiveMode::Subscribe => 1024,
    }
}

/// Runs every watcher until `cancel` fires or one of them fails.
///
/// Every event of the watchers' kinds up to `handoff` must already be persisted.
/// The first failure cancels the whole group and is returned once all tasks stopped.
pub async fn track<E, T>(
    args: &Args,
    watchers: Vec<Watcher>,
    handoff: BlockNumber,
    source: Arc<dyn Source<Item = E>>,
    sink: Arc<dyn Sink<Item = T>>,
    cancel: &CancellationToken,
) -> Result<()>
where
    E: SourceInput + Clone + Debug + Send + Sync + 'static,
    T: Outcome + TryFrom<E> + Debug + Send + Sync + 'static,
    <T as TryFrom<E>>::Error: Debug,
{
    let mut starts = Vec::with_capacity(watchers.len());
    for watcher in watchers {
        let mut cursor = watcher.checkpointer.load_or_seed(handoff).await?;
        if cursor < handoff {
            watcher.checkpointer.checkpoint(handoff).await?;
            cursor = handoff;
        }
        tracing::info!(key = watcher.checkpointer.key(), cursor, "Watcher starting");
        starts.push((watcher, cursor));
    }

    let group = cancel.child_token();
    let mut tasks = JoinSet::new();

    for (watcher, cursor) in starts {
        let (tx, rx) = mpsc::channel::<Events<T>>(channel_size(args));

        let consumer_handle = subscriber::spawn_event_consumer(
            rx,
            group.clone(),
            watcher.checkpointer,
            watcher.watermark,
            Arc::clone(&sink),
        );
        tasks.spawn(join(consumer_handle));

        let spawned = publisher::spawn_event_producer(
            args,
            watcher.events,
            Arc::new(Mutex::new(State::new(cursor))),
            tx,
            group.clone(),
            Arc::clone(&source),
        )
        .await;
        match spawned {
            Ok(producer_handle) => {
                tasks.spawn(join(producer_handle));
            }
            Err(e) => {
                tracing::error!("Watcher failed to start: {e:?}");
                group.cancel();
                while tasks.join_next().await.is_some() {}
                return Err(e);
            }
        }
    }

    let mut first_error = None;
    while let Some(joined) = tasks.join_next().await {
        let result = joined.map_err(eyre::Report::from).and_then(|result| result);
        if let Err(e) = result {
            group.cancel();
            if cancel.is_cancelled() && EngineError::is_cancellation(&e) {
                continue;
            }
            first_error.get_or_insert(e);
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => {
            tracing::info!("Live tracker stopped");
            Ok(())
        }
    }
}

async fn join(handle: JoinHandle<Result<()>>) -> Result<()> {
    handle.await?
}
