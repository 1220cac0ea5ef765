use crate::args::{Args, LiveMode};
use crate::error::EngineError;
use crate::live::source::filter::{ChunkFilter, StreamFilter};
use crate::live::source::handle::{Source, SourceInput};
use crate::live::state::event::Events;
use crate::live::state::logic::State;
use crate::live::state::outcome::Outcome;
use crate::retry::head_height_with_retry;
use eyre::Result;
use futures_util::StreamExt;
use std::fmt::Debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use store::event::model::EventKind;
use sync::producer::Producer;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub async fn spawn_event_producer<E, T>(
    args: &Args,
    events: Vec<EventKind>,
    shared_state: Arc<Mutex<State>>,
    tx: mpsc::Sender<Events<T>>,
    cancel: CancellationToken,
    source: Arc<dyn Source<Item = E>>,
) -> Result<JoinHandle<Result<()>>>
where
    E: SourceInput + Clone + Debug + Send + Sync + 'static,
    T: Outcome + TryFrom<E> + Debug + Send + Sync + 'static,
    <T as TryFrom<E>>::Error: Debug,
{
    match args.live_mode {
        LiveMode::Poll => Ok(spawn_poll_producer(args, events, shared_state, tx, cancel, source)),
        LiveMode::Subscribe => {
            spawn_stream_producer(args, events, shared_state, tx, cancel, source).await
        }
    }
}

// Polls the head and queries every range past the state's next block.
fn spawn_poll_producer<E, T>(
    args: &Args,
    events: Vec<EventKind>,
    shared_state: Arc<Mutex<State>>,
    tx: mpsc::Sender<Events<T>>,
    cancel: CancellationToken,
    source: Arc<dyn Source<Item = E>>,
) -> JoinHandle<Result<()>>
where
    E: SourceInput + Clone + Debug + Send + Sync + 'static,
    T: Outcome + TryFrom<E> + Debug + Send + Sync + 'static,
    <T as TryFrom<E>>::Error: Debug,
{
    let args = args.clone();
    let cancel_for_producer = cancel.clone();

    let producer_callback = move || {
        let state_for_producer = Arc::clone(&shared_state);
        let source_for_producer = Arc::clone(&source);
        let cancel = cancel_for_producer.clone();
        let events = events.clone();
        let args = args.clone();
        async move {
            poll_once(&args, events, &state_for_producer, &cancel, source_for_producer.as_ref())
                .await
        }
    };

    Producer::spawn(tx, cancel, producer_callback)
}

async fn poll_once<E, T>(
    args: &Args,
    events: Vec<EventKind>,
    state: &Mutex<State>,
    cancel: &CancellationToken,
    source: &dyn Source<Item = E>,
) -> Result<Events<T>>
where
    E: SourceInput + Clone + Debug,
    T: TryFrom<E>,
    <T as TryFrom<E>>::Error: Debug,
{
    match catch_up_once(args, events, state, cancel, source).await? {
        Some(events) => Ok(events),
        None => {
            tokio::time::sleep(args.poll_interval).await;
            Ok(Events(vec![]))
        }
    }
}

/// Queries the next range up to the current head, or `None` when already there.
async fn catch_up_once<E, T>(
    args: &Args,
    events: Vec<EventKind>,
    state: &Mutex<State>,
    cancel: &CancellationToken,
    source: &dyn Source<Item = E>,
) -> Result<Option<Events<T>>>
where
    E: SourceInput + Clone + Debug,
    T: TryFrom<E>,
    <T as TryFrom<E>>::Error: Debug,
{
    let head =
        head_height_with_retry(cancel, source, args.retry_deadline, args.retry_interval).await?;

    let mut state = state.lock().await;
    let Some((from, to)) = state.next_range(head, args.max_range_width) else {
        return Ok(None);
    };

    let chunk_filter = ChunkFilter {
        address: args.address,
        events,
        from_block_number: from,
        to_block_number: to,
    };
    let inputs = source.chunk(chunk_filter).await?;
    tracing::debug!(from, to, head, inputs = inputs.len(), "Queried range");
    Ok(Some(state.on_chunk(to, inputs)))
}

// Rolls the state forward with every log pushed by the source stream.
//
// A log filter only reports blocks imported after it was installed, so the
// blocks between the cursor and the head at install time are queried by range
// before the stream is drained.
async fn spawn_stream_producer<E, T>(
    args: &Args,
    events: Vec<EventKind>,
    shared_state: Arc<Mutex<State>>,
    tx: mpsc::Sender<Events<T>>,
    cancel: CancellationToken,
    source: Arc<dyn Source<Item = E>>,
) -> Result<JoinHandle<Result<()>>>
where
    E: SourceInput + Clone + Debug + Send + Sync + 'static,
    T: Outcome + TryFrom<E> + Debug + Send + Sync + 'static,
    <T as TryFrom<E>>::Error: Debug,
{
    let stream_filter = StreamFilter {
        address: args.address,
        events: events.clone(),
        from_block_number: shared_state.lock().await.get_next_block_number(),
        poll_interval: args.poll_interval,
    };
    let inputs_stream = source.stream(stream_filter).await?;

    // Arc lets every callback invocation share the stream, Mutex gives it mutable access
    let shared_inputs_stream = Arc::new(Mutex::new(inputs_stream));
    let caught_up = Arc::new(AtomicBool::new(false));
    let args = args.clone();
    let cancel_for_producer = cancel.clone();

    let producer_callback = move || {
        let inputs_stream_for_producer = Arc::clone(&shared_inputs_stream);
        let state_for_producer = Arc::clone(&shared_state);
        let source_for_producer = Arc::clone(&source);
        let caught_up = Arc::clone(&caught_up);
        let cancel = cancel_for_producer.clone();
        let events = events.clone();
        let args = args.clone();
        async move {
            if !caught_up.load(Ordering::Acquire) {
                let caught_up_events = catch_up_once(
                    &args,
                    events,
                    &state_for_producer,
                    &cancel,
                    source_for_producer.as_ref(),
                )
                .await;
                match caught_up_events {
                    Ok(Some(events)) => return Ok(events),
                    Ok(None) => {
                        tracing::info!("Caught up with the head, following the log stream");
                        caught_up.store(true, Ordering::Release);
                    }
                    Err(e) => return Err(e),
                }
            }

            let next = inputs_stream_for_producer.lock().await.next().await;
            match next {
                Some(input) => Ok(state_for_producer.lock().await.roll_forward(input)),
                None => {
                    tracing::error!("Stream ended");
                    Err(eyre::Report::new(EngineError::StreamEnded))
                }
            }
        }
    };

    Ok(Producer::spawn(tx, cancel, producer_callback))
}
