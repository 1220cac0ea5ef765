use crate::{
    checkpointer::{Checkpointer, Watermark},
    live::{
        sink::handle::Sink,
        state::event::{Event, Events},
    },
};
use eyre::Result;
use std::fmt::Debug;
use std::sync::Arc;
use sync::consumer::Consumer;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub async fn consume_event_outcome<T: Debug>(
    event: Event<T>,
    checkpointer: &Checkpointer,
    watermark: Option<&Watermark>,
    sink: &dyn Sink<Item = T>,
) -> Result<()> {
    match event {
        Event::Skip => {
            tracing::debug!("Consumer skipped consumed: {event:?}");
            Ok(())
        }
        Event::Checkpoint(block_number) => {
            tracing::debug!("Consumer consumed checkpoint: {block_number}");
            checkpointer.checkpoint(block_number).await?;
            if let Some(watermark) = watermark {
                watermark.refresh().await?;
            }
            Ok(())
        }
        Event::Element(e) => {
            tracing::info!("Consumer consumed element: {e:?}");
            sink.process(&e).await
        }
        Event::Many(elements) => {
            let number_of_elements = elements.len();
            if number_of_elements == 0 {
                return Ok(());
            }
            tracing::info!("Consumer consumed {number_of_elements} many elements");
            sink.process_batch(&elements).await
        }
    }
}

// In order: a checkpoint always follows the elements it covers
async fn consume_events<T: Debug>(
    events: Vec<Event<T>>,
    checkpointer: &Checkpointer,
    watermark: Option<&Watermark>,
    sink: &dyn Sink<Item = T>,
) -> Result<()> {
    for event in events {
        consume_event_outcome(event, checkpointer, watermark, sink).await?;
    }
    Ok(())
}

pub fn spawn_event_consumer<T>(
    rx: mpsc::Receiver<Events<T>>,
    cancel: CancellationToken,
    checkpointer: Checkpointer,
    watermark: Option<Arc<Watermark>>,
    sink: Arc<dyn Sink<Item = T>>,
) -> JoinHandle<Result<()>>
where
    T: Debug + Send + Sync + 'static,
{
    let checkpointer = Arc::new(checkpointer);

    let consumer_callback = move |Events(events): Events<T>| {
        let checkpointer_for_consumer = Arc::clone(&checkpointer);
        let watermark_for_consumer = watermark.clone();
        let sink_for_consumer = Arc::clone(&sink);
        async move {
            consume_events(
                events,
                checkpointer_for_consumer.as_ref(),
                watermark_for_consumer.as_deref(),
                sink_for_consumer.as_ref(),
            )
            .await
        }
    };

    Consumer::spawn(rx, cancel, consumer_callback)
}
