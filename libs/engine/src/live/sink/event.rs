use eyre::{Result, eyre};
use store::event::{model::DomainEvent, store::Store};

use crate::live::sink::handle::Sink;

pub struct EventSink {
    pub store: Store,
}

#[async_trait::async_trait]
impl Sink for EventSink {
    type Item = DomainEvent;

    async fn process(&self, event: &DomainEvent) -> Result<()> {
        match self.store.append(std::slice::from_ref(event)).await {
            Ok(inserted) => {
                tracing::info!(inserted, "Processed: {event:?}");
                Ok(())
            }
            Err(e) => {
                tracing::error!("Sink failed on [append]: {e:?}");
                Err(eyre!(e))
            }
        }
    }

    async fn process_batch(&self, events: &[DomainEvent]) -> Result<()> {
        match self.store.append(events).await {
            Ok(inserted) => {
                let nbr_of_rows = events.len();
                tracing::info!(inserted, "Processed batch: {nbr_of_rows:?}");
                Ok(())
            }
            Err(e) => {
                tracing::error!("Sink failed on [append] for a batch: {e:?}");
                Err(eyre!(e))
            }
        }
    }
}
