use eyre::Result;
use std::{future::Future, pin::Pin, sync::Arc};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub type ConsumerCallback<T> =
    dyn Fn(T) -> Pin<Box<dyn Future<Output = Result<()>> + Send>> + Send + Sync + 'static;

/// Drains a channel through a callback until cancelled or the channel closes.
///
/// A callback runs to completion once started; cancellation is only observed
/// between messages. A callback failure cancels the token and ends the loop.
pub struct Consumer<T: 'static> {
    consumer_callback: Arc<ConsumerCallback<T>>,
    rx: mpsc::Receiver<T>,
    cancel: CancellationToken,
}

impl<T> Consumer<T> {
    pub fn new(
        consumer_callback: Arc<ConsumerCallback<T>>,
        rx: mpsc::Receiver<T>,
        cancel: CancellationToken,
    ) -> Self {
        Self { consumer_callback, rx, cancel }
    }
}

impl<T: Send + Sync + 'static> Consumer<T> {
    pub fn spawn<F, Fut>(
        rx: mpsc::Receiver<T>,
        cancel: CancellationToken,
        consumer_callback_factory: F,
    ) -> tokio::task::JoinHandle<Result<()>>
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let consumer_callback: Arc<ConsumerCallback<T>> =
            Arc::new(move |msg: T| Box::pin(consumer_callback_factory(msg)));

        let mut consumer = Consumer::new(consumer_callback, rx, cancel);

        tokio::spawn(async move {
            let result = consumer.run().await;
            if let Err(e) = &result {
                tracing::error!("Consumer failed: {e:?}");
            }
            result
        })
    }
}

impl<T> Consumer<T> {
    pub async fn run(&mut self) -> Result<()> {
        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    // Shutdown signal received
                    break
                }
                maybe_msg = self.rx.recv() => {
                    match maybe_msg {
                        Some(data) => {
                            let consumer_callback = Arc::clone(&self.consumer_callback);
                            if let Err(e) = consumer_callback(data).await {
                                self.cancel.cancel();
                                return Err(e);
                            }
                        }
                        None => {
                            // Channel closed
                            break
                        },
                    }
                }
            }
        }

        Ok(())
    }
}
