use eyre::Result;
use std::{future::Future, pin::Pin, sync::Arc};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub type ProducerCallback<T> =
    dyn Fn() -> Pin<Box<dyn Future<Output = Result<T>> + Send>> + Send + Sync + 'static;

/// Repeatedly runs a callback and forwards each produced item to a channel.
///
/// The loop stops when the token is cancelled or the receiver is dropped.
/// A callback failure cancels the token, so every task sharing it stops too.
pub struct Producer<T: 'static> {
    producer_callback: Arc<ProducerCallback<T>>,
    tx: mpsc::Sender<T>,
    cancel: CancellationToken,
}

impl<T> Producer<T> {
    pub fn new(
        producer_callback: Arc<ProducerCallback<T>>,
        tx: mpsc::Sender<T>,
        cancel: CancellationToken,
    ) -> Self {
        Self { producer_callback, tx, cancel }
    }
}

impl<T: Send + Sync + 'static> Producer<T> {
    pub fn spawn<F, Fut>(
        tx: mpsc::Sender<T>,
        cancel: CancellationToken,
        producer_callback_factory: F,
    ) -> tokio::task::JoinHandle<Result<()>>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let producer_callback: Arc<ProducerCallback<T>> =
            Arc::new(move || Box::pin(producer_callback_factory()));

        let producer = Producer::new(producer_callback, tx, cancel);

        tokio::spawn(async move {
            let result = producer.run().await;
            if let Err(e) = &result {
                tracing::error!("Producer failed: {e:?}");
            }
            result
        })
    }
}

impl<T> Producer<T> {
    pub async fn run(&self) -> Result<()> {
        loop {
            tokio::select! {
                // Cancellation wins over an in-flight callback.
                biased;
                _ = self.cancel.cancelled() => {
                    break
                }
                produced = async {
                    let callback = Arc::clone(&self.producer_callback);
                    callback().await
                } => {
                    match produced {
                        Ok(message) => {
                            if self.tx.send(message).await.is_err() {
                                // The receiver dropped
                                break;
                            }
                        }
                        Err(e) => {
                            self.cancel.cancel();
                            return Err(e);
                        }
                    }
                }
            }
        }

        Ok(())
    }
}
