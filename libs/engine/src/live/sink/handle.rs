use eyre::Result;

/// Durable destination for decoded elements.
#[async_trait::async_trait]
pub trait Sink: Send + Sync {
    type Item;

    async fn process(&self, element: &Self::Item) -> Result<()>;

    /// Must be all-or-nothing: on error, none of `elements` may be considered stored.
    async fn process_batch(&self, elements: &[Self::Item]) -> Result<()>;
}
