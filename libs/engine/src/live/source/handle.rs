use alloy::primitives::{Address, BlockNumber};
use eyre::Result;
use futures_util::stream::BoxStream;

use crate::live::source::filter::{ChunkFilter, StreamFilter};

pub trait SourceInput {
    fn block_number(&self) -> Option<BlockNumber>;
}

/// Where raw inputs come from: the chain, or a stand-in for it.
#[async_trait::async_trait]
pub trait Source: Send + Sync {
    type Item: SourceInput;

    async fn head_height(&self) -> Result<BlockNumber>;
    async fn has_code(&self, address: Address) -> Result<bool>;
    async fn chunk(&self, filter: ChunkFilter) -> Result<Vec<Self::Item>>;
    async fn stream(&self, filter: StreamFilter) -> Result<BoxStream<'static, Self::Item>>;
}
