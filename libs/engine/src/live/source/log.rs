use crate::live::source::filter::{ChunkFilter, StreamFilter};
use crate::live::source::handle::{Source, SourceInput};
use alloy::{
    eips::BlockNumberOrTag,
    primitives::{Address, BlockNumber},
    rpc::types::Log,
};
use chain::rpc::NodeClient;
use eyre::Result;
use futures_util::{
    StreamExt, future,
    stream::{self, BoxStream},
};

pub struct LogSource {
    pub node_client: NodeClient,
}

impl SourceInput for Log {
    fn block_number(&self) -> Option<BlockNumber> {
        self.block_number
    }
}

#[async_trait::async_trait]
impl Source for LogSource {
    type Item = Log;

    async fn head_height(&self) -> Result<BlockNumber> {
        Ok(self.node_client.get_latest_block_number().await?)
    }

    async fn has_code(&self, address: Address) -> Result<bool> {
        let code = self.node_client.get_code_at(address).await?;
        Ok(!code.is_empty())
    }

    async fn chunk(&self, filter: ChunkFilter) -> Result<Vec<Self::Item>> {
        let logs_chunk = self
            .node_client
            .get_logs(
                filter.address,
                filter.signature_hashes(),
                filter.from_block_number,
                filter.to_block_number,
            )
            .await?
            .into_iter()
            // NOTE: Logs may come from pending txs that have not yet been mined.
            // Pending logs are re-emitted (with the same tx hash and log index)
            // once their tx is included in a block, at which point `block_number` will be set.
            .filter(|log| log.block_number.is_some())
            .collect();

        Ok(logs_chunk)
    }

    async fn stream(&self, filter: StreamFilter) -> Result<BoxStream<'static, Self::Item>> {
        let logs_stream = self
            .node_client
            .watch_logs(
                filter.address,
                filter.signature_hashes(),
                BlockNumberOrTag::Number(filter.from_block_number),
                filter.poll_interval,
            )
            .await?
            .flat_map(stream::iter)
            // NOTE: Pending logs are skipped now and processed once confirmed.
            .filter(|log| future::ready(log.block_number.is_some()));

        Ok(Box::pin(logs_stream))
    }
}
