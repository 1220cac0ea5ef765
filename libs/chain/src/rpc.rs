use std::time::Duration;

use alloy::eips::BlockNumberOrTag;
use alloy::primitives::{Address, B256, Bytes};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::client::PollerStream;
use alloy::rpc::types::{Filter, Log};
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::http::reqwest::Url;

use crate::error::ChainError;

/// Thin handle over an alloy provider exposing only what the indexer consumes.
#[derive(Clone)]
pub struct NodeClient {
    provider: DynProvider,
}

impl NodeClient {
    /// Read-only client over HTTP.
    pub fn new(rpc_url: Url) -> Self {
        let provider = ProviderBuilder::new().connect_http(rpc_url).erased();
        Self { provider }
    }

    /// Client able to sign transactions with a local key.
    pub fn with_signer(rpc_url: Url, signer: PrivateKeySigner) -> Self {
        let provider = ProviderBuilder::new().wallet(signer).connect_http(rpc_url).erased();
        Self { provider }
    }

    pub async fn get_latest_block_number(&self) -> Result<u64, ChainError> {
        self.provider.get_block_number().await.map_err(ChainError::from_rpc)
    }

    pub async fn get_code_at(&self, address: Address) -> Result<Bytes, ChainError> {
        self.provider.get_code_at(address).await.map_err(ChainError::from_rpc)
    }

    /// Logs emitted by `address` matching any of `signatures` in the inclusive range.
    pub async fn get_logs(
        &self,
        address: Address,
        signatures: Vec<B256>,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<Log>, ChainError> {
        let filter = Filter::new()
            .address(address)
            .event_signature(signatures)
            .from_block(from_block)
            .to_block(to_block);

        self.provider
            .get_logs(&filter)
            .await
            .map_err(|e| ChainError::from_ranged_rpc(e, from_block, to_block))
    }

    pub async fn watch_logs(
        &self,
        address: Address,
        signatures: Vec<B256>,
        from_block: BlockNumberOrTag,
        poll_interval: Duration,
    ) -> Result<PollerStream<Vec<Log>>, ChainError> {
        let filter =
            Filter::new().address(address).event_signature(signatures).from_block(from_block);

        self.provider
            .watch_logs(&filter)
            .await
            .map(|poller_builder| poller_builder.with_poll_interval(poll_interval).into_stream())
            .map_err(|e| ChainError::Subscription(e.to_string()))
    }
}
