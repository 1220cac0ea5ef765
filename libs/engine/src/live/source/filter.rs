use std::time::Duration;

use alloy::primitives::{Address, B256, BlockNumber};
use store::event::model::EventKind;

fn signature_hashes(events: &[EventKind]) -> Vec<B256> {
    events.iter().map(EventKind::signature_hash).collect()
}

/// An inclusive, bounded block range query.
#[derive(Debug, Clone)]
pub struct ChunkFilter {
    pub address: Address,
    pub events: Vec<EventKind>,
    pub from_block_number: BlockNumber,
    pub to_block_number: BlockNumber,
}

impl ChunkFilter {
    pub fn signature_hashes(&self) -> Vec<B256> {
        signature_hashes(&self.events)
    }
}

pub struct StreamFilter {
    pub address: Address,
    pub events: Vec<EventKind>,
    pub from_block_number: BlockNumber,
    pub poll_interval: Duration,
}

impl StreamFilter {
    pub fn signature_hashes(&self) -> Vec<B256> {
        signature_hashes(&self.events)
    }
}
