#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use alloy::primitives::{Address, B256, BlockNumber, LogData, U256};
use alloy::rpc::types::Log;
use alloy::sol_types::SolEvent;
use engine::args::Args;
use engine::live::source::filter::{ChunkFilter, StreamFilter};
use engine::live::source::handle::Source;
use eyre::{Result, eyre};
use futures_util::stream::{self, BoxStream, StreamExt};
use store::client::Client;
use store::cursor::store::Store as CursorStore;
use store::event::adapter::ILevelFiveToken;
use store::event::store::Store as EventStore;

pub const CONTRACT: Address = Address::repeat_byte(0x42);

/// In-memory chain: a head height and a fixed set of logs.
pub struct MockSource {
    pub head: AtomicU64,
    pub logs: Mutex<Vec<Log>>,
    /// Every `[from, to]` queried through `chunk`.
    pub chunks: Mutex<Vec<(BlockNumber, BlockNumber)>>,
    pub head_calls: AtomicU32,
    pub fail_head: AtomicBool,
    pub fail_chunk: AtomicBool,
    pub deployed: bool,
    /// Logs pushed by `stream` for blocks above the head at install time.
    /// The stream then stays open unless `end_stream` is set.
    pub stream_logs: Mutex<Vec<Log>>,
    pub end_stream: bool,
}

impl MockSource {
    pub fn new(head: BlockNumber, logs: Vec<Log>) -> Self {
        Self {
            head: AtomicU64::new(head),
            logs: Mutex::new(logs),
            chunks: Mutex::new(vec![]),
            head_calls: AtomicU32::new(0),
            fail_head: AtomicBool::new(false),
            fail_chunk: AtomicBool::new(false),
            deployed: true,
            stream_logs: Mutex::new(vec![]),
            end_stream: false,
        }
    }

    pub fn set_head(&self, head: BlockNumber) {
        self.head.store(head, Ordering::SeqCst);
    }

    pub fn push_log(&self, log: Log) {
        self.logs.lock().unwrap().push(log);
    }

    pub fn chunks(&self) -> Vec<(BlockNumber, BlockNumber)> {
        self.chunks.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Source for MockSource {
    type Item = Log;

    async fn head_height(&self) -> Result<BlockNumber> {
        self.head_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_head.load(Ordering::SeqCst) {
            return Err(eyre!("connection refused"));
        }
        Ok(self.head.load(Ordering::SeqCst))
    }

    async fn has_code(&self, _address: Address) -> Result<bool> {
        Ok(self.deployed)
    }

    async fn chunk(&self, filter: ChunkFilter) -> Result<Vec<Log>> {
        if self.fail_chunk.load(Ordering::SeqCst) {
            return Err(eyre!("query returned more than 10000 results"));
        }
        self.chunks.lock().unwrap().push((filter.from_block_number, filter.to_block_number));

        let signatures = filter.signature_hashes();
        let logs = self
            .logs
            .lock()
            .unwrap()
            .iter()
            .filter(|log| {
                log.block_number.is_some_and(|n| {
                    n >= filter.from_block_number && n <= filter.to_block_number
                })
            })
            // Undecodable logs are returned whatever the signature filter says
            .filter(|log| {
                log.topics().first().is_none_or(|topic0| {
                    signatures.contains(topic0) || !is_known_signature(topic0)
                })
            })
            .cloned()
            .collect();
        Ok(logs)
    }

    // Like a node log filter: only blocks imported after installation are reported,
    // whatever `from_block_number` says.
    async fn stream(&self, _filter: StreamFilter) -> Result<BoxStream<'static, Log>> {
        let head_at_install = self.head.load(Ordering::SeqCst);
        let logs: Vec<Log> = self
            .stream_logs
            .lock()
            .unwrap()
            .iter()
            .filter(|log| log.block_number.is_none_or(|n| n > head_at_install))
            .cloned()
            .collect();
        let pushed = stream::iter(logs);
        if self.end_stream {
            Ok(pushed.boxed())
        } else {
            Ok(pushed.chain(stream::pending()).boxed())
        }
    }
}

fn is_known_signature(topic0: &B256) -> bool {
    store::event::model::EventKind::from_signature_hash(topic0).is_some()
}

pub fn raw_log(data: LogData, block_number: BlockNumber, log_index: u64) -> Log {
    Log {
        inner: alloy::primitives::Log { address: CONTRACT, data },
        block_hash: Some(B256::from(U256::from(block_number))),
        block_number: Some(block_number),
        block_timestamp: None,
        transaction_hash: Some(B256::from(U256::from(block_number * 1_000 + log_index))),
        transaction_index: Some(0),
        log_index: Some(log_index),
        removed: false,
    }
}

pub fn transfer_log(block_number: BlockNumber, log_index: u64) -> Log {
    let data = ILevelFiveToken::Transfer {
        from: Address::repeat_byte(0x11),
        to: Address::repeat_byte(0x22),
        value: U256::from(block_number),
    }
    .encode_log_data();
    raw_log(data, block_number, log_index)
}

pub fn stake_log(block_number: BlockNumber, log_index: u64) -> Log {
    let data = ILevelFiveToken::Stake {
        staker: Address::repeat_byte(0x33),
        amount: U256::from(block_number),
    }
    .encode_log_data();
    raw_log(data, block_number, log_index)
}

/// A log with a signature the contract bindings do not know.
pub fn unknown_log(block_number: BlockNumber, log_index: u64) -> Log {
    let data = LogData::new_unchecked(vec![B256::repeat_byte(0xEE)], Default::default());
    raw_log(data, block_number, log_index)
}

pub async fn stores() -> Result<(CursorStore, EventStore)> {
    let client = Client::init("sqlite::memory:").await?;
    Ok((CursorStore::new(client.clone()), EventStore::new(client)))
}

pub fn args() -> Args {
    let mut args = Args::new(CONTRACT);
    args.poll_interval = Duration::from_millis(20);
    args.retry_deadline = Duration::from_millis(200);
    args.retry_interval = Duration::from_millis(10);
    args
}

/// Polls `key` until it reaches `height`, failing after `timeout`.
pub async fn wait_for_cursor(
    store: &CursorStore,
    key: &str,
    height: BlockNumber,
    timeout: Duration,
) -> Result<()> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if store.get(key).await?.is_some_and(|current| current >= height) {
            return Ok(());
        }
        if tokio::time::Instant::now() > deadline {
            let current = store.get(key).await?;
            return Err(eyre!("cursor {key} stuck at {current:?}, expected {height}"));
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
