use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::http::reqwest::Url;
use chain::rpc::NodeClient;
use clap::Parser;
use clap::{arg, command};
use eyre::{Result, WrapErr};
use std::str::FromStr;
use std::time::Duration;
use store::cursor::model::DEFAULT_CURSOR_KEY;

use crate::cli::read::{self, CliEventType, CliLiveMode};

#[derive(Parser, Debug, Clone)]
#[command(about = "Start the indexer engine", long_about = None)]
pub struct Args {
    /// Node provider HTTP endpoint
    #[arg(short, long, env = "RPC_URL")]
    pub rpc_url: Url,

    /// SQLite connection string
    #[arg(short, long, env = "DB_URL")]
    pub db_url: String,

    /// Optional signing private key, the indexer itself only reads
    #[arg(short, long, env = "SIGNER_PK")]
    pub signer_pk: Option<String>,

    /// Contract to index
    #[arg(short = 'a', long, env = "CONTRACT_ADDRESS")]
    pub contract_address: Address,

    /// Events to index (comma-separated), all by default
    #[arg(short, long, value_enum, value_delimiter = ',', env = "EVENTS")]
    pub events: Vec<CliEventType>,

    /// Key of the progress cursor
    #[arg(long, env = "CURSOR_KEY", default_value = DEFAULT_CURSOR_KEY)]
    pub cursor_key: String,

    /// Cursor used on first run; indexing starts at the next block
    #[arg(long, env = "CURSOR_SEED", default_value_t = 0)]
    pub cursor_seed: u64,

    /// Maximum number of blocks per log query
    #[arg(long, env = "MAX_RANGE_WIDTH", default_value_t = 1000)]
    pub max_range_width: u64,

    /// Poll interval in milliseconds
    #[arg(long, env = "POLL_INTERVAL_MS", default_value_t = 500)]
    pub poll_interval: u64,

    /// How long a failing head query is retried, in milliseconds
    #[arg(long, env = "RETRY_DEADLINE_MS", default_value_t = 32_000)]
    pub retry_deadline: u64,

    /// Pause between retries in milliseconds
    #[arg(long, env = "RETRY_INTERVAL_MS", default_value_t = 32)]
    pub retry_interval: u64,

    /// How new blocks are followed after backfill
    #[arg(long, value_enum, env = "LIVE_MODE", default_value_t = CliLiveMode::Poll)]
    pub live_mode: CliLiveMode,

    /// Run one watcher, with its own cursor, per event
    #[arg(long, env = "WATCHER_PER_EVENT")]
    pub watcher_per_event: bool,
}

impl Args {
    pub fn to_engine_args(&self) -> engine::args::Args {
        engine::args::Args {
            address: self.contract_address,
            events: read::event_kinds(&self.events),
            cursor_key: self.cursor_key.clone(),
            cursor_seed: self.cursor_seed,
            max_range_width: self.max_range_width,
            poll_interval: Duration::from_millis(self.poll_interval),
            retry_deadline: Duration::from_millis(self.retry_deadline),
            retry_interval: Duration::from_millis(self.retry_interval),
            live_mode: self.live_mode.into(),
            watcher_per_event: self.watcher_per_event,
        }
    }

    pub fn node_client(&self) -> Result<NodeClient> {
        match &self.signer_pk {
            None => Ok(NodeClient::new(self.rpc_url.clone())),
            Some(signer_pk) => {
                let signer =
                    PrivateKeySigner::from_str(signer_pk).wrap_err("Invalid signer private key")?;
                tracing::info!("Signer: {}", signer.address());
                Ok(NodeClient::with_signer(self.rpc_url.clone(), signer))
            }
        }
    }

    /// Copy safe to log.
    pub fn redacted(&self) -> Self {
        Self { signer_pk: self.signer_pk.as_ref().map(|_| "***".to_string()), ..self.clone() }
    }
}
