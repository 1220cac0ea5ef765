use std::time::Duration;

use alloy::primitives::{Address, BlockNumber};
use store::cursor::model::DEFAULT_CURSOR_KEY;
use store::event::model::EventKind;

use crate::error::EngineError;

/// How the live tracker learns about new blocks once backfill caught up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveMode {
    /// Poll the head height and query each new range.
    Poll,
    /// Consume the node's log filter stream.
    Subscribe,
}

/// Static engine configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Args {
    pub address: Address,
    pub events: Vec<EventKind>,
    pub cursor_key: String,
    /// Cursor value used when none is stored yet; scanning starts right after it.
    pub cursor_seed: BlockNumber,
    pub max_range_width: u64,
    pub poll_interval: Duration,
    pub retry_deadline: Duration,
    pub retry_interval: Duration,
    pub live_mode: LiveMode,
    pub watcher_per_event: bool,
}

impl Args {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            events: EventKind::ALL.to_vec(),
            cursor_key: DEFAULT_CURSOR_KEY.to_string(),
            cursor_seed: 0,
            max_range_width: 1000,
            poll_interval: Duration::from_millis(500),
            retry_deadline: Duration::from_secs(32),
            retry_interval: Duration::from_millis(32),
            live_mode: LiveMode::Poll,
            watcher_per_event: false,
        }
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.max_range_width == 0 {
            return Err(EngineError::Config("max range width must be at least 1".into()));
        }
        if self.events.is_empty() {
            return Err(EngineError::Config("at least one event kind must be tracked".into()));
        }
        if self.retry_interval.is_zero() {
            return Err(EngineError::Config("retry interval must be positive".into()));
        }
        if self.cursor_key.is_empty() {
            return Err(EngineError::Config("cursor key must not be empty".into()));
        }
        Ok(())
    }
}
