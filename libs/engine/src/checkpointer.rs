use alloy::primitives::BlockNumber;
use eyre::Result;
use store::cursor::store::Store as CursorStore;
use tokio::sync::Mutex;

/// Owns one cursor row and only ever moves it forward.
#[derive(Clone)]
pub struct Checkpointer {
    store: CursorStore,
    key: String,
}

impl Checkpointer {
    pub fn new(store: CursorStore, key: impl Into<String>) -> Self {
        Self { store, key: key.into() }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub async fn get_last_height(&self) -> Result<Option<BlockNumber>> {
        Ok(self.store.get(&self.key).await?)
    }

    /// Returns the stored height, writing `seed` first when the cursor does not exist yet.
    pub async fn load_or_seed(&self, seed: BlockNumber) -> Result<BlockNumber> {
        match self.store.get(&self.key).await? {
            Some(height) => Ok(height),
            None => {
                self.store.set(&self.key, seed).await?;
                tracing::info!(key = %self.key, seed, "Cursor seeded");
                Ok(seed)
            }
        }
    }

    /// Records `height` as fully persisted. Heights at or below the stored one are ignored.
    pub async fn checkpoint(&self, height: BlockNumber) -> Result<()> {
        if let Some(current) = self.store.get(&self.key).await? {
            if height <= current {
                tracing::debug!(key = %self.key, height, current, "Stale checkpoint ignored");
                return Ok(());
            }
        }

        match self.store.set(&self.key, height).await {
            Ok(_) => {
                tracing::debug!(key = %self.key, height, "Checkpoint saved");
                Ok(())
            }
            Err(e) => {
                tracing::error!("Checkpointer failed on [set] for {}: {e:?}", self.key);
                Err(e.into())
            }
        }
    }
}

/// Keeps a shared cursor at the lowest height reached by a set of member cursors.
pub struct Watermark {
    shared: Checkpointer,
    members: Vec<Checkpointer>,
    lock: Mutex<()>,
}

impl Watermark {
    pub fn new(shared: Checkpointer, members: Vec<Checkpointer>) -> Self {
        Self { shared, members, lock: Mutex::new(()) }
    }

    /// Advances the shared cursor to the minimum member height, once every member has one.
    pub async fn refresh(&self) -> Result<Option<BlockNumber>> {
        let _guard = self.lock.lock().await;

        let mut low: Option<BlockNumber> = None;
        for member in &self.members {
            match member.get_last_height().await? {
                Some(height) => low = Some(low.map_or(height, |l| l.min(height))),
                None => return Ok(None),
            }
        }

        if let Some(height) = low {
            self.shared.checkpoint(height).await?;
        }
        Ok(low)
    }
}
