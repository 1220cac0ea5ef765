use serde::Serialize;
use sqlx::FromRow;

/// Key of the cursor shared by the backfill scanner and the default live watcher.
pub const DEFAULT_CURSOR_KEY: &str = "block";

/// Highest block height whose events are durably persisted.
#[derive(Debug, Clone, FromRow, PartialEq, Serialize)]
pub struct Cursor {
    pub key: String,
    pub last_height: i64,
    pub updated_at: String,
}
