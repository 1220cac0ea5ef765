use crate::client::Client;
use crate::cursor::model::Cursor;
use alloy::primitives::BlockNumber;
use sqlx::Error;

#[derive(Clone)]
pub struct Store {
    client: Client,
}

impl Store {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn get(&self, key: &str) -> Result<Option<BlockNumber>, Error> {
        match self.get_cursor(key).await? {
            None => Ok(None),
            Some(cursor) => BlockNumber::try_from(cursor.last_height)
                .map(Some)
                .map_err(|e| Error::Decode(Box::new(e))),
        }
    }

    pub async fn get_cursor(&self, key: &str) -> Result<Option<Cursor>, Error> {
        let query = r#"
            SELECT key, last_height, updated_at
            FROM cursors
            WHERE key = ?
            "#;
        sqlx::query_as(query).bind(key).fetch_optional(self.client.pool()).await
    }

    pub async fn list_cursors(&self) -> Result<Vec<Cursor>, Error> {
        let query = r#"
            SELECT key, last_height, updated_at
            FROM cursors
            ORDER BY key ASC
            "#;
        sqlx::query_as(query).fetch_all(self.client.pool()).await
    }

    /// Last write wins; callers are responsible for never moving a cursor backwards.
    pub async fn set(&self, key: &str, last_height: BlockNumber) -> Result<(), Error> {
        let query = r#"
            INSERT INTO cursors (key, last_height)
            VALUES (?, ?)
            ON CONFLICT (key) DO UPDATE SET
                last_height = excluded.last_height,
                updated_at = CURRENT_TIMESTAMP
            "#;
        let last_height = i64::try_from(last_height).map_err(|e| Error::Encode(Box::new(e)))?;
        sqlx::query(query)
            .bind(key)
            .bind(last_height)
            .execute(self.client.pool())
            .await?;
        Ok(())
    }
}
