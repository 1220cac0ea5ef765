use crate::client::Client;
use crate::event::model::{DomainEvent, EventKind, Persisted, Record, RewardReferral, RewardSum};
use alloy::primitives::{BlockNumber, U256};
use eyre::{Result, WrapErr, eyre};
use sqlx::{Error, SqliteConnection};
use std::collections::BTreeMap;

#[derive(Clone)]
pub struct Store {
    client: Client,
}

impl Store {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    // ---------------------------
    // WRITES
    // ---------------------------

    /// Appends `events` in a single transaction; either all rows land or none do.
    /// Logs already stored (same transaction hash and log index) are ignored.
    /// Returns the number of newly inserted rows.
    pub async fn append(&self, events: &[DomainEvent]) -> Result<u64, Error> {
        let mut tx = self.client.pool().begin().await?;
        let mut inserted = 0;
        for event in events {
            inserted += insert_event(&mut tx, event).await?;
        }
        tx.commit().await?;
        Ok(inserted)
    }

    // ---------------------------
    // READS
    // ---------------------------

    pub async fn list<T: Record>(
        &self,
        from_block: BlockNumber,
    ) -> Result<Vec<Persisted<T>>, Error> {
        let query = format!(
            "SELECT * FROM {} WHERE block_height >= ? ORDER BY block_height ASC, log_index ASC",
            T::KIND.table()
        );
        let from_block = i64::try_from(from_block).map_err(|e| Error::Encode(Box::new(e)))?;
        sqlx::query_as::<_, Persisted<T>>(&query)
            .bind(from_block)
            .fetch_all(self.client.pool())
            .await
    }

    pub async fn count(&self, kind: EventKind) -> Result<u64, Error> {
        let query = format!("SELECT COUNT(*) FROM {}", kind.table());
        let (count,): (i64,) = sqlx::query_as(&query).fetch_one(self.client.pool()).await?;
        u64::try_from(count).map_err(|e| Error::Decode(Box::new(e)))
    }

    /// Referral rewards summed per recipient and level, optionally for a single recipient.
    pub async fn rewards_sum(&self, referral: Option<&str>) -> Result<Vec<RewardSum>> {
        let rewards: Vec<RewardReferral> = match referral {
            Some(referral) => {
                let query = r#"
                    SELECT block_height, transaction_hash, log_index, trader, referral, level, amount
                    FROM reward_referrals
                    WHERE referral = ?
                    "#;
                sqlx::query_as(query).bind(referral).fetch_all(self.client.pool()).await?
            }
            None => {
                let query = r#"
                    SELECT block_height, transaction_hash, log_index, trader, referral, level, amount
                    FROM reward_referrals
                    "#;
                sqlx::query_as(query).fetch_all(self.client.pool()).await?
            }
        };

        // Amounts are uint256; SQLite's SUM would lose precision.
        let mut totals: BTreeMap<(String, i64), U256> = BTreeMap::new();
        for reward in rewards {
            let amount: U256 = reward.amount.parse().wrap_err_with(|| {
                format!("invalid stored amount {:?} at {:?}", reward.amount, reward.meta)
            })?;
            let total = totals.entry((reward.referral.clone(), reward.level)).or_default();
            let (referral, level) = (&reward.referral, reward.level);
            *total = total
                .checked_add(amount)
                .ok_or_else(|| eyre!("reward total of {referral} at level {level} overflows"))?;
        }

        Ok(totals
            .into_iter()
            .map(|((referral, level), total)| RewardSum { referral, level, total: total.to_string() })
            .collect())
    }
}

async fn insert_event(conn: &mut SqliteConnection, event: &DomainEvent) -> Result<u64, Error> {
    let result = match event {
        DomainEvent::Transfer(e) => {
            let query = r#"
                INSERT OR IGNORE INTO transfers (
                    block_height, transaction_hash, log_index, from_address, to_address, value
                )
                VALUES (?, ?, ?, ?, ?, ?)
                "#;
            sqlx::query(query)
                .bind(e.meta.block_height)
                .bind(&e.meta.transaction_hash)
                .bind(e.meta.log_index)
                .bind(&e.from_address)
                .bind(&e.to_address)
                .bind(&e.value)
                .execute(&mut *conn)
                .await?
        }
        DomainEvent::Stake(e) => {
            let query = r#"
                INSERT OR IGNORE INTO stakes (
                    block_height, transaction_hash, log_index, staker, amount
                )
                VALUES (?, ?, ?, ?, ?)
                "#;
            sqlx::query(query)
                .bind(e.meta.block_height)
                .bind(&e.meta.transaction_hash)
                .bind(e.meta.log_index)
                .bind(&e.staker)
                .bind(&e.amount)
                .execute(&mut *conn)
                .await?
        }
        DomainEvent::Unstake(e) => {
            let query = r#"
                INSERT OR IGNORE INTO unstakes (
                    block_height, transaction_hash, log_index, staker, amount
                )
                VALUES (?, ?, ?, ?, ?)
                "#;
            sqlx::query(query)
                .bind(e.meta.block_height)
                .bind(&e.meta.transaction_hash)
                .bind(e.meta.log_index)
                .bind(&e.staker)
                .bind(&e.amount)
                .execute(&mut *conn)
                .await?
        }
        DomainEvent::Register(e) => {
            let query = r#"
                INSERT OR IGNORE INTO registers (
                    block_height, transaction_hash, log_index, referral, trader
                )
                VALUES (?, ?, ?, ?, ?)
                "#;
            sqlx::query(query)
                .bind(e.meta.block_height)
                .bind(&e.meta.transaction_hash)
                .bind(e.meta.log_index)
                .bind(&e.referral)
                .bind(&e.trader)
                .execute(&mut *conn)
                .await?
        }
        DomainEvent::RewardReferral(e) => {
            let query = r#"
                INSERT OR IGNORE INTO reward_referrals (
                    block_height, transaction_hash, log_index, trader, referral, level, amount
                )
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#;
            sqlx::query(query)
                .bind(e.meta.block_height)
                .bind(&e.meta.transaction_hash)
                .bind(e.meta.log_index)
                .bind(&e.trader)
                .bind(&e.referral)
                .bind(e.level)
                .bind(&e.amount)
                .execute(&mut *conn)
                .await?
        }
        DomainEvent::RewardStakers(e) => {
            let query = r#"
                INSERT OR IGNORE INTO reward_stakers (
                    block_height, transaction_hash, log_index, trader, amount
                )
                VALUES (?, ?, ?, ?, ?)
                "#;
            sqlx::query(query)
                .bind(e.meta.block_height)
                .bind(&e.meta.transaction_hash)
                .bind(e.meta.log_index)
                .bind(&e.trader)
                .bind(&e.amount)
                .execute(&mut *conn)
                .await?
        }
        DomainEvent::OwnershipTransferred(e) => {
            let query = r#"
                INSERT OR IGNORE INTO ownership_transfers (
                    block_height, transaction_hash, log_index, previous_owner, new_owner
                )
                VALUES (?, ?, ?, ?, ?)
                "#;
            sqlx::query(query)
                .bind(e.meta.block_height)
                .bind(&e.meta.transaction_hash)
                .bind(e.meta.log_index)
                .bind(&e.previous_owner)
                .bind(&e.new_owner)
                .execute(&mut *conn)
                .await?
        }
    };

    Ok(result.rows_affected())
}
