use alloy::primitives::BlockNumber;
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

/// Event kinds emitted by the tracked contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum EventKind {
    Transfer,
    Stake,
    Unstake,
    Register,
    RewardReferral,
    RewardStakers,
    OwnershipTransferred,
}

impl EventKind {
    pub const ALL: [EventKind; 7] = [
        EventKind::Transfer,
        EventKind::Stake,
        EventKind::Unstake,
        EventKind::Register,
        EventKind::RewardReferral,
        EventKind::RewardStakers,
        EventKind::OwnershipTransferred,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Transfer => "Transfer",
            EventKind::Stake => "Stake",
            EventKind::Unstake => "Unstake",
            EventKind::Register => "Register",
            EventKind::RewardReferral => "RewardReferral",
            EventKind::RewardStakers => "RewardStakers",
            EventKind::OwnershipTransferred => "OwnershipTransferred",
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            EventKind::Transfer => "transfers",
            EventKind::Stake => "stakes",
            EventKind::Unstake => "unstakes",
            EventKind::Register => "registers",
            EventKind::RewardReferral => "reward_referrals",
            EventKind::RewardStakers => "reward_stakers",
            EventKind::OwnershipTransferred => "ownership_transfers",
        }
    }
}

/// Position of a log on chain. `(transaction_hash, log_index)` identifies it uniquely.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, FromRow, Serialize)]
pub struct LogMeta {
    pub block_height: i64,
    pub transaction_hash: String,
    pub log_index: i64,
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Transfer {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub meta: LogMeta,
    pub from_address: String,
    pub to_address: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Stake {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub meta: LogMeta,
    pub staker: String,
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Unstake {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub meta: LogMeta,
    pub staker: String,
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Register {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub meta: LogMeta,
    pub referral: String,
    pub trader: String,
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct RewardReferral {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub meta: LogMeta,
    pub trader: String,
    pub referral: String,
    pub level: i64,
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct RewardStakers {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub meta: LogMeta,
    pub trader: String,
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct OwnershipTransferred {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub meta: LogMeta,
    pub previous_owner: String,
    pub new_owner: String,
}

/// A decoded contract log, one variant per event kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event")]
pub enum DomainEvent {
    Transfer(Transfer),
    Stake(Stake),
    Unstake(Unstake),
    Register(Register),
    RewardReferral(RewardReferral),
    RewardStakers(RewardStakers),
    OwnershipTransferred(OwnershipTransferred),
}

impl DomainEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            DomainEvent::Transfer(_) => EventKind::Transfer,
            DomainEvent::Stake(_) => EventKind::Stake,
            DomainEvent::Unstake(_) => EventKind::Unstake,
            DomainEvent::Register(_) => EventKind::Register,
            DomainEvent::RewardReferral(_) => EventKind::RewardReferral,
            DomainEvent::RewardStakers(_) => EventKind::RewardStakers,
            DomainEvent::OwnershipTransferred(_) => EventKind::OwnershipTransferred,
        }
    }

    pub fn meta(&self) -> &LogMeta {
        match self {
            DomainEvent::Transfer(e) => &e.meta,
            DomainEvent::Stake(e) => &e.meta,
            DomainEvent::Unstake(e) => &e.meta,
            DomainEvent::Register(e) => &e.meta,
            DomainEvent::RewardReferral(e) => &e.meta,
            DomainEvent::RewardStakers(e) => &e.meta,
            DomainEvent::OwnershipTransferred(e) => &e.meta,
        }
    }

    pub fn block_height(&self) -> BlockNumber {
        self.meta().block_height as BlockNumber
    }
}

/// A row type stored in its own table.
pub trait Record: for<'r> FromRow<'r, SqliteRow> + Send + Unpin {
    const KIND: EventKind;
}

impl Record for Transfer {
    const KIND: EventKind = EventKind::Transfer;
}

impl Record for Stake {
    const KIND: EventKind = EventKind::Stake;
}

impl Record for Unstake {
    const KIND: EventKind = EventKind::Unstake;
}

impl Record for Register {
    const KIND: EventKind = EventKind::Register;
}

impl Record for RewardReferral {
    const KIND: EventKind = EventKind::RewardReferral;
}

impl Record for RewardStakers {
    const KIND: EventKind = EventKind::RewardStakers;
}

impl Record for OwnershipTransferred {
    const KIND: EventKind = EventKind::OwnershipTransferred;
}

/// A stored record together with its ingestion timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Persisted<T> {
    #[serde(flatten)]
    pub event: T,
    pub created_at: String,
}

impl<'r, T: FromRow<'r, SqliteRow>> FromRow<'r, SqliteRow> for Persisted<T> {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self { event: T::from_row(row)?, created_at: row.try_get("created_at")? })
    }
}

/// Total referral rewards paid to one recipient at one level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewardSum {
    pub referral: String,
    pub level: i64,
    pub total: String,
}
