use crate::event::model::{
    DomainEvent, EventKind, LogMeta, OwnershipTransferred, Register, RewardReferral,
    RewardStakers, Stake, Transfer, Unstake,
};
use alloy::primitives::B256;
use alloy::rpc::types::Log;
use alloy::sol_types::SolEvent;
use std::convert::TryFrom;
use thiserror::Error;

alloy::sol! {
    #[derive(Debug, PartialEq)]
    interface ILevelFiveToken {
        event Transfer(address indexed from, address indexed to, uint256 value);
        event Stake(address indexed staker, uint256 amount);
        event Unstake(address indexed staker, uint256 amount);
        event Register(address indexed referral, address trader);
        event RewardReferral(address indexed trader, address indexed referral, uint8 indexed level, uint256 amount);
        event RewardStakers(address indexed trader, uint256 amount);
        event OwnershipTransferred(address indexed previousOwner, address indexed newOwner);
    }
}

/// A log that cannot be turned into a [`DomainEvent`]. Never fatal for ingestion.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("log carries no topics")]
    Anonymous,

    #[error("unknown event signature {0}")]
    UnknownSignature(B256),

    #[error("log is missing {0}")]
    MissingField(&'static str),

    #[error("log {0} does not fit the stored column")]
    OutOfRange(&'static str),

    #[error("failed to decode {kind:?} log: {reason}")]
    Abi { kind: EventKind, reason: String },
}

impl EventKind {
    pub fn signature_hash(&self) -> B256 {
        match self {
            EventKind::Transfer => ILevelFiveToken::Transfer::SIGNATURE_HASH,
            EventKind::Stake => ILevelFiveToken::Stake::SIGNATURE_HASH,
            EventKind::Unstake => ILevelFiveToken::Unstake::SIGNATURE_HASH,
            EventKind::Register => ILevelFiveToken::Register::SIGNATURE_HASH,
            EventKind::RewardReferral => ILevelFiveToken::RewardReferral::SIGNATURE_HASH,
            EventKind::RewardStakers => ILevelFiveToken::RewardStakers::SIGNATURE_HASH,
            EventKind::OwnershipTransferred => {
                ILevelFiveToken::OwnershipTransferred::SIGNATURE_HASH
            }
        }
    }

    pub fn from_signature_hash(hash: &B256) -> Option<EventKind> {
        EventKind::ALL.into_iter().find(|kind| kind.signature_hash() == *hash)
    }
}

impl TryFrom<&Log> for LogMeta {
    type Error = DecodeError;

    fn try_from(log: &Log) -> Result<Self, DecodeError> {
        let block_number = log.block_number.ok_or(DecodeError::MissingField("block_number"))?;
        let log_index = log.log_index.ok_or(DecodeError::MissingField("log_index"))?;
        Ok(Self {
            block_height: i64::try_from(block_number)
                .map_err(|_| DecodeError::OutOfRange("block_number"))?,
            transaction_hash: log
                .transaction_hash
                .ok_or(DecodeError::MissingField("transaction_hash"))?
                .to_string(),
            log_index: i64::try_from(log_index)
                .map_err(|_| DecodeError::OutOfRange("log_index"))?,
        })
    }
}

fn decode<E: SolEvent>(log: &Log, kind: EventKind) -> Result<E, DecodeError> {
    log.log_decode::<E>()
        .map(|decoded| decoded.inner.data)
        .map_err(|e| DecodeError::Abi { kind, reason: e.to_string() })
}

impl TryFrom<&Log> for DomainEvent {
    type Error = DecodeError;

    fn try_from(log: &Log) -> Result<Self, DecodeError> {
        let signature = *log.topic0().ok_or(DecodeError::Anonymous)?;
        let kind = EventKind::from_signature_hash(&signature)
            .ok_or(DecodeError::UnknownSignature(signature))?;
        let meta = LogMeta::try_from(log)?;

        let event = match kind {
            EventKind::Transfer => {
                let e: ILevelFiveToken::Transfer = decode(log, kind)?;
                DomainEvent::Transfer(Transfer {
                    meta,
                    from_address: e.from.to_checksum(None),
                    to_address: e.to.to_checksum(None),
                    value: e.value.to_string(),
                })
            }
            EventKind::Stake => {
                let e: ILevelFiveToken::Stake = decode(log, kind)?;
                DomainEvent::Stake(Stake {
                    meta,
                    staker: e.staker.to_checksum(None),
                    amount: e.amount.to_string(),
                })
            }
            EventKind::Unstake => {
                let e: ILevelFiveToken::Unstake = decode(log, kind)?;
                DomainEvent::Unstake(Unstake {
                    meta,
                    staker: e.staker.to_checksum(None),
                    amount: e.amount.to_string(),
                })
            }
            EventKind::Register => {
                let e: ILevelFiveToken::Register = decode(log, kind)?;
                DomainEvent::Register(Register {
                    meta,
                    referral: e.referral.to_checksum(None),
                    trader: e.trader.to_checksum(None),
                })
            }
            EventKind::RewardReferral => {
                let e: ILevelFiveToken::RewardReferral = decode(log, kind)?;
                DomainEvent::RewardReferral(RewardReferral {
                    meta,
                    trader: e.trader.to_checksum(None),
                    referral: e.referral.to_checksum(None),
                    level: i64::from(e.level),
                    amount: e.amount.to_string(),
                })
            }
            EventKind::RewardStakers => {
                let e: ILevelFiveToken::RewardStakers = decode(log, kind)?;
                DomainEvent::RewardStakers(RewardStakers {
                    meta,
                    trader: e.trader.to_checksum(None),
                    amount: e.amount.to_string(),
                })
            }
            EventKind::OwnershipTransferred => {
                let e: ILevelFiveToken::OwnershipTransferred = decode(log, kind)?;
                DomainEvent::OwnershipTransferred(OwnershipTransferred {
                    meta,
                    previous_owner: e.previousOwner.to_checksum(None),
                    new_owner: e.newOwner.to_checksum(None),
                })
            }
        };

        Ok(event)
    }
}

impl TryFrom<Log> for DomainEvent {
    type Error = DecodeError;

    fn try_from(log: Log) -> Result<Self, DecodeError> {
        DomainEvent::try_from(&log)
    }
}
