use alloy::primitives::Address;
use clap::Parser;

use crate::cli::query::read::{Entity, FromBlock};

#[derive(Parser, Debug)]
#[command(about = "Select indexed results", long_about = None)]
pub struct Query {
    /// SQLite connection string
    #[arg(short, long, env = "DB_URL")]
    pub db_url: String,

    /// Entity to query
    #[arg(short, long, value_enum)]
    pub entity: Entity,

    /// First block height to include, or `last` for the current cursor
    #[arg(long, default_value = "0")]
    pub from_block: FromBlock,

    /// Restrict `rewards-sum` to one recipient
    #[arg(long)]
    pub referral: Option<Address>,
}
