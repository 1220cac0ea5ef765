use crate::cli::query::args::Query;
use crate::cli::query::read::{Entity, FromBlock};
use eyre::{Result, eyre};
use serde::Serialize;
use store::client::Client;
use store::cursor::model::DEFAULT_CURSOR_KEY;
use store::cursor::store::Store as CursorStore;
use store::event::model::{
    OwnershipTransferred, Record, Register, RewardReferral, RewardStakers, Stake, Transfer,
    Unstake,
};
use store::event::store::Store as EventStore;

pub async fn select(query: &Query) -> Result<()> {
    let client = Client::init(&query.db_url).await?;

    let cursor_store = CursorStore::new(client.clone());
    let event_store = EventStore::new(client);

    let from_block_number = match query.from_block {
        FromBlock::Number(block_number) => Ok(block_number),
        FromBlock::Last => match cursor_store.get(DEFAULT_CURSOR_KEY).await? {
            None => Err(eyre!("Cursor Not Found")),
            Some(height) => Ok(height),
        },
    };

    match query.entity {
        Entity::Transfer => print_records::<Transfer>(&event_store, from_block_number?).await,
        Entity::Stake => print_records::<Stake>(&event_store, from_block_number?).await,
        Entity::Unstake => print_records::<Unstake>(&event_store, from_block_number?).await,
        Entity::Register => print_records::<Register>(&event_store, from_block_number?).await,
        Entity::RewardReferral => {
            print_records::<RewardReferral>(&event_store, from_block_number?).await
        }
        Entity::RewardStakers => {
            print_records::<RewardStakers>(&event_store, from_block_number?).await
        }
        Entity::OwnershipTransferred => {
            print_records::<OwnershipTransferred>(&event_store, from_block_number?).await
        }
        Entity::Cursor => print_json(&cursor_store.list_cursors().await?),
        Entity::RewardsSum => {
            // Stored addresses are checksummed
            let referral = query.referral.map(|address| address.to_checksum(None));
            print_json(&event_store.rewards_sum(referral.as_deref()).await?)
        }
    }
}

async fn print_records<T: Record + Serialize>(
    event_store: &EventStore,
    from_block_number: u64,
) -> Result<()> {
    let records = event_store.list::<T>(from_block_number).await?;
    if records.is_empty() {
        tracing::info!("No {} Found from block {from_block_number}", T::KIND.name());
    }
    print_json(&records)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
