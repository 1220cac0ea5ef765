use clap::command;
use clap::{Parser, Subcommand};

use crate::cli::query::args::Query;

use super::engine::args::Args;

#[derive(Parser, Debug)]
#[command(name = "lft-indexer")]
#[command(about = "Indexer for the events of a single EVM contract", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Backfill then follow the contract's events until interrupted
    Engine(Args),
    /// Print indexed records as JSON
    Select(Query),
}
