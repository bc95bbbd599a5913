mod analyze;
mod args;
mod ask;
mod context;
mod ingest;
mod search;
mod status;

pub use analyze::run_analyze;
pub use args::{Args, Command, PartitionArg};
pub use ask::run_ask;
pub use ingest::run_ingest;
pub use search::run_search;
pub use status::run_status;

use anyhow::Result;

use crate::config::Settings;

pub async fn run(command: Command, settings: &Settings) -> Result<()> {
    match command {
        Command::Ingest { force } => run_ingest(settings, force).await,
        Command::Ask {
            question,
            json,
            top_k,
        } => run_ask(settings, &question, top_k, json).await,
        Command::Analyze { only, concurrency } => run_analyze(settings, &only, concurrency).await,
        Command::Search {
            query,
            partition,
            limit,
            json,
        } => run_search(settings, &query, partition.map(Into::into), limit, json).await,
        Command::Status => run_status(settings).await,
    }
}
