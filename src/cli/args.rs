use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::types::Partition;

#[derive(Parser, Debug)]
#[command(
    name = "reportlens",
    version,
    about = "Answer questions over a year-ahead forecast report and its mid-year review, with page citations"
)]
pub struct Args {
    /// Path to a reportlens.toml (defaults to ./reportlens.toml, then the user config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Chunk, embed and index the documents in the data directory
    Ingest {
        /// Rebuild even if an index already exists
        #[arg(long)]
        force: bool,
    },

    /// Answer a single question
    Ask {
        question: String,

        /// Print the run result as JSON
        #[arg(long)]
        json: bool,

        /// Chunks retrieved per partition (defaults to retrieval.top_k)
        #[arg(long)]
        top_k: Option<usize>,
    },

    /// Run the predefined question set and save the results as JSON
    Analyze {
        /// Comma-separated question ids, e.g. Q1,Q3
        #[arg(long, value_delimiter = ',')]
        only: Vec<String>,

        /// Questions run at the same time (defaults to pipeline.concurrency)
        #[arg(long)]
        concurrency: Option<usize>,
    },

    /// Nearest-neighbour lookup in the index, without routing or synthesis
    Search {
        query: String,

        /// Restrict the search to one partition
        #[arg(long, value_enum)]
        partition: Option<PartitionArg>,

        /// Maximum number of results
        #[arg(long, default_value_t = 5)]
        limit: usize,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show index statistics
    Status,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PartitionArg {
    Forecast,
    Midyear,
}

impl From<PartitionArg> for Partition {
    fn from(arg: PartitionArg) -> Self {
        match arg {
            PartitionArg::Forecast => Partition::Forecast,
            PartitionArg::Midyear => Partition::Midyear,
        }
    }
}
