use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use reportlens::cli::{self, Args};
use reportlens::config::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose {
        "reportlens=debug"
    } else {
        "reportlens=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::load(args.config.as_deref())?;
    cli::run(args.command, &settings).await
}
