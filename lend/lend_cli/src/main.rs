use clap::{Parser, Subcommand};

mod commands;
mod logging;

use commands::resource::{self, ResourceArgs};

/// Lend Command Line Interface
///
/// Demonstrates the bounded resource pool.
#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    /// Log level: trace, debug, info, warn or error
    #[clap(long, global = true, default_value = "warn")]
    log_level: String,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Borrow more resources than the pool holds and watch deferred grants
    Resource(ResourceArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_level)?;

    match cli.command {
        Commands::Resource(args) => resource::execute(args).await,
    }
}
