mod repo_cmd;

use clap::Parser;
use repo_cmd::RepoCommand;

/// Retrieval engine CLI: load ingestion records and search repositories
#[derive(Debug, Parser)]
#[command(name = "repogpt", version, about)]
struct Cli {
    #[command(subcommand)]
    command: RepoCommand,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    cli.command.run().await
}
