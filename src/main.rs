use anyhow::Result;
use bankledger::cli::Cli;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    bankledger::logging::init(&cli.log_level);
    cli.run().await
}
