use clap::Parser;
use livestream_cache::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Lookup(args) => cli::lookup::run(args).await,
        Command::Flush => cli::flush::run().await,
        Command::Ping => cli::ping::run().await,
    }
}
