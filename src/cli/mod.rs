//! CLI module for the livestream cache
//!
//! Provides subcommands for exercising the caches against a live deployment:
//! - `lookup`: fetch one entity through the local or networked cache
//! - `flush`: drop every entry from the networked store
//! - `ping`: check database and store connectivity

pub mod flush;
pub mod lookup;
pub mod ping;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// Livestream cache - entity lookups through the cache layer
#[derive(Parser)]
#[command(name = "livestream-cache")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Look up one entity and print it as JSON
    Lookup(lookup::LookupArgs),

    /// Flush the networked cache store
    Flush,

    /// Check database and cache store connectivity
    Ping,
}

/// Loads `.env` and the layered configuration, then installs logging
fn bootstrap() -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    logging::init_logging(&config.logging);

    Ok(config)
}
