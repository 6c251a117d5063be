//! vocount: a concurrent TCP text-analysis server
//!
//! Clients open a connection, send one plain-text message, and receive one
//! line back: the occurrence count of the target character, or an ERROR
//! reason. Two analysis modes:
//! - last-char: count the last character of an alphabetic message
//! - last-vowel: count the last vowel of a phrase, check the count for
//!   primality, and append the result to a journal file
//!
//! Configuration via CLI arguments or TOML file.

mod analysis;
mod config;
mod journal;
mod pool;
mod protocol;
mod server;

use config::Config;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!(
        listen = %config.listen,
        mode = ?config.mode,
        pool = ?config.pool,
        journal = ?config.journal,
        "Starting vocount server"
    );

    let server = server::Server::new(config).await?;
    server.run().await?;

    Ok(())
}
