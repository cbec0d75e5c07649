//! Cinefeed server binary.
//!
//! Opens or creates a content store and serves it over a Unix domain socket.

use clap::Parser;
use cinefeed_core::api::CinefeedDB;
use cinefeed_server::CinefeedServer;
use cinefeed_server::config::{Cli, ServerConfig, StoreLocation};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ServerConfig::resolve(Cli::parse());

    // Ensure parent directories exist.
    if let StoreLocation::Journal(path) = &config.store
        && let Some(parent) = path.parent()
    {
        std::fs::create_dir_all(parent)?;
    }
    if let Some(parent) = config.socket_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db = match &config.store {
        StoreLocation::InMemory => {
            info!(socket = %config.socket_path.display(), "starting with in-memory store");
            CinefeedDB::in_memory()
        }
        StoreLocation::Journal(path) => {
            info!(db = %path.display(), socket = %config.socket_path.display(), "starting");
            let db = CinefeedDB::open(path)?;
            if config.compact_on_start {
                db.store().compact()?;
            }
            db
        }
    };

    let server = CinefeedServer::new(db, config.socket_path);
    server.run().await?;

    Ok(())
}
