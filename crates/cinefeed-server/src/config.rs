//! Command-line and environment configuration for the server binary.

use std::path::PathBuf;

use clap::Parser;

/// Cinefeed server: serves news and slider content over a Unix socket.
#[derive(Parser, Debug)]
#[command(name = "cinefeed-server", version)]
pub struct Cli {
    /// Journal file path (default: ~/.local/share/cinefeed/content.journal).
    #[arg(long, env = "CINEFEED_DB")]
    pub db: Option<PathBuf>,

    /// Unix socket path (default: ~/.local/share/cinefeed/server.sock).
    #[arg(long, env = "CINEFEED_SOCKET")]
    pub socket: Option<PathBuf>,

    /// Keep all content in memory; nothing is written to disk.
    #[arg(long)]
    pub in_memory: bool,

    /// Rewrite the journal to one frame per live record after replay.
    #[arg(long, conflicts_with = "in_memory")]
    pub compact_on_start: bool,
}

/// Where the store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    InMemory,
    Journal(PathBuf),
}

/// Fully resolved server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub store: StoreLocation,
    pub socket_path: PathBuf,
    pub compact_on_start: bool,
}

impl ServerConfig {
    /// Fill in defaults under the platform's local data directory.
    pub fn resolve(cli: Cli) -> Self {
        Self::resolve_in(cli, default_data_dir())
    }

    fn resolve_in(cli: Cli, data_dir: PathBuf) -> Self {
        let store = if cli.in_memory {
            StoreLocation::InMemory
        } else {
            StoreLocation::Journal(cli.db.unwrap_or_else(|| data_dir.join("content.journal")))
        };
        Self {
            store,
            socket_path: cli.socket.unwrap_or_else(|| data_dir.join("server.sock")),
            compact_on_start: cli.compact_on_start,
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cinefeed")
}
