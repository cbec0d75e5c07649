//! Cinefeed server and client library.
//!
//! Serves the content API over a local Unix socket so that several
//! processes (site renderer, admin tools, scripts) can share one journaled
//! store without contending for its file lock.

pub mod client;
pub mod config;
pub mod error;
pub mod protocol;
pub mod server;

pub use client::{CinefeedClient, ListOptions};
pub use config::{Cli, ServerConfig};
pub use server::CinefeedServer;
