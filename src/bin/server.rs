//! AtlasDoc Server Binary
//!
//! Starts the TCP server for AtlasDoc.

use std::sync::Arc;

use atlasdoc::network::Server;
use atlasdoc::{Config, Engine};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

/// AtlasDoc Server
#[derive(Parser, Debug)]
#[command(name = "atlasdoc-server")]
#[command(about = "Filesystem-backed JSON document store")]
#[command(version)]
struct Args {
    /// Data directory (one subdirectory per collection)
    #[arg(short, long, default_value = "./atlasdoc_data")]
    data_dir: String,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:7070")]
    listen: String,

    /// Maximum connections served at once
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,

    /// Skip fsync before renaming documents into place
    #[arg(long)]
    no_sync: bool,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,atlasdoc=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("AtlasDoc Server v{}", atlasdoc::VERSION);
    tracing::info!("Data directory: {}", args.data_dir);
    tracing::info!("Listen address: {}", args.listen);

    // Build config from args
    let config = Config::builder()
        .data_dir(&args.data_dir)
        .listen_addr(&args.listen)
        .max_connections(args.max_connections)
        .sync_writes(!args.no_sync)
        .build();

    // Open engine
    let engine = match Engine::open(config.clone()) {
        Ok(e) => Arc::new(e),
        Err(e) => {
            tracing::error!("Failed to open engine: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Engine initialized successfully");

    // Start server
    let server = match Server::bind(config, engine) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
