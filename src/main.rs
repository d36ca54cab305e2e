/// Main entry point for the Quest Tracker MCP server
///
/// Sets up logging, parses command line arguments, signs in, and serves MCP
/// requests over stdin/stdout.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use quest_tracker_mcp::config::default_data_dir;
use quest_tracker_mcp::{BackendKind, QuestTrackerServer, StorageConfig, SystemClock};

/// Command line arguments for the Quest Tracker MCP server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Storage backend: relational (SQLite) or local (key-value file)
    #[arg(long, default_value_t = BackendKind::Relational)]
    backend: BackendKind,

    /// Path to the SQLite database file
    /// If not provided, uses a default location in the user's home directory
    #[arg(long)]
    database: Option<PathBuf>,

    /// Path to the key-value store file used by the local backend
    #[arg(long)]
    local_store: Option<PathBuf>,

    /// Username to act as
    #[arg(short, long)]
    username: String,

    /// Password for the user
    #[arg(long, env = "QUEST_TRACKER_PASSWORD", hide_env_values = true)]
    password: String,

    /// Register the user if the credentials are not recognized
    #[arg(long)]
    register: bool,

    /// Create the demo/password account in the local backend
    #[arg(long)]
    seed_demo_user: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable verbose output (implies debug)
    #[arg(short, long)]
    verbose: bool,
}

/// Make sure the parent directory of a user-supplied path exists
fn prepare_path(path: PathBuf) -> std::io::Result<PathBuf> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(path)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let log_level = if args.verbose {
        "debug"
    } else if args.debug {
        "info"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(format!("quest_tracker_mcp={}", log_level))
        .with_writer(std::io::stderr) // stdout carries the protocol
        .init();

    info!("Starting Quest Tracker MCP server");

    let mut config = StorageConfig::in_dir(args.backend, default_data_dir()?);
    if let Some(path) = args.database {
        config.database_path = prepare_path(path)?;
    }
    if let Some(path) = args.local_store {
        config.local_store_path = prepare_path(path)?;
    }
    config.seed_demo_user = args.seed_demo_user;

    match config.backend {
        BackendKind::Relational => info!("Using database at: {}", config.database_path.display()),
        BackendKind::Local => info!("Using local store at: {}", config.local_store_path.display()),
    }

    let server = QuestTrackerServer::new(
        &config,
        Arc::new(SystemClock),
        &args.username,
        &args.password,
        args.register,
    )?;

    server.run().await?;

    info!("Quest Tracker MCP server shutdown complete");
    Ok(())
}
