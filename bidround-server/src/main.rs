//! Bidround Server
//!
//! HTTP frontend for the event-sourced bidding round store.

use bidround_core::{Store, StoreConfig};
use bidround_server::config::Config;
use bidround_server::routes::build_router;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Bidding round server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Event log path, overriding the config file
    #[arg(long)]
    db: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = Config::load(&args.config)?;
    let db_file = args.db.unwrap_or_else(|| config.db_file.clone());

    // A log that cannot be replayed must stop the process here.
    let store = Store::open(
        &db_file,
        StoreConfig {
            min_offer: config.min_offer,
            fsync_on_write: config.fsync,
        },
    )?;

    let app = build_router(Arc::new(store), config.admin_token.clone());

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!("Server: listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Server: shutting down"),
        Err(err) => error!("Server: shutdown signal error: {err}"),
    }
}
