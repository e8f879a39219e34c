//! Spreadscan entry point
//!
//! Orchestrates:
//! 1. Env + logging initialization
//! 2. Settings and blacklist snapshots
//! 3. Exchange registry over a shared HTTP client
//! 4. Scanner bootstrap (coin universe)
//! 5. Refresh loop
//! 6. Ctrl+C graceful shutdown

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use spreadscan::config::{init_logging, BlacklistStore, ScanMode, SettingsStore};
use spreadscan::core::{CoinGeckoSource, LogSink, Scanner};
use spreadscan::exchanges::build_registry;

/// Shared HTTP client timeout
const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // =========================================================================
    // 1. Env + logging
    // =========================================================================
    dotenvy::dotenv().ok();
    init_logging();

    info!(version = env!("CARGO_PKG_VERSION"), "=== Spreadscan ===");

    // =========================================================================
    // 2. Persistence
    // =========================================================================
    let settings_store = SettingsStore::from_env();
    let blacklist_store = BlacklistStore::from_env();
    info!(
        settings = %settings_store.path().display(),
        blacklist = %blacklist_store.path().display(),
        "Loading snapshots"
    );

    // =========================================================================
    // 3. Exchange registry over one shared HTTP client
    // =========================================================================
    let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
    let registry = Arc::new(build_registry(&http));

    // =========================================================================
    // 4. Scanner bootstrap
    // =========================================================================
    let scanner = Scanner::new(
        registry,
        Arc::new(CoinGeckoSource::new(http)),
        Arc::new(LogSink),
        settings_store,
        blacklist_store,
    );
    scanner.bootstrap().await;

    // =========================================================================
    // 5. Refresh loop
    // =========================================================================
    match scanner.settings().scan_mode {
        ScanMode::Auto => scanner.start_auto_refresh(),
        ScanMode::Manual => scanner.refresh_once().await,
    }

    // =========================================================================
    // 6. Wait for Ctrl+C → graceful shutdown
    // =========================================================================
    info!("Press Ctrl+C to shutdown");
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    scanner.shutdown().await;
    info!("=== Shutdown complete ===");
    Ok(())
}
