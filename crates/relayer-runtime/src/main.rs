//! # Cross-Chain Relayer
//!
//! Entry point for the relayer process.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (`XC_CONFIG` or the first argument, then `XC_*` overrides)
//! 2. Initialize logging
//! 3. Wire subsystems and sync the trust store from BCDNS
//! 4. Run the relay pipeline until Ctrl+C

use anyhow::{Context, Result};
use relayer_runtime::{init_tracing, RelayerConfig, RelayerRuntime};
use shared_types::SystemTimeSource;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

fn config_path() -> Option<PathBuf> {
    std::env::var_os("XC_CONFIG")
        .map(PathBuf::from)
        .or_else(|| std::env::args_os().nth(1).map(PathBuf::from))
}

#[tokio::main]
async fn main() -> Result<()> {
    let path = config_path();
    let mut config = RelayerConfig::load(path.as_deref()).context("Failed to load configuration")?;
    config
        .apply_env()
        .context("Failed to apply environment overrides")?;

    init_tracing(&config.logging)?;
    match &path {
        Some(path) => info!("Loaded configuration from {:?}", path),
        None => info!("No configuration file given, using defaults"),
    }

    let mut runtime = RelayerRuntime::new(config, Arc::new(SystemTimeSource)).await?;
    runtime.start();

    info!("Relayer is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;

    runtime.shutdown().await
}
