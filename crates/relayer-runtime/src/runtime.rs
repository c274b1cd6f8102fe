//! # Relayer Runtime
//!
//! Owns the wired subsystems and the shutdown channel.
//!
//! ## Startup Sequence
//!
//! 1. Validate configuration
//! 2. Wire subsystems (`DevNet::build`), syncing the trust store from BCDNS
//! 3. Spawn the relay pipeline loop
//!
//! ## Shutdown Sequence
//!
//! 1. Signal shutdown on the watch channel
//! 2. Wait for the current cycle to finish
//!
//! Every tracker transition is durable when it returns, so stopping between
//! cycles loses nothing.

use crate::config::RelayerConfig;
use crate::devnet::DevNet;
use anyhow::{Context, Result};
use shared_types::TimeSource;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};
use xc_04_relay_pipeline::PipelineResult;

/// The relayer process.
pub struct RelayerRuntime {
    config: RelayerConfig,
    net: DevNet,
    shutdown_tx: watch::Sender<bool>,
    pipeline_task: Option<JoinHandle<PipelineResult<()>>>,
}

impl RelayerRuntime {
    /// Validate `config` and wire every subsystem.
    pub async fn new(config: RelayerConfig, clock: Arc<dyn TimeSource>) -> Result<Self> {
        config.validate().context("Configuration rejected")?;
        let net = DevNet::build(&config, clock).await?;
        let (shutdown_tx, _) = watch::channel(false);
        Ok(Self {
            config,
            net,
            shutdown_tx,
            pipeline_task: None,
        })
    }

    /// Spawn the relay pipeline loop.
    pub fn start(&mut self) {
        info!("===========================================");
        info!("  Cross-Chain Relayer v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");
        info!("Chains: {:?}", self.config.chains);
        info!("Sources: {:?}", self.config.pipeline.source_chains);
        info!("Storage: {:?}", self.config.storage.backend);

        let pipeline = self.net.pipeline.clone();
        let shutdown = self.shutdown_tx.subscribe();
        self.pipeline_task = Some(tokio::spawn(async move { pipeline.run(shutdown).await }));
    }

    /// Wired subsystems.
    pub fn net(&self) -> &DevNet {
        &self.net
    }

    /// Signal shutdown and wait for the pipeline to stop.
    pub async fn shutdown(&mut self) -> Result<()> {
        info!("Initiating graceful shutdown...");
        // No receivers left means the pipeline already stopped.
        let _ = self.shutdown_tx.send(true);

        if let Some(task) = self.pipeline_task.take() {
            match task.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!("Relay pipeline stopped with error: {}", e),
                Err(e) => error!("Relay pipeline task panicked: {}", e),
            }
        }
        info!("Shutdown complete");
        Ok(())
    }
}
