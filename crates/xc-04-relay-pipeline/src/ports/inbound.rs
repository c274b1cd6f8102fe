//! # Inbound Ports

use crate::domain::{CycleReport, PipelineResult};
use async_trait::async_trait;

/// Relay pipeline API - inbound port.
#[async_trait]
pub trait RelayPipelineApi: Send + Sync {
    /// Ingest new source events and advance every due record by one step.
    async fn run_cycle(&self) -> PipelineResult<CycleReport>;
}
