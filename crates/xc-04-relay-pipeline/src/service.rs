//! # Relay Pipeline Service
//!
//! Drives every tracked message to a terminal state.
//!
//! ## Cycle
//!
//! ```text
//! ingest (per source chain) ──→ reinject after epoch change (optional)
//!        │
//!        ▼
//! due records ──→ Semaphore(max_concurrency) ──→ JoinSet: one step per record
//!
//! Pending / AwaitingEndorsement ──→ endorsement round ──→ Endorsed | retry | Failed
//! Endorsed                      ──→ ordering gate ──→ submit ──→ Confirmed | retry | Failed
//! Submitting (after a crash)    ──→ re-submit
//! ```
//!
//! Every state change goes through the tracker, which persists it before
//! returning. Dropping a cycle mid-flight leaves each record at its last
//! durable state.

use crate::config::PipelineConfig;
use crate::domain::{CycleReport, PipelineError, PipelineResult, StepOutcome, SubmissionOutcome};
use crate::ports::{ChainAdapterRegistry, RelayPipelineApi};
use async_trait::async_trait;
use shared_types::{ChainId, TimeSource};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;
use tokio::time::{timeout, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use xc_02_endorsement::{EndorsementApi, EndorsementError, EpochRegistry};
use xc_03_message_tracker::{
    FailureReason, MessageTracker, RelayEvent, RelayState, TrackerError, TrackerRecord,
};

/// Everything a worker task needs to advance one record.
#[derive(Clone)]
struct StepContext {
    tracker: Arc<MessageTracker>,
    endorsement: Arc<dyn EndorsementApi>,
    epochs: Arc<EpochRegistry>,
    chains: Arc<ChainAdapterRegistry>,
    chain_timeout: Duration,
}

/// Relay pipeline.
pub struct RelayPipeline {
    config: PipelineConfig,
    ctx: StepContext,
    clock: Arc<dyn TimeSource>,
    workers: Arc<Semaphore>,
}

impl RelayPipeline {
    /// Wire a pipeline.
    pub fn new(
        config: PipelineConfig,
        tracker: Arc<MessageTracker>,
        endorsement: Arc<dyn EndorsementApi>,
        epochs: Arc<EpochRegistry>,
        chains: Arc<ChainAdapterRegistry>,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        let ctx = StepContext {
            tracker,
            endorsement,
            epochs,
            chains,
            chain_timeout: config.chain_timeout(),
        };
        Self {
            workers: Arc::new(Semaphore::new(config.max_concurrency.max(1))),
            config,
            ctx,
            clock,
        }
    }

    /// Pipeline configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The tracker this pipeline drives.
    pub fn tracker(&self) -> &Arc<MessageTracker> {
        &self.ctx.tracker
    }

    /// Run cycles every `poll_interval` until `shutdown` becomes `true` or
    /// its sender is dropped.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> PipelineResult<()> {
        info!(
            "[xc-04] Relay pipeline started ({} source chains, {} workers)",
            self.config.source_chains.len(),
            self.config.max_concurrency
        );

        let mut ticker = tokio::time::interval(self.config.poll_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.run_cycle().await {
                        Ok(report) if !report.is_idle() => info!(
                            "[xc-04] Cycle: {} ingested, {} endorsed, {} confirmed, {} retrying, {} blocked, {} failed",
                            report.ingested,
                            report.endorsed,
                            report.confirmed,
                            report.retrying,
                            report.blocked,
                            report.failed
                        ),
                        Ok(_) => {}
                        Err(e) => error!("[xc-04] Cycle aborted: {}", e),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("[xc-04] Relay pipeline stopped");
        Ok(())
    }

    async fn ingest(&self, report: &mut CycleReport) {
        for chain in &self.config.source_chains {
            if let Err(e) = self.ingest_chain(chain, report).await {
                warn!(chain = %chain, "[xc-04] Ingestion skipped: {}", e);
                report.errors += 1;
            }
        }
    }

    async fn ingest_chain(&self, chain: &ChainId, report: &mut CycleReport) -> Result<(), String> {
        let adapter = self
            .ctx
            .chains
            .get(chain)
            .ok_or_else(|| format!("no adapter registered for {chain}"))?;
        let since = self.ctx.tracker.cursor(chain).map_err(|e| e.to_string())?;

        let events = timeout(self.ctx.chain_timeout, adapter.read_new_events(chain, since))
            .await
            .map_err(|_| format!("read timed out after {:?}", self.ctx.chain_timeout))?
            .map_err(|e| e.to_string())?;
        let Some(cursor) = events.iter().map(|e| e.sequence).max() else {
            return Ok(());
        };

        let now = self.clock.now_ms();
        let messages = events
            .into_iter()
            .map(|e| e.into_message(chain.clone(), now))
            .collect();
        let ingested = self
            .ctx
            .tracker
            .ingest_all(chain, messages, cursor)
            .map_err(|e| e.to_string())?;

        debug!(
            chain = %chain,
            cursor,
            "[xc-04] Read {} new, {} known events",
            ingested.inserted,
            ingested.duplicates
        );
        report.ingested += ingested.inserted;
        report.duplicates += ingested.duplicates;
        Ok(())
    }

    /// Give `Failed(QuorumUnreachable)` records from an older epoch a fresh
    /// generation.
    fn reinject_after_epoch_change(&self, report: &mut CycleReport) -> PipelineResult<()> {
        let current = self.ctx.epochs.current_id();
        for record in self.ctx.tracker.failed_records()? {
            let RelayState::Failed(FailureReason::QuorumUnreachable { epoch }) = record.state()
            else {
                continue;
            };
            if *epoch >= current {
                continue;
            }
            match self.ctx.tracker.reinject(record.key()) {
                Ok(_) => report.reinjected += 1,
                Err(e) => {
                    warn!(message = %record.key(), "[xc-04] Reinjection failed: {}", e);
                    report.errors += 1;
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl RelayPipelineApi for RelayPipeline {
    async fn run_cycle(&self) -> PipelineResult<CycleReport> {
        let mut report = CycleReport::default();

        self.ingest(&mut report).await;
        if self.config.reinject_on_epoch_change {
            self.reinject_after_epoch_change(&mut report)?;
        }

        let due = self.ctx.tracker.due_records(self.clock.now_ms())?;
        let mut steps = JoinSet::new();
        for record in due {
            let permit = self
                .workers
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| PipelineError::ShuttingDown)?;
            let ctx = self.ctx.clone();
            steps.spawn(async move {
                let _permit = permit;
                ctx.advance(record).await
            });
        }

        while let Some(joined) = steps.join_next().await {
            match joined {
                Ok(outcome) => report.record(&outcome),
                Err(e) => {
                    error!("[xc-04] Worker task failed: {}", e);
                    report.errors += 1;
                }
            }
        }

        report.failed = self.ctx.tracker.failed_records()?.len();
        if report.newly_failed > 0 {
            warn!(
                "[xc-04] {} messages failed this cycle ({} awaiting operator action)",
                report.newly_failed, report.failed
            );
        }
        Ok(report)
    }
}

impl StepContext {
    async fn advance(&self, record: TrackerRecord) -> StepOutcome {
        let key = record.key().clone();
        let result = match record.state() {
            RelayState::Pending => {
                let epoch = self.epochs.current_id();
                match self
                    .tracker
                    .transition(&key, RelayEvent::EndorsementRequested { epoch })
                {
                    Ok(record) => self.endorse(record).await,
                    Err(e) => Err(e),
                }
            }
            RelayState::AwaitingEndorsement => self.endorse(record).await,
            RelayState::Endorsed => match self.tracker.begin_submission(&key) {
                Ok(record) => self.submit(record).await,
                Err(e) => Err(e),
            },
            RelayState::Submitting => self.submit(record).await,
            RelayState::Confirmed | RelayState::Failed(_) => {
                return StepOutcome::Error(format!("{key} is already terminal"));
            }
        };

        match result {
            Ok(outcome) => outcome,
            Err(TrackerError::OrderingBlocked { blocked_by, .. }) => {
                debug!(message = %key, "[xc-04] Waiting for {}", blocked_by);
                StepOutcome::Blocked
            }
            Err(e) => {
                warn!(message = %key, "[xc-04] Step failed: {}", e);
                StepOutcome::Error(e.to_string())
            }
        }
    }

    /// Run one endorsement round against the current epoch snapshot.
    async fn endorse(&self, record: TrackerRecord) -> Result<StepOutcome, TrackerError> {
        let key = record.key();
        let epoch = self.epochs.current();

        let event = match self
            .endorsement
            .request_endorsement(record.message(), epoch)
            .await
        {
            Ok(proof) => RelayEvent::QuorumReached { proof },
            Err(EndorsementError::QuorumUnreachable { epoch, .. }) => {
                RelayEvent::QuorumUnreachable { epoch }
            }
            Err(e) => {
                warn!(message = %key, "[xc-04] Endorsement round failed: {}", e);
                RelayEvent::EndorsementRetry {
                    reason: e.to_string(),
                }
            }
        };

        let updated = self.tracker.transition(key, event)?;
        Ok(outcome_of(&updated))
    }

    /// Submit the stored proof to the destination chain.
    async fn submit(&self, record: TrackerRecord) -> Result<StepOutcome, TrackerError> {
        let key = record.key();
        let dest = &record.message().dest_chain;

        let event = match (record.proof(), self.chains.get(dest)) {
            (None, _) => {
                return Ok(StepOutcome::Error(format!("{key} has no proof to submit")));
            }
            (Some(_), None) => RelayEvent::DestinationRejected {
                reason: format!("no adapter registered for {dest}"),
            },
            (Some(proof), Some(adapter)) => {
                let submission = adapter.submit_proof(dest, proof, record.message());
                match timeout(self.chain_timeout, submission).await {
                    Ok(SubmissionOutcome::Accepted) => RelayEvent::DestinationAccepted,
                    Ok(SubmissionOutcome::PermanentReject(reason)) => {
                        RelayEvent::DestinationRejected { reason }
                    }
                    Ok(SubmissionOutcome::TransientError(reason)) => {
                        warn!(message = %key, dest = %dest, "[xc-04] Transient submission failure: {}", reason);
                        RelayEvent::SubmissionRetry { reason }
                    }
                    Err(_) => {
                        warn!(message = %key, dest = %dest, "[xc-04] Submission timed out");
                        RelayEvent::SubmissionRetry {
                            reason: format!("timed out after {:?}", self.chain_timeout),
                        }
                    }
                }
            }
        };

        let updated = self.tracker.transition(key, event)?;
        Ok(outcome_of(&updated))
    }
}

/// Classify the state a step left the record in.
fn outcome_of(record: &TrackerRecord) -> StepOutcome {
    match record.state() {
        RelayState::Endorsed if record.retry_count() == 0 => StepOutcome::Endorsed,
        RelayState::Confirmed => StepOutcome::Confirmed,
        RelayState::Failed(reason) => StepOutcome::Failed(reason.clone()),
        _ => StepOutcome::Retrying,
    }
}
