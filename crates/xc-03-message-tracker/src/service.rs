//! # Message Tracker Service
//!
//! Owns every `TrackerRecord`. All mutations go through this type:
//!
//! 1. take the message's lock stripe
//! 2. load the record from the store
//! 3. apply the event to a copy
//! 4. persist the copy in one atomic batch
//! 5. update in-memory indexes
//!
//! A failure in step 4 leaves both the store and the indexes untouched.
//!
//! ## Storage layout
//!
//! | Key | Value |
//! |-----|-------|
//! | `live/{chain}/{seq:020}` | non-terminal record |
//! | `failed/{chain}/{seq:020}` | `Failed` record, until reinjected |
//! | `done/{chain}/{seq:020}` | `Confirmed` record |
//! | `archive/{chain}/{seq:020}/{generation:010}` | superseded record |
//! | `cursor/{chain}` | source-chain read cursor (u64, big endian) |
//!
//! A record moves between `live/`, `failed/` and `done/` in the same batch
//! as the transition that changes its state, so each key lives under exactly
//! one prefix. Per-cycle scans read `live/` (and `failed/` for reporting)
//! only; relayed history under `done/` is touched by point lookups alone.

use crate::domain::{
    RelayEvent, RelayState, RetryPolicy, TrackerError, TrackerRecord, TrackerResult,
};
use crate::ports::{BatchOperation, KeyValueStore};
use parking_lot::Mutex;
use shared_types::{ChainId, ChainPair, CrossChainMessage, MessageKey, TimeSource, Timestamp};
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeSet, HashMap};
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Number of lock stripes guarding records.
pub const LOCK_STRIPES: usize = 64;

const LIVE_PREFIX: &str = "live/";
const FAILED_PREFIX: &str = "failed/";
const DONE_PREFIX: &str = "done/";
const ARCHIVE_PREFIX: &str = "archive/";
const CURSOR_PREFIX: &str = "cursor/";

const RECORD_PREFIXES: [&str; 3] = [LIVE_PREFIX, FAILED_PREFIX, DONE_PREFIX];

/// Prefix a record in `state` is stored under.
fn prefix_for(state: &RelayState) -> &'static str {
    match state {
        RelayState::Confirmed => DONE_PREFIX,
        RelayState::Failed(_) => FAILED_PREFIX,
        _ => LIVE_PREFIX,
    }
}

fn record_key(prefix: &str, key: &MessageKey) -> Vec<u8> {
    format!("{prefix}{}", key.storage_suffix()).into_bytes()
}

/// Batch that stores `record` under the prefix for its state, removing the
/// copy left under `previous` when the state changed prefix.
fn store_ops(
    record: &TrackerRecord,
    previous: Option<&RelayState>,
) -> TrackerResult<Vec<BatchOperation>> {
    let prefix = prefix_for(record.state());
    let mut ops = Vec::with_capacity(2);
    if let Some(old) = previous.map(prefix_for).filter(|old| *old != prefix) {
        ops.push(BatchOperation::delete(record_key(old, record.key())));
    }
    ops.push(BatchOperation::put(
        record_key(prefix, record.key()),
        bincode::serialize(record)?,
    ));
    Ok(ops)
}

fn archive_key(key: &MessageKey, generation: u32) -> Vec<u8> {
    format!("{ARCHIVE_PREFIX}{}/{generation:010}", key.storage_suffix()).into_bytes()
}

fn cursor_key(chain: &ChainId) -> Vec<u8> {
    format!("{CURSOR_PREFIX}{chain}").into_bytes()
}

/// Result of ingesting one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// New `Pending` record created.
    Inserted,
    /// A record already exists for the key; nothing changed.
    Duplicate,
}

/// Counters from a batch ingest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// New records.
    pub inserted: usize,
    /// Already-known keys.
    pub duplicates: usize,
}

/// Counters from `recover`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Records found.
    pub total: usize,
    /// Non-terminal records.
    pub live: usize,
    /// Records caught mid-submission.
    pub submitting: usize,
    /// `Failed` records.
    pub failed: usize,
    /// `Confirmed` records.
    pub confirmed: usize,
}

type OrderingIndex = HashMap<ChainPair, BTreeSet<(u64, MessageKey)>>;

/// Cross-chain message tracker.
pub struct MessageTracker {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn TimeSource>,
    policy: RetryPolicy,
    stripes: Vec<Mutex<()>>,
    ordering: Mutex<OrderingIndex>,
}

impl MessageTracker {
    /// Open a tracker over `store`, rebuilding the ordering index from any
    /// records it already holds.
    pub fn open(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn TimeSource>,
        policy: RetryPolicy,
    ) -> TrackerResult<Self> {
        let tracker = Self {
            store,
            clock,
            policy,
            stripes: (0..LOCK_STRIPES).map(|_| Mutex::new(())).collect(),
            ordering: Mutex::new(HashMap::new()),
        };
        tracker.recover()?;
        Ok(tracker)
    }

    /// Retry policy in effect.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    fn stripe(&self, key: &MessageKey) -> &Mutex<()> {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        &self.stripes[(hasher.finish() as usize) % self.stripes.len()]
    }

    fn load(&self, key: &MessageKey) -> TrackerResult<Option<TrackerRecord>> {
        for prefix in RECORD_PREFIXES {
            if let Some(bytes) = self.store.get(&record_key(prefix, key))? {
                return Ok(Some(bincode::deserialize(&bytes)?));
            }
        }
        Ok(None)
    }

    fn load_existing(&self, key: &MessageKey) -> TrackerResult<TrackerRecord> {
        self.load(key)?
            .ok_or_else(|| TrackerError::NotFound(key.clone()))
    }

    fn scan(&self, prefix: &str) -> TrackerResult<Vec<TrackerRecord>> {
        self.store
            .prefix_scan(prefix.as_bytes())?
            .into_iter()
            .map(|(_, bytes)| bincode::deserialize(&bytes).map_err(TrackerError::from))
            .collect()
    }

    fn index(&self, record: &TrackerRecord) {
        let Some(hint) = record.message().sequence_hint else {
            return;
        };
        let mut ordering = self.ordering.lock();
        let entry = (hint, record.key().clone());
        if record.state().is_terminal() {
            if let Some(set) = ordering.get_mut(&record.message().chain_pair()) {
                set.remove(&entry);
            }
        } else {
            ordering
                .entry(record.message().chain_pair())
                .or_default()
                .insert(entry);
        }
    }

    // =========================================================================
    // INGESTION
    // =========================================================================

    /// Create a `Pending` record unless one already exists for the key.
    pub fn ingest(&self, message: CrossChainMessage) -> TrackerResult<IngestOutcome> {
        let key = message.key.clone();
        let _guard = self.stripe(&key).lock();

        if let Some(existing) = self.load(&key)? {
            if existing.message().payload != message.payload {
                warn!(
                    message = %key,
                    "[xc-03] Re-ingested message carries a different payload; keeping the original"
                );
            }
            debug!(message = %key, "[xc-03] Duplicate ingestion ignored");
            return Ok(IngestOutcome::Duplicate);
        }

        let record = TrackerRecord::new(message, 0, self.clock.now_ms());
        self.store.atomic_batch_write(store_ops(&record, None)?)?;
        self.index(&record);
        info!(
            message = %key,
            dest = %record.message().dest_chain,
            "[xc-03] Ingested message"
        );
        Ok(IngestOutcome::Inserted)
    }

    /// Ingest `messages` read from `chain`, then advance its cursor.
    ///
    /// Each message is persisted before the cursor moves, so a crash in
    /// between re-reads events that ingestion then deduplicates.
    pub fn ingest_all(
        &self,
        chain: &ChainId,
        messages: Vec<CrossChainMessage>,
        cursor: u64,
    ) -> TrackerResult<IngestReport> {
        let mut report = IngestReport::default();
        for message in messages {
            match self.ingest(message)? {
                IngestOutcome::Inserted => report.inserted += 1,
                IngestOutcome::Duplicate => report.duplicates += 1,
            }
        }
        self.advance_cursor(chain, cursor)?;
        Ok(report)
    }

    /// Persisted read cursor for `chain` (0 if none).
    pub fn cursor(&self, chain: &ChainId) -> TrackerResult<u64> {
        match self.store.get(&cursor_key(chain))? {
            Some(bytes) => {
                let raw: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
                    TrackerError::Codec(format!("cursor for {chain} is {} bytes", bytes.len()))
                })?;
                Ok(u64::from_be_bytes(raw))
            }
            None => Ok(0),
        }
    }

    /// Move the cursor forward. Never moves it back.
    pub fn advance_cursor(&self, chain: &ChainId, cursor: u64) -> TrackerResult<()> {
        if cursor <= self.cursor(chain)? {
            return Ok(());
        }
        self.store
            .put(&cursor_key(chain), &cursor.to_be_bytes())?;
        debug!(chain = %chain, cursor, "[xc-03] Cursor advanced");
        Ok(())
    }

    // =========================================================================
    // TRANSITIONS
    // =========================================================================

    /// Apply `event` to the record for `key` and persist it.
    pub fn transition(&self, key: &MessageKey, event: RelayEvent) -> TrackerResult<TrackerRecord> {
        let _guard = self.stripe(key).lock();
        self.apply_locked(key, event)
    }

    fn apply_locked(&self, key: &MessageKey, event: RelayEvent) -> TrackerResult<TrackerRecord> {
        let mut record = self.load_existing(key)?;
        let from = record.state().clone();
        record.apply(&event, &self.policy, self.clock.now_ms())?;

        self.store
            .atomic_batch_write(store_ops(&record, Some(&from))?)?;
        self.index(&record);

        match record.state() {
            RelayState::Confirmed => info!(
                message = %key,
                retries = record.retry_count(),
                "[xc-03] Message confirmed"
            ),
            RelayState::Failed(reason) => warn!(
                message = %key,
                "[xc-03] Message failed: {}",
                reason
            ),
            state => debug!(
                message = %key,
                version = record.version(),
                "[xc-03] {} --{}--> {}",
                from,
                event.name(),
                state
            ),
        }
        Ok(record)
    }

    /// Move an `Endorsed` record to `Submitting`, enforcing per-pair order.
    ///
    /// Refuses with `OrderingBlocked` while any message on the same chain
    /// pair with a strictly smaller `sequence_hint` is non-terminal.
    pub fn begin_submission(&self, key: &MessageKey) -> TrackerResult<TrackerRecord> {
        let _guard = self.stripe(key).lock();
        let record = self.load_existing(key)?;

        if let (RelayState::Endorsed, Some(hint)) =
            (record.state(), record.message().sequence_hint)
        {
            let ordering = self.ordering.lock();
            let earliest = ordering
                .get(&record.message().chain_pair())
                .and_then(|set| set.iter().next());
            if let Some((earliest_hint, earliest_key)) = earliest {
                if *earliest_hint < hint {
                    return Err(TrackerError::OrderingBlocked {
                        key: key.clone(),
                        blocked_by: earliest_key.clone(),
                        hint: *earliest_hint,
                    });
                }
            }
        }

        self.apply_locked(key, RelayEvent::SubmissionStarted)
    }

    /// Archive a `Failed` record and start a fresh `Pending` generation.
    pub fn reinject(&self, key: &MessageKey) -> TrackerResult<TrackerRecord> {
        let _guard = self.stripe(key).lock();
        let failed = self.load_existing(key)?;
        if !matches!(failed.state(), RelayState::Failed(_)) {
            return Err(TrackerError::NotFailed {
                key: key.clone(),
                state: failed.state().to_string(),
            });
        }

        let fresh = TrackerRecord::new(
            failed.message().clone(),
            failed.generation() + 1,
            self.clock.now_ms(),
        );
        let mut ops = vec![BatchOperation::put(
            archive_key(key, failed.generation()),
            bincode::serialize(&failed)?,
        )];
        ops.extend(store_ops(&fresh, Some(failed.state()))?);
        self.store.atomic_batch_write(ops)?;
        self.index(&fresh);

        info!(
            message = %key,
            generation = fresh.generation(),
            "[xc-03] Reinjected after {}",
            failed.state()
        );
        Ok(fresh)
    }

    // =========================================================================
    // RECOVERY & QUERIES
    // =========================================================================

    /// Rebuild in-memory indexes from the store.
    ///
    /// Runs on [`open`](Self::open); only live records are decoded.
    pub fn recover(&self) -> TrackerResult<RecoveryReport> {
        let live = self.scan(LIVE_PREFIX)?;
        let mut report = RecoveryReport {
            live: live.len(),
            failed: self.store.prefix_scan(FAILED_PREFIX.as_bytes())?.len(),
            confirmed: self.store.prefix_scan(DONE_PREFIX.as_bytes())?.len(),
            ..Default::default()
        };
        report.total = report.live + report.failed + report.confirmed;

        let mut rebuilt = OrderingIndex::new();
        for record in &live {
            if *record.state() == RelayState::Submitting {
                report.submitting += 1;
            }
            if let Some(hint) = record.message().sequence_hint {
                rebuilt
                    .entry(record.message().chain_pair())
                    .or_default()
                    .insert((hint, record.key().clone()));
            }
        }
        *self.ordering.lock() = rebuilt;

        info!(
            "[xc-03] Recovered {} records ({} live, {} mid-submission, {} failed, {} confirmed)",
            report.total, report.live, report.submitting, report.failed, report.confirmed
        );
        Ok(report)
    }

    /// Snapshot of the current generation's record for `key`, in any state.
    pub fn get(&self, key: &MessageKey) -> TrackerResult<Option<TrackerRecord>> {
        self.load(key)
    }

    /// Every current record, terminal ones included, in key order.
    pub fn all_records(&self) -> TrackerResult<Vec<TrackerRecord>> {
        let mut records = Vec::new();
        for prefix in RECORD_PREFIXES {
            records.extend(self.scan(prefix)?);
        }
        records.sort_by(|a, b| a.key().cmp(b.key()));
        Ok(records)
    }

    /// Non-terminal records due at `now`, ordered by `(sequence_hint, key)`.
    pub fn due_records(&self, now: Timestamp) -> TrackerResult<Vec<TrackerRecord>> {
        let mut due: Vec<_> = self
            .scan(LIVE_PREFIX)?
            .into_iter()
            .filter(|r| r.is_due(now))
            .collect();
        due.sort_by(|a, b| {
            (a.message().sequence_hint, a.key()).cmp(&(b.message().sequence_hint, b.key()))
        });
        Ok(due)
    }

    /// Records whose state has the same variant as `state`.
    pub fn records_in(&self, state: &RelayState) -> TrackerResult<Vec<TrackerRecord>> {
        Ok(self
            .scan(prefix_for(state))?
            .into_iter()
            .filter(|r| r.state().same_kind(state))
            .collect())
    }

    /// All `Failed` records.
    pub fn failed_records(&self) -> TrackerResult<Vec<TrackerRecord>> {
        self.scan(FAILED_PREFIX)
    }

    /// Archived generations of `key`, oldest first.
    pub fn archived(&self, key: &MessageKey) -> TrackerResult<Vec<TrackerRecord>> {
        self.scan(&format!("{ARCHIVE_PREFIX}{}/", key.storage_suffix()))
    }
}
