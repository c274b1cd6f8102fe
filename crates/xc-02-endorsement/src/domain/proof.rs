//! # Endorsed Proofs
//!
//! Immutable once assembled. Only accepted `Endorse` verdicts are carried,
//! ordered by member id.

use super::epoch::{CommitteeEpoch, MemberId};
use super::errors::{EndorsementError, EndorsementResult};
use super::verdict::{check_verdict, EndorsementRequest, EndorsementVerdict, VerdictOutcome};
use serde::{Deserialize, Serialize};
use shared_types::{Hash, MessageKey, Timestamp};
use std::collections::BTreeSet;
use uuid::Uuid;
use xc_01_trust_store::TrustStoreApi;

/// Portable quorum proof over one claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndorsedProof {
    message_id: MessageKey,
    claim_digest: Hash,
    epoch: u64,
    threshold: usize,
    verdicts: Vec<EndorsementVerdict>,
    threshold_met: bool,
}

impl EndorsedProof {
    /// Assemble from accepted verdicts. Sorts by member id.
    pub fn assemble(
        message_id: MessageKey,
        claim_digest: Hash,
        epoch: u64,
        threshold: usize,
        mut verdicts: Vec<EndorsementVerdict>,
    ) -> Self {
        verdicts.sort_by(|a, b| a.member_id.cmp(&b.member_id));
        verdicts.dedup_by(|a, b| a.member_id == b.member_id);
        let threshold_met = verdicts.len() >= threshold;
        Self {
            message_id,
            claim_digest,
            epoch,
            threshold,
            verdicts,
            threshold_met,
        }
    }

    /// Endorsed message.
    pub fn message_id(&self) -> &MessageKey {
        &self.message_id
    }

    /// Claim digest every verdict signed.
    pub fn claim_digest(&self) -> &Hash {
        &self.claim_digest
    }

    /// Epoch the verdicts were collected in.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Threshold of that epoch.
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Accepted verdicts, ordered by member id.
    pub fn verdicts(&self) -> &[EndorsementVerdict] {
        &self.verdicts
    }

    /// Endorsing member ids in order.
    pub fn member_ids(&self) -> impl Iterator<Item = &MemberId> {
        self.verdicts.iter().map(|v| &v.member_id)
    }

    /// Whether the proof carries at least `threshold` endorsements.
    pub fn threshold_met(&self) -> bool {
        self.threshold_met
    }

    /// Re-check every verdict against `epoch` and the trust store.
    ///
    /// Intended for destination-side checks and audits.
    pub fn verify(
        &self,
        epoch: &CommitteeEpoch,
        trust: &dyn TrustStoreApi,
        as_of: Timestamp,
    ) -> EndorsementResult<()> {
        if epoch.epoch_id() != self.epoch {
            return Err(EndorsementError::InvalidProof(format!(
                "proof epoch {} checked against epoch {}",
                self.epoch,
                epoch.epoch_id()
            )));
        }
        let request = EndorsementRequest {
            correlation_id: Uuid::nil(),
            message_id: self.message_id.clone(),
            claim_digest: self.claim_digest,
            committee_epoch: self.epoch,
            payload: Vec::new(),
        };
        let mut seen = BTreeSet::new();
        for verdict in &self.verdicts {
            if !seen.insert(&verdict.member_id) {
                return Err(EndorsementError::InvalidProof(format!(
                    "duplicate member {}",
                    verdict.member_id
                )));
            }
            let outcome =
                check_verdict(&verdict.member_id, verdict, &request, epoch, trust, as_of)
                    .map_err(|e| {
                        EndorsementError::InvalidProof(format!("{}: {}", verdict.member_id, e))
                    })?;
            if outcome != VerdictOutcome::Endorse {
                return Err(EndorsementError::InvalidProof(format!(
                    "{} did not endorse",
                    verdict.member_id
                )));
            }
        }
        if seen.len() < epoch.quorum_threshold() {
            return Err(EndorsementError::InvalidProof(format!(
                "{} endorsements below threshold {}",
                seen.len(),
                epoch.quorum_threshold()
            )));
        }
        Ok(())
    }
}
