//! # Endorsement Coordinator
//!
//! Fans a claim out to every member of an epoch and returns as soon as the
//! quorum outcome is decided.
//!
//! ## Round lifecycle
//!
//! ```text
//! digest payload ──→ one task per member ──→ task: timeout(call) → check_verdict
//!                                                   │
//!                                                   └─→ lock accumulator, admit
//!
//! coordinator: join_next() until status != Pending, then drop the JoinSet
//!              (aborting stragglers) and build the proof or the error
//! ```
//!
//! Tasks share only the accumulator. A member timing out or failing does not
//! affect its siblings.

use crate::config::CoordinatorConfig;
use crate::domain::{
    check_verdict, CommitteeEpoch, EndorsedProof, EndorsementRequest, EndorsementResult,
    MemberId, MemberResponse, QuorumAccumulator, QuorumStatus,
};
use crate::ports::{CommitteeMemberClient, EndorsementApi};
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{short_hex, CrossChainMessage, TimeSource};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use uuid::Uuid;
use xc_01_trust_store::TrustStoreApi;

/// Endorsement coordinator.
pub struct EndorsementCoordinator {
    config: CoordinatorConfig,
    clients: HashMap<MemberId, Arc<dyn CommitteeMemberClient>>,
    trust: Arc<dyn TrustStoreApi>,
    clock: Arc<dyn TimeSource>,
}

impl EndorsementCoordinator {
    /// Create a coordinator over a set of member transports.
    pub fn new(
        config: CoordinatorConfig,
        clients: Vec<Arc<dyn CommitteeMemberClient>>,
        trust: Arc<dyn TrustStoreApi>,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        let clients = clients
            .into_iter()
            .map(|c| (c.member_id().clone(), c))
            .collect();
        Self {
            config,
            clients,
            trust,
            clock,
        }
    }

    /// Register or replace a member transport.
    pub fn add_client(&mut self, client: Arc<dyn CommitteeMemberClient>) {
        self.clients.insert(client.member_id().clone(), client);
    }

    async fn run_round(
        &self,
        message: &CrossChainMessage,
        epoch: Arc<CommitteeEpoch>,
    ) -> EndorsementResult<EndorsedProof> {
        let claim_digest = message.claim_digest();
        let request = Arc::new(EndorsementRequest {
            correlation_id: Uuid::new_v4(),
            message_id: message.key.clone(),
            claim_digest,
            committee_epoch: epoch.epoch_id(),
            payload: message.payload.clone(),
        });
        let accumulator = Arc::new(Mutex::new(QuorumAccumulator::new(
            epoch.clone(),
            message.key.clone(),
            claim_digest,
        )));

        info!(
            message = %message.key,
            epoch = epoch.epoch_id(),
            correlation = %request.correlation_id,
            "[xc-02] Requesting endorsement of {} from {} members (threshold {})",
            short_hex(&claim_digest),
            epoch.len(),
            epoch.quorum_threshold()
        );

        let mut reachable = Vec::with_capacity(epoch.len());
        for member_id in epoch.member_ids() {
            match self.clients.get(member_id) {
                Some(client) => reachable.push((member_id.clone(), client.clone())),
                None => {
                    warn!(member = %member_id, "[xc-02] No transport for committee member");
                    accumulator
                        .lock()
                        .admit(member_id, MemberResponse::Failed("no transport".into()));
                }
            }
        }

        let mut tasks = JoinSet::new();
        let mut status = accumulator.lock().status();
        if status == QuorumStatus::Pending {
            for (member_id, client) in reachable {
                tasks.spawn(endorse_one(
                    member_id,
                    client,
                    request.clone(),
                    epoch.clone(),
                    accumulator.clone(),
                    self.trust.clone(),
                    self.clock.clone(),
                    self.config.member_timeout(),
                ));
            }
        }

        while status == QuorumStatus::Pending {
            match tasks.join_next().await {
                Some(Ok(next)) => status = next,
                Some(Err(err)) => {
                    warn!(
                        correlation = %request.correlation_id,
                        "[xc-02] Member task failed: {}",
                        err
                    );
                }
                // Every task finished without deciding; only possible if a
                // task died before admitting its member.
                None => break,
            }
        }
        // Late verdicts are never admitted.
        tasks.abort_all();

        let acc = accumulator.lock();
        let tally = acc.tally();
        if acc.status() == QuorumStatus::Reached {
            let proof = acc.build_proof();
            info!(
                message = %message.key,
                epoch = epoch.epoch_id(),
                correlation = %request.correlation_id,
                "[xc-02] Quorum reached: {}/{} endorsements ({} responded)",
                tally.endorsed,
                tally.threshold,
                tally.responded
            );
            return Ok(proof);
        }

        let err = acc.failure();
        warn!(
            message = %message.key,
            epoch = epoch.epoch_id(),
            correlation = %request.correlation_id,
            "[xc-02] Endorsement failed: {} (rejected {}, abstained {}, discarded {}, timed out {})",
            err,
            tally.rejected,
            tally.abstained,
            tally.discarded,
            tally.timed_out
        );
        Err(err)
    }
}

#[async_trait]
impl EndorsementApi for EndorsementCoordinator {
    async fn request_endorsement(
        &self,
        message: &CrossChainMessage,
        epoch: Arc<CommitteeEpoch>,
    ) -> EndorsementResult<EndorsedProof> {
        self.run_round(message, epoch).await
    }
}

/// One member's share of a round. Returns the accumulator status after
/// admitting this member's response.
#[allow(clippy::too_many_arguments)]
async fn endorse_one(
    member_id: MemberId,
    client: Arc<dyn CommitteeMemberClient>,
    request: Arc<EndorsementRequest>,
    epoch: Arc<CommitteeEpoch>,
    accumulator: Arc<Mutex<QuorumAccumulator>>,
    trust: Arc<dyn TrustStoreApi>,
    clock: Arc<dyn TimeSource>,
    timeout: std::time::Duration,
) -> QuorumStatus {
    let response = match tokio::time::timeout(timeout, client.request_endorsement(&request)).await
    {
        Err(_) => {
            debug!(member = %member_id, "[xc-02] Member timed out; counted as abstain");
            MemberResponse::TimedOut
        }
        Ok(Err(err)) => {
            warn!(member = %member_id, "[xc-02] Member request failed: {}", err);
            MemberResponse::Failed(err.to_string())
        }
        Ok(Ok(verdict)) => {
            match check_verdict(
                &member_id,
                &verdict,
                &request,
                &epoch,
                trust.as_ref(),
                clock.now_ms(),
            ) {
                Ok(outcome) => {
                    debug!(member = %member_id, "[xc-02] Verdict accepted: {:?}", outcome);
                    MemberResponse::Accepted(verdict)
                }
                Err(rejection) => {
                    warn!(member = %member_id, "[xc-02] Verdict discarded: {}", rejection);
                    MemberResponse::Discarded(rejection)
                }
            }
        }
    };
    accumulator.lock().admit(&member_id, response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{ClaimPolicy, LocalCommitteeMember};
    use crate::domain::{EndorsementError, VerdictOutcome};
    use shared_types::{ChainId, ManualClock, MessageKey};
    use std::collections::BTreeMap;
    use std::time::Duration;
    use xc_01_trust_store::{
        CertificateAuthority, RootRotation, Subject, SubjectKind, TrustStore, TrustStoreConfig,
    };

    struct Committee {
        trust: Arc<TrustStore>,
        members: Vec<Arc<LocalCommitteeMember>>,
        epoch: Arc<CommitteeEpoch>,
    }

    fn committee(policies: Vec<ClaimPolicy>) -> Committee {
        let root = CertificateAuthority::new_root("bcdns", 0, u64::MAX).unwrap();
        let trust = Arc::new(
            TrustStore::with_roots(
                TrustStoreConfig::default(),
                &RootRotation {
                    version: 1,
                    roots: vec![root.certificate().clone()],
                    issued_at: 0,
                },
            )
            .unwrap(),
        );
        let mut registered = BTreeMap::new();
        let mut members = Vec::new();
        for (i, policy) in policies.into_iter().enumerate() {
            let id = MemberId::new(format!("m{i}"));
            let (key, chain) = root
                .issue_identity(
                    Subject::new(SubjectKind::CommitteeMember, id.as_str()),
                    0,
                    u64::MAX,
                )
                .unwrap();
            registered.insert(id.clone(), chain.leaf().unwrap().clone());
            members.push(Arc::new(LocalCommitteeMember::new(id, key, chain, policy)));
        }
        let epoch = Arc::new(CommitteeEpoch::byzantine(1, registered).unwrap());
        Committee {
            trust,
            members,
            epoch,
        }
    }

    fn coordinator(c: &Committee, timeout_ms: u64) -> EndorsementCoordinator {
        let clients = c
            .members
            .iter()
            .map(|m| m.clone() as Arc<dyn CommitteeMemberClient>)
            .collect();
        EndorsementCoordinator::new(
            CoordinatorConfig {
                member_timeout_ms: timeout_ms,
            },
            clients,
            c.trust.clone(),
            Arc::new(ManualClock::new(1_000)),
        )
    }

    fn message() -> CrossChainMessage {
        CrossChainMessage::new(
            MessageKey::new(ChainId::new("eth").unwrap(), 1),
            ChainId::new("bsc").unwrap(),
            b"transfer 10".to_vec(),
            None,
            0,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_three_of_four_with_timeout() {
        let c = committee(vec![
            ClaimPolicy::Endorse,
            ClaimPolicy::Endorse,
            ClaimPolicy::Silent,
            ClaimPolicy::Endorse,
        ]);
        let proof = coordinator(&c, 500)
            .request_endorsement(&message(), c.epoch.clone())
            .await
            .unwrap();

        assert!(proof.threshold_met());
        let ids: Vec<_> = proof.member_ids().map(|m| m.as_str()).collect();
        assert_eq!(ids, vec!["m0", "m1", "m3"]);
        assert!(proof
            .verify(&c.epoch, c.trust.as_ref(), 1_000)
            .is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreachable_fails_fast() {
        let c = committee(vec![
            ClaimPolicy::Reject,
            ClaimPolicy::Reject,
            ClaimPolicy::Silent,
            ClaimPolicy::Endorse,
        ]);
        // The endorsing member answers long after the timeout of m2.
        let slow = Arc::new(
            LocalCommitteeMember::new(
                MemberId::from("m3"),
                shared_crypto::IdentityKeyPair::generate(),
                xc_01_trust_store::CertificateChain::default(),
                ClaimPolicy::Endorse,
            )
            .with_delay(Duration::from_secs(60)),
        );
        let mut coord = coordinator(&c, 100);
        coord.add_client(slow);

        let started = tokio::time::Instant::now();
        let err = coord
            .request_endorsement(&message(), c.epoch.clone())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            EndorsementError::QuorumUnreachable {
                epoch: 1,
                endorsed: 0,
                threshold: 3,
                total: 4,
                ..
            }
        ));
        // Decided without waiting for the slow member.
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_revoked_member_discarded_quorum_still_reached() {
        let c = committee(vec![
            ClaimPolicy::Endorse,
            ClaimPolicy::Endorse,
            ClaimPolicy::Endorse,
            ClaimPolicy::Endorse,
        ]);
        let revoked = c.epoch.member(&MemberId::from("m1")).unwrap().id();
        c.trust.revoke(revoked, 10);

        let proof = coordinator(&c, 500)
            .request_endorsement(&message(), c.epoch.clone())
            .await
            .unwrap();

        let ids: Vec<_> = proof.member_ids().map(|m| m.as_str()).collect();
        assert!(!ids.contains(&"m1"));
        assert_eq!(ids.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_members_silent_is_transient() {
        let c = committee(vec![ClaimPolicy::Silent; 4]);
        let err = coordinator(&c, 100)
            .request_endorsement(&message(), c.epoch.clone())
            .await
            .unwrap_err();
        assert_eq!(err, EndorsementError::CommitteeUnavailable { epoch: 1 });
        assert!(err.is_transient());
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_transport_counts_against_reachability() {
        let c = committee(vec![ClaimPolicy::Endorse; 4]);
        let with_clients = |n: usize| {
            let clients = c.members[..n]
                .iter()
                .map(|m| m.clone() as Arc<dyn CommitteeMemberClient>)
                .collect();
            EndorsementCoordinator::new(
                CoordinatorConfig::default(),
                clients,
                c.trust.clone(),
                Arc::new(ManualClock::new(1_000)),
            )
        };

        let proof = with_clients(3)
            .request_endorsement(&message(), c.epoch.clone())
            .await
            .unwrap();
        assert_eq!(proof.verdicts().len(), 3);

        // Two unreachable members decide the round before anything is sent.
        let err = with_clients(2)
            .request_endorsement(&message(), c.epoch.clone())
            .await
            .unwrap_err();
        assert_eq!(err, EndorsementError::CommitteeUnavailable { epoch: 1 });
        assert_eq!(c.members[0].served(), 1);
    }

    /// Wraps a member and rewrites the epoch it echoes.
    struct StaleEpochMember(Arc<LocalCommitteeMember>);

    #[async_trait]
    impl CommitteeMemberClient for StaleEpochMember {
        fn member_id(&self) -> &MemberId {
            self.0.member_id()
        }

        async fn request_endorsement(
            &self,
            request: &EndorsementRequest,
        ) -> Result<crate::domain::EndorsementVerdict, crate::domain::MemberClientError> {
            let mut verdict = self.0.request_endorsement(request).await?;
            verdict.epoch = request.committee_epoch.saturating_sub(1);
            Ok(verdict)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_epoch_verdicts_discarded() {
        let c = committee(vec![ClaimPolicy::Endorse; 4]);
        let mut coord = coordinator(&c, 500);
        coord.add_client(Arc::new(StaleEpochMember(c.members[0].clone())));
        coord.add_client(Arc::new(StaleEpochMember(c.members[1].clone())));

        let err = coord
            .request_endorsement(&message(), c.epoch.clone())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EndorsementError::QuorumUnreachable { endorsed, .. } if endorsed <= 2
        ));

        // One stale member still leaves a quorum.
        let mut coord = coordinator(&c, 500);
        coord.add_client(Arc::new(StaleEpochMember(c.members[0].clone())));
        let proof = coord
            .request_endorsement(&message(), c.epoch.clone())
            .await
            .unwrap();
        assert!(!proof.member_ids().any(|m| m.as_str() == "m0"));
        assert!(proof.verify(&c.epoch, c.trust.as_ref(), 1_000).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reject_policy_counts_outcomes() {
        let c = committee(vec![
            ClaimPolicy::Endorse,
            ClaimPolicy::Custom(Arc::new(|_| VerdictOutcome::Abstain)),
            ClaimPolicy::Endorse,
            ClaimPolicy::Endorse,
        ]);
        let proof = coordinator(&c, 500)
            .request_endorsement(&message(), c.epoch.clone())
            .await
            .unwrap();
        assert_eq!(proof.verdicts().len(), 3);
    }
}
