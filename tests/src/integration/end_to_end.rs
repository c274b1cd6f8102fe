//! # End-to-End Relay Flows
//!
//! Source event → committee endorsement → destination delivery, with the
//! real trust store, coordinator, tracker and pipeline wired by `DevNet`.
//!
//! ## Flows Tested
//!
//! 1. Happy path: proof verifies against the epoch and trust store
//! 2. Revoked member certificate: verdict discarded, quorum still reached
//! 3. BCDNS root rotation: old-root verdicts discarded, quorum unreachable
//! 4. Committee fixed and epoch rotated: failed message reinjected and delivered
//! 5. Crash mid-submission: restart recovers from the shared store

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use relayer_runtime::{DevNet, RelayerConfig};
    use shared_types::{ChainId, ManualClock, MessageKey, TimeSource};
    use xc_01_trust_store::{CertificateAuthority, TrustStoreApi};
    use xc_02_endorsement::{
        ClaimPolicy, CommitteeEpoch, CommitteeMemberClient, EndorsementCoordinator, MemberId,
    };
    use xc_03_message_tracker::{
        FailureReason, InMemoryKVStore, MessageTracker, RelayState, RetryPolicy,
    };
    use xc_04_relay_pipeline::{ChainAdapterRegistry, RelayPipeline, RelayPipelineApi};

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    fn eth() -> ChainId {
        ChainId::new("eth").unwrap()
    }

    fn bsc() -> ChainId {
        ChainId::new("bsc").unwrap()
    }

    async fn devnet(config: RelayerConfig) -> (DevNet, ManualClock) {
        let clock = ManualClock::new(1_000);
        let net = DevNet::build(&config, Arc::new(clock.clone())).await.unwrap();
        (net, clock)
    }

    async fn run_cycles(net: &DevNet, n: usize) {
        for _ in 0..n {
            net.pipeline.run_cycle().await.unwrap();
        }
    }

    fn state(net: &DevNet, seq: u64) -> RelayState {
        net.tracker
            .get(&MessageKey::new(eth(), seq))
            .unwrap()
            .unwrap()
            .state()
            .clone()
    }

    // =========================================================================
    // FLOWS
    // =========================================================================

    #[tokio::test]
    async fn test_event_relayed_with_verifiable_proof() {
        let (net, clock) = devnet(RelayerConfig::default()).await;
        net.chain(&eth())
            .unwrap()
            .emit(bsc(), b"transfer 10 to alice".to_vec(), None);

        run_cycles(&net, 2).await;

        let record = net
            .tracker
            .get(&MessageKey::new(eth(), 1))
            .unwrap()
            .unwrap();
        assert_eq!(record.state(), &RelayState::Confirmed);
        assert_eq!(record.accepted_verdicts().len(), 3);
        assert_eq!(net.chain(&bsc()).unwrap().delivered().len(), 1);

        let proof = record.proof().unwrap();
        assert!(proof.threshold_met());
        let epoch = net.epochs.current();
        proof
            .verify(&epoch, net.trust.as_ref(), clock.now_ms())
            .unwrap();
    }

    #[tokio::test]
    async fn test_revoked_member_discarded_quorum_still_reached() {
        let (net, _clock) = devnet(RelayerConfig::default()).await;
        let epoch = net.epochs.current();
        let revoked: MemberId = net.members[0].member_id().clone();
        let certificate = epoch.member(&revoked).unwrap().id();

        net.bcdns.revoke(certificate, 500);
        net.trust.sync_from(net.bcdns.as_ref()).await.unwrap();

        net.chain(&eth()).unwrap().emit(bsc(), b"claim".to_vec(), None);
        run_cycles(&net, 2).await;

        let record = net
            .tracker
            .get(&MessageKey::new(eth(), 1))
            .unwrap()
            .unwrap();
        assert_eq!(record.state(), &RelayState::Confirmed);
        assert!(!record.accepted_verdicts().contains(&revoked));
        assert_eq!(record.accepted_verdicts().len(), 3);
    }

    #[tokio::test]
    async fn test_root_rotation_invalidates_old_committee() {
        let (net, _clock) = devnet(RelayerConfig::default()).await;

        let successor = CertificateAuthority::new_root("bcdns-root-2", 0, u64::MAX).unwrap();
        net.bcdns.rotate(successor, 2_000);
        assert_eq!(net.trust.sync_from(net.bcdns.as_ref()).await.unwrap(), 2);
        assert_eq!(net.trust.roots().version(), 2);

        net.chain(&eth()).unwrap().emit(bsc(), b"claim".to_vec(), None);
        run_cycles(&net, 1).await;

        assert_eq!(
            state(&net, 1),
            RelayState::Failed(FailureReason::QuorumUnreachable { epoch: 1 })
        );
        assert!(net.chain(&bsc()).unwrap().attempts().is_empty());
    }

    #[tokio::test]
    async fn test_failed_message_reinjected_after_epoch_rotation() {
        let mut config = RelayerConfig::default();
        config.pipeline.reinject_on_epoch_change = true;
        let (net, _clock) = devnet(config).await;

        net.members[0].set_policy(ClaimPolicy::Reject);
        net.members[1].set_policy(ClaimPolicy::Reject);
        net.chain(&eth()).unwrap().emit(bsc(), b"claim".to_vec(), None);

        let report = net.pipeline.run_cycle().await.unwrap();
        assert_eq!(report.newly_failed, 1);
        assert_eq!(
            state(&net, 1),
            RelayState::Failed(FailureReason::QuorumUnreachable { epoch: 1 })
        );

        // Members recover; the committee moves to a new epoch.
        net.members[0].set_policy(ClaimPolicy::Endorse);
        net.members[1].set_policy(ClaimPolicy::Endorse);
        let current = net.epochs.current();
        let members = current
            .member_ids()
            .map(|id| (id.clone(), current.member(id).unwrap().clone()))
            .collect();
        net.epochs
            .rotate(CommitteeEpoch::byzantine(2, members).unwrap())
            .unwrap();

        let report = net.pipeline.run_cycle().await.unwrap();
        assert_eq!(report.reinjected, 1);
        run_cycles(&net, 1).await;

        let key = MessageKey::new(eth(), 1);
        let record = net.tracker.get(&key).unwrap().unwrap();
        assert_eq!(record.state(), &RelayState::Confirmed);
        assert_eq!(record.generation(), 1);
        assert_eq!(record.epoch_used(), Some(2));
        assert_eq!(net.tracker.archived(&key).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_restart_recovers_in_flight_messages() {
        let (net, clock) = devnet(RelayerConfig::default()).await;
        let store = Arc::new(InMemoryKVStore::new());

        let mut registry = ChainAdapterRegistry::new();
        for (id, chain) in &net.chains {
            registry.register(id.clone(), chain.clone());
        }
        let registry = Arc::new(registry);
        let clients: Vec<Arc<dyn CommitteeMemberClient>> = net
            .members
            .iter()
            .map(|m| m.clone() as Arc<dyn CommitteeMemberClient>)
            .collect();
        let coordinator = Arc::new(EndorsementCoordinator::new(
            Default::default(),
            clients,
            net.trust.clone(),
            Arc::new(clock.clone()),
        ));

        let boot = || {
            let tracker = Arc::new(
                MessageTracker::open(
                    store.clone(),
                    Arc::new(clock.clone()),
                    RetryPolicy::default(),
                )
                .unwrap(),
            );
            let pipeline = RelayPipeline::new(
                RelayerConfig::default().pipeline,
                tracker.clone(),
                coordinator.clone(),
                net.epochs.clone(),
                registry.clone(),
                Arc::new(clock.clone()),
            );
            (tracker, pipeline)
        };

        let source = net.chain(&eth()).unwrap();
        for i in 0..3 {
            source.emit(bsc(), format!("claim-{i}").into_bytes(), None);
        }

        let (tracker, pipeline) = boot();
        let report = pipeline.run_cycle().await.unwrap();
        assert_eq!(report.endorsed, 3);
        // Crash right after the first submission was recorded as started.
        tracker
            .begin_submission(&MessageKey::new(eth(), 1))
            .unwrap();
        drop(pipeline);
        drop(tracker);

        // Opening the tracker rebuilds its indexes; the report repeats the scan.
        let (tracker, pipeline) = boot();
        let recovered = tracker.recover().unwrap();
        assert_eq!(recovered.live, 3);
        assert_eq!(recovered.submitting, 1);

        let report = pipeline.run_cycle().await.unwrap();
        assert_eq!(report.ingested, 0);
        assert_eq!(report.confirmed, 3);
        assert_eq!(net.chain(&bsc()).unwrap().delivered().len(), 3);
    }
}
