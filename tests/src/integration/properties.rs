//! # Relay Properties
//!
//! Guarantees that must hold under concurrency and adversarial committees:
//!
//! | Property | Test |
//! |----------|------|
//! | Confirmed is absorbing | `test_confirmed_is_absorbing_under_concurrent_events` |
//! | One record per message id | `test_concurrent_reingestion_keeps_one_record` |
//! | Proof iff ≥ t valid endorsements | `test_proof_iff_threshold_endorsements` |
//! | Per-pair hint order | `test_per_pair_delivery_order_is_non_decreasing` |
//! | Silent minority tolerated | `test_silent_member_does_not_block_quorum` |
//! | Fail-fast on unreachable quorum | `test_unreachable_quorum_fails_without_waiting` |

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;
    use relayer_runtime::{DevNet, RelayerConfig};
    use shared_types::{ChainId, CrossChainMessage, ManualClock, MessageKey, TimeSource};
    use xc_02_endorsement::{ClaimPolicy, CommitteeMemberClient};
    use xc_03_message_tracker::{
        FailureReason, IngestOutcome, RelayEvent, RelayState, TrackerError,
    };
    use xc_04_relay_pipeline::RelayPipelineApi;

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    fn chain(id: &str) -> ChainId {
        ChainId::new(id).unwrap()
    }

    async fn devnet(config: RelayerConfig) -> (DevNet, ManualClock) {
        let clock = ManualClock::new(1_000);
        let net = DevNet::build(&config, Arc::new(clock.clone())).await.unwrap();
        (net, clock)
    }

    async fn run_until_settled(net: &DevNet, max_cycles: usize) {
        for _ in 0..max_cycles {
            net.pipeline.run_cycle().await.unwrap();
            let records = net.tracker.all_records().unwrap();
            if !records.is_empty() && records.iter().all(|r| r.state().is_terminal()) {
                return;
            }
        }
        panic!("relay did not settle within {max_cycles} cycles");
    }

    // =========================================================================
    // STATE MACHINE
    // =========================================================================

    #[tokio::test]
    async fn test_confirmed_is_absorbing_under_concurrent_events() {
        let (net, _clock) = devnet(RelayerConfig::default()).await;
        net.chain(&chain("eth"))
            .unwrap()
            .emit(chain("bsc"), b"claim".to_vec(), None);
        run_until_settled(&net, 4).await;

        let key = MessageKey::new(chain("eth"), 1);
        let before = net.tracker.get(&key).unwrap().unwrap();
        assert_eq!(before.state(), &RelayState::Confirmed);

        let events = [
            RelayEvent::EndorsementRequested { epoch: 1 },
            RelayEvent::QuorumUnreachable { epoch: 1 },
            RelayEvent::SubmissionStarted,
            RelayEvent::DestinationAccepted,
            RelayEvent::DestinationRejected {
                reason: "late".into(),
            },
            RelayEvent::SubmissionRetry {
                reason: "late".into(),
            },
            RelayEvent::RetriesExhausted,
        ];

        std::thread::scope(|s| {
            for worker in 0..16 {
                let tracker = &net.tracker;
                let key = &key;
                let events = &events;
                s.spawn(move || {
                    for event in events.iter().cycle().skip(worker).take(events.len()) {
                        let result = tracker.transition(key, event.clone());
                        assert!(matches!(
                            result,
                            Err(TrackerError::InvalidTransition { .. })
                        ));
                    }
                });
            }
        });

        let after = net.tracker.get(&key).unwrap().unwrap();
        assert_eq!(after.state(), &RelayState::Confirmed);
        assert_eq!(after.version(), before.version());
    }

    #[test]
    fn test_concurrent_reingestion_keeps_one_record() {
        let store = Arc::new(xc_03_message_tracker::InMemoryKVStore::new());
        let tracker = xc_03_message_tracker::MessageTracker::open(
            store,
            Arc::new(ManualClock::new(0)),
            Default::default(),
        )
        .unwrap();
        let message = CrossChainMessage::new(
            MessageKey::new(chain("eth"), 9),
            chain("bsc"),
            b"claim".to_vec(),
            Some(1),
            0,
        );

        let inserted = std::thread::scope(|s| {
            let handles: Vec<_> = (0..32)
                .map(|_| {
                    let tracker = &tracker;
                    let message = message.clone();
                    s.spawn(move || tracker.ingest(message).unwrap())
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(|outcome| *outcome == IngestOutcome::Inserted)
                .count()
        });

        assert_eq!(inserted, 1);
        assert_eq!(tracker.all_records().unwrap().len(), 1);
    }

    // =========================================================================
    // QUORUM
    // =========================================================================

    #[tokio::test]
    async fn test_proof_iff_threshold_endorsements() {
        for endorsers in 0..=4usize {
            let (net, clock) = devnet(RelayerConfig::default()).await;
            for (i, member) in net.members.iter().enumerate() {
                let policy = if i < endorsers {
                    ClaimPolicy::Endorse
                } else {
                    ClaimPolicy::Reject
                };
                member.set_policy(policy);
            }
            net.chain(&chain("eth"))
                .unwrap()
                .emit(chain("bsc"), b"claim".to_vec(), None);
            net.pipeline.run_cycle().await.unwrap();

            let record = net
                .tracker
                .get(&MessageKey::new(chain("eth"), 1))
                .unwrap()
                .unwrap();
            let epoch = net.epochs.current();
            if endorsers >= epoch.quorum_threshold() {
                assert_eq!(record.state(), &RelayState::Endorsed, "k={endorsers}");
                let proof = record.proof().unwrap();
                assert!(proof.member_ids().count() >= epoch.quorum_threshold());
                proof
                    .verify(&epoch, net.trust.as_ref(), clock.now_ms())
                    .unwrap();
            } else {
                assert_eq!(
                    record.state(),
                    &RelayState::Failed(FailureReason::QuorumUnreachable { epoch: 1 }),
                    "k={endorsers}"
                );
                assert!(record.proof().is_none());
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_member_does_not_block_quorum() {
        let (net, _clock) = devnet(RelayerConfig::default()).await;
        net.members[2].set_policy(ClaimPolicy::Silent);
        let silent = net.members[2].member_id().clone();

        net.chain(&chain("eth"))
            .unwrap()
            .emit(chain("bsc"), b"claim".to_vec(), None);
        run_until_settled(&net, 4).await;

        let record = net
            .tracker
            .get(&MessageKey::new(chain("eth"), 1))
            .unwrap()
            .unwrap();
        assert_eq!(record.state(), &RelayState::Confirmed);
        assert!(!record.accepted_verdicts().contains(&silent));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreachable_quorum_fails_without_waiting() {
        let config = RelayerConfig::default();
        let member_timeout = Duration::from_millis(config.coordinator.member_timeout_ms);
        let (net, _clock) = devnet(config).await;
        net.members[0].set_policy(ClaimPolicy::Reject);
        net.members[1].set_policy(ClaimPolicy::Reject);
        net.members[2].set_policy(ClaimPolicy::Silent);
        net.members[3].set_policy(ClaimPolicy::Silent);

        net.chain(&chain("eth"))
            .unwrap()
            .emit(chain("bsc"), b"claim".to_vec(), None);

        let started = tokio::time::Instant::now();
        net.pipeline.run_cycle().await.unwrap();
        assert!(started.elapsed() < member_timeout);

        let record = net
            .tracker
            .get(&MessageKey::new(chain("eth"), 1))
            .unwrap()
            .unwrap();
        assert_eq!(
            record.state(),
            &RelayState::Failed(FailureReason::QuorumUnreachable { epoch: 1 })
        );
    }

    // =========================================================================
    // ORDERING
    // =========================================================================

    #[tokio::test]
    async fn test_per_pair_delivery_order_is_non_decreasing() {
        let mut config = RelayerConfig::default();
        config.chains = vec![chain("eth"), chain("bsc"), chain("sol")];
        let (net, _clock) = devnet(config).await;

        let mut plan: Vec<(ChainId, u64)> = (1..=6)
            .flat_map(|hint| [(chain("bsc"), hint), (chain("sol"), hint)])
            .collect();
        plan.shuffle(&mut StdRng::seed_from_u64(7));

        let source = net.chain(&chain("eth")).unwrap();
        let mut hints = HashMap::new();
        for (dest, hint) in plan {
            let seq = source.emit(dest, format!("claim-{hint}").into_bytes(), Some(hint));
            hints.insert(MessageKey::new(chain("eth"), seq), hint);
        }

        run_until_settled(&net, 30).await;

        for dest in ["bsc", "sol"] {
            let delivered: Vec<u64> = net
                .chain(&chain(dest))
                .unwrap()
                .delivered()
                .iter()
                .map(|key| hints[key])
                .collect();
            assert_eq!(delivered.len(), 6, "{dest}");
            assert!(
                delivered.windows(2).all(|w| w[0] <= w[1]),
                "{dest} delivered out of order: {delivered:?}"
            );
        }
    }
}
