//! # Dev-Net Wiring
//!
//! Builds a complete relayer over in-process collaborators:
//!
//! 1. A BCDNS root and the trust store synced from it
//! 2. A local committee whose members obtain certificates via CSRs
//! 3. One in-memory chain per configured chain id
//! 4. The tracker over the configured storage backend
//! 5. The endorsement coordinator and relay pipeline on top

use crate::config::{RelayerConfig, StorageBackend, StorageConfig};
use anyhow::{Context, Result};
use shared_crypto::IdentityKeyPair;
use shared_types::{ChainId, TimeSource};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;
use xc_01_trust_store::{
    BcdnsClient, CertificateAuthority, CertificateSigningRequest, IdentityCertificate,
    InMemoryBcdns, Subject, SubjectKind, TrustStore,
};
use xc_02_endorsement::{
    ClaimPolicy, CommitteeEpoch, CommitteeMemberClient, EndorsementCoordinator, EpochRegistry,
    LocalCommitteeMember, MemberId,
};
use xc_03_message_tracker::{InMemoryKVStore, KeyValueStore, MessageTracker};
use xc_04_relay_pipeline::{ChainAdapterRegistry, InMemoryChain, RelayPipeline};

/// A fully wired in-process relayer.
pub struct DevNet {
    /// Certificate authority service.
    pub bcdns: Arc<InMemoryBcdns>,
    /// Trust store synced from `bcdns`.
    pub trust: Arc<TrustStore>,
    /// Committee epochs.
    pub epochs: Arc<EpochRegistry>,
    /// Committee members, in member-id order.
    pub members: Vec<Arc<LocalCommitteeMember>>,
    /// Chains by id.
    pub chains: BTreeMap<ChainId, Arc<InMemoryChain>>,
    /// Message tracker.
    pub tracker: Arc<MessageTracker>,
    /// Relay pipeline.
    pub pipeline: Arc<RelayPipeline>,
}

impl DevNet {
    /// Wire every subsystem from `config`.
    pub async fn build(config: &RelayerConfig, clock: Arc<dyn TimeSource>) -> Result<Self> {
        let root = CertificateAuthority::new_root("bcdns-root", 0, u64::MAX)
            .context("Failed to create BCDNS root")?;
        let bcdns = Arc::new(InMemoryBcdns::new(root));

        let trust = Arc::new(TrustStore::new(config.trust.clone()));
        let version = trust
            .sync_from(bcdns.as_ref())
            .await
            .context("Initial BCDNS sync failed")?;
        info!("[xc-01] Trust store at root version {}", version);

        let (members, certificates) = enroll_committee(&bcdns, config.committee.size).await?;
        let epoch = match config.committee.threshold {
            Some(t) => CommitteeEpoch::new(config.committee.epoch_id, certificates, t),
            None => CommitteeEpoch::byzantine(config.committee.epoch_id, certificates),
        }
        .context("Invalid committee")?;
        info!(
            "[xc-02] Committee epoch {}: {} members, threshold {}",
            epoch.epoch_id(),
            epoch.len(),
            epoch.quorum_threshold()
        );
        let epochs = Arc::new(EpochRegistry::new(epoch));

        let clients: Vec<Arc<dyn CommitteeMemberClient>> = members
            .iter()
            .map(|m| m.clone() as Arc<dyn CommitteeMemberClient>)
            .collect();
        let coordinator = EndorsementCoordinator::new(
            config.coordinator.clone(),
            clients,
            trust.clone(),
            clock.clone(),
        );

        let mut registry = ChainAdapterRegistry::new();
        let mut chains = BTreeMap::new();
        for id in &config.chains {
            let chain = Arc::new(InMemoryChain::new(id.clone()));
            registry.register(id.clone(), chain.clone());
            chains.insert(id.clone(), chain);
        }

        let store = open_store(&config.storage)?;
        let tracker = Arc::new(
            MessageTracker::open(store, clock.clone(), config.retry.clone())
                .context("opening message tracker")?,
        );

        let pipeline = Arc::new(RelayPipeline::new(
            config.pipeline.clone(),
            tracker.clone(),
            Arc::new(coordinator),
            epochs.clone(),
            Arc::new(registry),
            clock,
        ));

        Ok(Self {
            bcdns,
            trust,
            epochs,
            members,
            chains,
            tracker,
            pipeline,
        })
    }

    /// In-memory chain for `id`.
    pub fn chain(&self, id: &ChainId) -> Option<&Arc<InMemoryChain>> {
        self.chains.get(id)
    }
}

/// Generate member keys and certify each through the BCDNS CSR flow.
async fn enroll_committee(
    bcdns: &InMemoryBcdns,
    size: usize,
) -> Result<(
    Vec<Arc<LocalCommitteeMember>>,
    BTreeMap<MemberId, IdentityCertificate>,
)> {
    let authority = bcdns.authority();
    let mut members = Vec::with_capacity(size);
    let mut certificates = BTreeMap::new();

    for i in 0..size {
        let name = format!("member-{i:02}");
        let keypair = IdentityKeyPair::generate();
        let csr = CertificateSigningRequest::new(
            Subject::new(SubjectKind::CommitteeMember, &name),
            &keypair,
            0,
            u64::MAX,
        )?;
        let leaf = bcdns
            .apply_certificate(csr)
            .await
            .with_context(|| format!("BCDNS refused certificate for {name}"))?;

        let id = MemberId::new(name);
        certificates.insert(id.clone(), leaf.clone());
        members.push(Arc::new(LocalCommitteeMember::new(
            id,
            keypair,
            authority.chain_for(leaf),
            ClaimPolicy::Endorse,
        )));
    }
    Ok((members, certificates))
}

fn open_store(storage: &StorageConfig) -> Result<Arc<dyn KeyValueStore>> {
    match storage.backend {
        StorageBackend::Memory => Ok(Arc::new(InMemoryKVStore::new())),
        #[cfg(feature = "rocksdb")]
        StorageBackend::Rocksdb => {
            use xc_03_message_tracker::{RocksDbConfig, RocksDbStore};
            let config = RocksDbConfig {
                path: storage.data_dir.join("tracker"),
                ..RocksDbConfig::default()
            };
            info!("[xc-03] Opening RocksDB at {:?}", config.path);
            let store = RocksDbStore::open(config).context("Failed to open tracker store")?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "rocksdb"))]
        StorageBackend::Rocksdb => {
            anyhow::bail!("storage.backend = \"rocksdb\" requires the `rocksdb` feature")
        }
    }
}
