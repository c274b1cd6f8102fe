//! # Local Committee Member
//!
//! An endorsing node living in the same process: it holds its keypair and
//! certificate chain and decides each claim through a [`ClaimPolicy`].

use crate::domain::{
    EndorsementRequest, EndorsementVerdict, MemberClientError, MemberId, VerdictOutcome,
};
use crate::ports::CommitteeMemberClient;
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_crypto::IdentityKeyPair;
use shared_types::claim_digest;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use xc_01_trust_store::CertificateChain;

/// Custom decision function.
pub type ClaimCheck = Arc<dyn Fn(&EndorsementRequest) -> VerdictOutcome + Send + Sync>;

/// How a local member answers.
#[derive(Clone)]
pub enum ClaimPolicy {
    /// Endorse every well-formed claim.
    Endorse,
    /// Reject every claim.
    Reject,
    /// Abstain on every claim.
    Abstain,
    /// Never answer.
    Silent,
    /// Fail at the transport level.
    Fail(String),
    /// Decide per request.
    Custom(ClaimCheck),
}

impl fmt::Debug for ClaimPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClaimPolicy::Endorse => f.write_str("Endorse"),
            ClaimPolicy::Reject => f.write_str("Reject"),
            ClaimPolicy::Abstain => f.write_str("Abstain"),
            ClaimPolicy::Silent => f.write_str("Silent"),
            ClaimPolicy::Fail(reason) => write!(f, "Fail({reason})"),
            ClaimPolicy::Custom(_) => f.write_str("Custom"),
        }
    }
}

/// In-process committee member.
pub struct LocalCommitteeMember {
    member_id: MemberId,
    keypair: IdentityKeyPair,
    chain: CertificateChain,
    policy: RwLock<ClaimPolicy>,
    delay: Duration,
    served: AtomicU64,
}

impl LocalCommitteeMember {
    /// Member answering with `policy` and no delay.
    pub fn new(
        member_id: MemberId,
        keypair: IdentityKeyPair,
        chain: CertificateChain,
        policy: ClaimPolicy,
    ) -> Self {
        Self {
            member_id,
            keypair,
            chain,
            policy: RwLock::new(policy),
            delay: Duration::ZERO,
            served: AtomicU64::new(0),
        }
    }

    /// Answer after `delay`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Change the policy for subsequent requests.
    pub fn set_policy(&self, policy: ClaimPolicy) {
        *self.policy.write() = policy;
    }

    /// Number of requests received.
    pub fn served(&self) -> u64 {
        self.served.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CommitteeMemberClient for LocalCommitteeMember {
    fn member_id(&self) -> &MemberId {
        &self.member_id
    }

    async fn request_endorsement(
        &self,
        request: &EndorsementRequest,
    ) -> Result<EndorsementVerdict, MemberClientError> {
        self.served.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let policy = self.policy.read().clone();
        let outcome = match policy {
            ClaimPolicy::Silent => std::future::pending().await,
            ClaimPolicy::Fail(reason) => return Err(MemberClientError::Transport(reason)),
            ClaimPolicy::Endorse => VerdictOutcome::Endorse,
            ClaimPolicy::Reject => VerdictOutcome::Reject,
            ClaimPolicy::Abstain => VerdictOutcome::Abstain,
            ClaimPolicy::Custom(check) => check(request),
        };
        // Never endorse a digest that does not match the claim bytes.
        let outcome = if outcome == VerdictOutcome::Endorse
            && claim_digest(&request.payload) != request.claim_digest
        {
            VerdictOutcome::Reject
        } else {
            outcome
        };
        debug!(
            member = %self.member_id,
            message = %request.message_id,
            correlation = %request.correlation_id,
            "[xc-02] Local member verdict {:?}",
            outcome
        );

        let signature = self
            .keypair
            .sign(&outcome.signing_bytes(&request.claim_digest));

        Ok(EndorsementVerdict {
            member_id: self.member_id.clone(),
            message_id: request.message_id.clone(),
            claim_digest: request.claim_digest,
            epoch: request.committee_epoch,
            outcome,
            signature: Some(signature),
            certificate_chain: self.chain.clone(),
        })
    }
}
