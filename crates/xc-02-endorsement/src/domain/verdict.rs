//! # Endorsement Requests and Verdicts
//!
//! A verdict is accepted only if:
//!
//! 1. It comes from the member it names, and that member is in the epoch
//! 2. It echoes the round's epoch, message id and claim digest
//! 3. Its certificate chain validates to an active root and the leaf key is
//!    the key registered in the epoch
//! 4. The signature verifies over the outcome's signing bytes
//!
//! An endorsement signs exactly the claim digest. Refusals sign the digest
//! behind an outcome tag, so a signed `Reject` or `Abstain` never verifies as
//! an `Endorse`.

use super::epoch::{CommitteeEpoch, MemberId};
use super::errors::VerdictRejection;
use serde::{Deserialize, Serialize};
use shared_crypto::IdentitySignature;
use shared_types::{Hash, MessageKey, Timestamp};
use uuid::Uuid;
use xc_01_trust_store::{CertificateChain, SubjectKind, TrustStoreApi};

/// A member's answer to a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerdictOutcome {
    /// The claim is valid on the source chain.
    Endorse,
    /// The claim is invalid.
    Reject,
    /// The member declines to decide.
    Abstain,
}

impl VerdictOutcome {
    /// Bytes a member signs for this outcome on `claim_digest`.
    pub fn signing_bytes(&self, claim_digest: &Hash) -> Vec<u8> {
        let tag: &[u8] = match self {
            VerdictOutcome::Endorse => return claim_digest.to_vec(),
            VerdictOutcome::Reject => b"xc-verdict/reject/",
            VerdictOutcome::Abstain => b"xc-verdict/abstain/",
        };
        [tag, claim_digest.as_slice()].concat()
    }
}

/// Request sent to every member of the epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndorsementRequest {
    /// Round correlation id, for logs on both sides.
    pub correlation_id: Uuid,
    /// Message being endorsed.
    pub message_id: MessageKey,
    /// `SHA-256(payload)`.
    pub claim_digest: Hash,
    /// Epoch the round is pinned to.
    pub committee_epoch: u64,
    /// Raw claim, so members can check it against the source chain.
    pub payload: Vec<u8>,
}

/// A member's signed answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndorsementVerdict {
    /// Answering member.
    pub member_id: MemberId,
    /// Echo of the request's message id.
    pub message_id: MessageKey,
    /// Echo of the request's claim digest.
    pub claim_digest: Hash,
    /// Echo of the request's epoch.
    pub epoch: u64,
    /// Decision.
    pub outcome: VerdictOutcome,
    /// Signature over `outcome.signing_bytes(claim_digest)`.
    pub signature: Option<IdentitySignature>,
    /// Chain of the signing key, leaf first.
    pub certificate_chain: CertificateChain,
}

/// Check one verdict received from `responder` against the round.
///
/// Returns the outcome to count, or the reason to discard it.
pub fn check_verdict(
    responder: &MemberId,
    verdict: &EndorsementVerdict,
    request: &EndorsementRequest,
    epoch: &CommitteeEpoch,
    trust: &dyn TrustStoreApi,
    as_of: Timestamp,
) -> Result<VerdictOutcome, VerdictRejection> {
    if &verdict.member_id != responder {
        return Err(VerdictRejection::MemberMismatch {
            responder: responder.clone(),
            claimed: verdict.member_id.clone(),
        });
    }
    let registered = epoch
        .member(responder)
        .ok_or_else(|| VerdictRejection::NotInEpoch(responder.clone()))?;
    if verdict.epoch != request.committee_epoch {
        return Err(VerdictRejection::EpochMismatch {
            expected: request.committee_epoch,
            got: verdict.epoch,
        });
    }
    if verdict.message_id != request.message_id || verdict.claim_digest != request.claim_digest {
        return Err(VerdictRejection::ClaimMismatch);
    }
    let signature = verdict
        .signature
        .as_ref()
        .ok_or(VerdictRejection::MissingSignature)?;
    let identity = trust.validate(&verdict.certificate_chain, as_of)?;
    if identity.subject.kind != SubjectKind::CommitteeMember {
        return Err(VerdictRejection::WrongRole);
    }
    if &identity.public_key != registered.public_key() {
        return Err(VerdictRejection::KeyMismatch);
    }
    identity
        .public_key
        .verify(&verdict.outcome.signing_bytes(&request.claim_digest), signature)
        .map_err(|_| VerdictRejection::BadSignature)?;

    Ok(verdict.outcome)
}
