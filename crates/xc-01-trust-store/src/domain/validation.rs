//! # Chain Validation
//!
//! Pure leaf-to-root walk over one root-set snapshot and one revocation
//! snapshot. No I/O, no locks.

use super::certificate::{CertificateChain, TrustedIdentity};
use super::errors::{TrustError, TrustResult};
use super::revocation::RevocationSet;
use super::root_set::RootSet;
use shared_types::Timestamp;

/// Default maximum chain depth, root included.
pub const MAX_CHAIN_DEPTH: usize = 8;

/// Validate `chain` as of `as_of`.
///
/// ## Checks
///
/// 1. Non-empty, at most `max_depth` certificates
/// 2. Every certificate: intact id, not revoked, inside its validity window
/// 3. Every link: parent may issue, child names parent, parent key signed child
/// 4. Anchor: the top certificate is an active root, or is signed by one
pub fn validate_chain(
    chain: &CertificateChain,
    roots: &RootSet,
    revocations: &RevocationSet,
    as_of: Timestamp,
    max_depth: usize,
) -> TrustResult<TrustedIdentity> {
    let (leaf, top) = match (chain.leaf(), chain.top()) {
        (Some(leaf), Some(top)) => (leaf, top),
        _ => return Err(TrustError::EmptyChain),
    };
    if chain.len() > max_depth {
        return Err(TrustError::ChainTooLong {
            depth: chain.len(),
            max: max_depth,
        });
    }

    // Revocation is checked over the whole chain first so a revoked link
    // reports as revoked even when it is also expired.
    if let Some(revoked) = chain.iter().find(|c| revocations.is_revoked(&c.id())) {
        return Err(TrustError::Revoked(revoked.id()));
    }

    for cert in chain.iter() {
        cert.check_integrity()?;
        cert.check_validity(as_of)?;
    }

    for pair in chain.as_slice().windows(2) {
        let (child, parent) = (&pair[0], &pair[1]);
        if !parent.subject().kind.can_issue() {
            return Err(TrustError::NotAnIssuer(parent.id()));
        }
        if child.issuer() != Some(parent.id()) {
            return Err(TrustError::IssuerMismatch {
                child: child.id(),
                parent: parent.id(),
            });
        }
        child.verify_signed_by(parent.public_key())?;
    }

    let root_id = if let Some(root) = roots.get(&top.id()) {
        // Chain carries the root itself.
        top.verify_signed_by(root.public_key())?;
        root.id()
    } else {
        let issuer_id = top
            .issuer()
            .ok_or(TrustError::UntrustedRoot(top.id()))?;
        let root = roots
            .get(&issuer_id)
            .ok_or(TrustError::UntrustedRoot(top.id()))?;
        if revocations.is_revoked(&root.id()) {
            return Err(TrustError::Revoked(root.id()));
        }
        root.check_validity(as_of)?;
        top.verify_signed_by(root.public_key())?;
        root.id()
    };

    Ok(TrustedIdentity {
        subject: leaf.subject().clone(),
        public_key: *leaf.public_key(),
        certificate_id: leaf.id(),
        root_id,
        root_version: roots.version(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        CertificateAuthority, CertificateChain, RevocationEntry, RootRotation, Subject,
        SubjectKind,
    };

    struct Fixture {
        root: CertificateAuthority,
        roots: RootSet,
    }

    fn fixture() -> Fixture {
        let root = CertificateAuthority::new_root("bcdns", 0, 10_000).unwrap();
        let roots = RootSet::empty()
            .rotate(&RootRotation {
                version: 1,
                roots: vec![root.certificate().clone()],
                issued_at: 0,
            })
            .unwrap();
        Fixture { root, roots }
    }

    fn member(name: &str) -> Subject {
        Subject::new(SubjectKind::CommitteeMember, name)
    }

    #[test]
    fn test_chain_ending_at_root() {
        let f = fixture();
        let (_, chain) = f.root.issue_identity(member("m1"), 0, 5_000).unwrap();

        let identity =
            validate_chain(&chain, &f.roots, &RevocationSet::default(), 100, 8).unwrap();
        assert_eq!(identity.subject.name, "m1");
        assert_eq!(identity.root_id, f.root.certificate().id());
        assert_eq!(identity.root_version, 1);
    }

    #[test]
    fn test_chain_ending_at_child_of_root() {
        let f = fixture();
        let (_, chain) = f.root.issue_identity(member("m1"), 0, 5_000).unwrap();
        let leaf_only = CertificateChain::new(vec![chain.leaf().unwrap().clone()]);

        assert!(validate_chain(&leaf_only, &f.roots, &RevocationSet::default(), 100, 8).is_ok());
    }

    #[test]
    fn test_through_intermediate() {
        let f = fixture();
        let inter = f.root.issue_intermediate("ca", 0, 5_000).unwrap();
        let (_, chain) = inter.issue_identity(member("m2"), 0, 5_000).unwrap();

        assert!(validate_chain(&chain, &f.roots, &RevocationSet::default(), 100, 8).is_ok());
        assert!(matches!(
            validate_chain(&chain, &f.roots, &RevocationSet::default(), 100, 2),
            Err(TrustError::ChainTooLong { depth: 3, max: 2 })
        ));
    }

    #[test]
    fn test_unknown_root_rejected() {
        let f = fixture();
        let rogue = CertificateAuthority::new_root("rogue", 0, 10_000).unwrap();
        let (_, chain) = rogue.issue_identity(member("m1"), 0, 5_000).unwrap();

        assert!(matches!(
            validate_chain(&chain, &f.roots, &RevocationSet::default(), 100, 8),
            Err(TrustError::UntrustedRoot(_))
        ));
    }

    #[test]
    fn test_revoked_intermediate_fails() {
        let f = fixture();
        let inter = f.root.issue_intermediate("ca", 0, 5_000).unwrap();
        let (_, chain) = inter.issue_identity(member("m2"), 0, 5_000).unwrap();
        let revoked = RevocationSet::default().with([RevocationEntry {
            certificate_id: inter.certificate().id(),
            revoked_at: 50,
        }]);

        assert_eq!(
            validate_chain(&chain, &f.roots, &revoked, 100, 8),
            Err(TrustError::Revoked(inter.certificate().id()))
        );
    }

    #[test]
    fn test_expired_leaf_fails() {
        let f = fixture();
        let (_, chain) = f.root.issue_identity(member("m1"), 0, 50).unwrap();

        assert!(matches!(
            validate_chain(&chain, &f.roots, &RevocationSet::default(), 100, 8),
            Err(TrustError::Expired { not_after: 50, .. })
        ));
    }

    #[test]
    fn test_leaf_cannot_issue() {
        let f = fixture();
        let (member_key, member_chain) = f.root.issue_identity(member("m1"), 0, 5_000).unwrap();
        let member_as_ca = CertificateAuthority::root_from_keypair(member_key, "fake", 0, 5_000)
            .unwrap();
        // Hand-build a chain where the member cert sits in issuer position.
        let forged_leaf = member_as_ca
            .issue(member("victim"), member_as_ca.public_key(), 0, 5_000)
            .unwrap();
        let mut certs = vec![forged_leaf];
        certs.extend(member_chain.iter().cloned());

        assert!(matches!(
            validate_chain(
                &CertificateChain::new(certs),
                &f.roots,
                &RevocationSet::default(),
                100,
                8
            ),
            Err(TrustError::NotAnIssuer(_))
        ));
    }

    #[test]
    fn test_empty_chain() {
        let f = fixture();
        assert_eq!(
            validate_chain(
                &CertificateChain::default(),
                &f.roots,
                &RevocationSet::default(),
                0,
                8
            ),
            Err(TrustError::EmptyChain)
        );
    }
}
