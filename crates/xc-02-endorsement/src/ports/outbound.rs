//! # Outbound Ports
//!
//! Transport to individual committee members.

use crate::domain::{EndorsementRequest, EndorsementVerdict, MemberClientError, MemberId};
use async_trait::async_trait;

/// Committee member client - outbound port.
///
/// Implementations need not enforce timeouts; the coordinator wraps every
/// call in its own per-member deadline.
#[async_trait]
pub trait CommitteeMemberClient: Send + Sync {
    /// Member this client talks to.
    fn member_id(&self) -> &MemberId;

    /// Ask the member for a verdict.
    async fn request_endorsement(
        &self,
        request: &EndorsementRequest,
    ) -> Result<EndorsementVerdict, MemberClientError>;
}
