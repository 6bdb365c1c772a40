use crate::bounty::BountyStatus;
use crate::id::{ActorId, BountyId};
use crate::reward::RewardParseError;
use thiserror::Error;

/// Caller-facing error taxonomy for every lifecycle operation. Guard
/// violations are detected before any write; infrastructure failures from
/// the store are wrapped so callers depend only on this taxonomy.
#[derive(Error, Debug)]
pub enum BountyError {
    #[error("No bounty found with id {0}")]
    NotFound(BountyId),

    #[error("{0}")]
    Validation(String),

    #[error("{actor} is not allowed to {action} this bounty")]
    Unauthorized { actor: ActorId, action: &'static str },

    #[error("Cannot {requested} a bounty in status {from}")]
    InvalidTransition {
        from: BountyStatus,
        requested: &'static str,
    },

    #[error("Bounty {0} has already been claimed")]
    AlreadyClaimed(BountyId),

    /// Fan-out creation failed partway. Copies are independent records, so
    /// the ones already persisted stay; the caller reconciles from this list.
    #[error("Created {} of the requested copies before storage failed: {reason}", .created.len())]
    PartialCreate {
        created: Vec<BountyId>,
        reason: String,
    },

    #[error("Timed out waiting on storage during {operation}")]
    Timeout { operation: &'static str },

    #[error("Storage conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Unexpected(String),
}

impl BountyError {
    /// Infrastructure-level failures the caller may retry. The engine never
    /// retries on its own; a blind retry of Claim is not idempotent.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Conflict(_))
    }

    /// Message safe to show the acting user. Internal errors are reduced to
    /// a generic apology; everything else is user-facing guidance verbatim.
    pub fn actor_message(&self) -> String {
        match self {
            Self::Unexpected(_) => {
                "Sorry, something is not working and our devs are looking into it.".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<RewardParseError> for BountyError {
    fn from(e: RewardParseError) -> Self {
        Self::Validation(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BountyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(BountyError::Timeout { operation: "claim" }.is_retryable());
        assert!(BountyError::Conflict("lost arbitration".into()).is_retryable());
        assert!(!BountyError::Validation("bad reward".into()).is_retryable());
        assert!(!BountyError::AlreadyClaimed(BountyId::from_bytes([7; 32])).is_retryable());
    }

    #[test]
    fn unexpected_never_leaks_internals() {
        let err = BountyError::Unexpected("connection pool exhausted at 10.0.0.3".into());
        assert!(!err.actor_message().contains("10.0.0.3"));
    }

    #[test]
    fn reward_parse_error_becomes_validation() {
        let err: BountyError = RewardParseError::Empty.into();
        assert!(matches!(err, BountyError::Validation(_)));
    }
}
