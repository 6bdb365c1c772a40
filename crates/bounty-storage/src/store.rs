use async_trait::async_trait;
use bounty_types::{
    ActorId, BountyId, BountyRecord, BountyStatus, PayoutObligation, Submission,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Bounty not found: {0}")]
    NotFound(String),

    #[error("Bounty already exists: {0}")]
    AlreadyExists(String),

    #[error("Precondition failed: expected status {expected}, found {actual}")]
    PreconditionFailed {
        expected: BountyStatus,
        actual: BountyStatus,
    },

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// The change a conditional update applies once the status precondition
/// holds. `claimer` and `submission` are set when `Some`, left untouched
/// when `None`; `status_changed_at` is always bumped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BountyMutation {
    pub status: BountyStatus,
    pub claimer: Option<ActorId>,
    pub submission: Option<Submission>,
}

impl BountyMutation {
    pub fn to(status: BountyStatus) -> Self {
        Self {
            status,
            claimer: None,
            submission: None,
        }
    }

    pub fn with_claimer(mut self, claimer: ActorId) -> Self {
        self.claimer = Some(claimer);
        self
    }

    pub fn with_submission(mut self, submission: Submission) -> Self {
        self.submission = Some(submission);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BountyFilter {
    CreatedBy(ActorId),
    ClaimedBy(ActorId),
    DraftedBy(ActorId),
    AllOpen,
    AllInProgress,
}

impl BountyFilter {
    pub fn matches(&self, record: &BountyRecord) -> bool {
        match self {
            Self::CreatedBy(actor) => {
                record.creator == *actor && record.status != BountyStatus::Deleted
            }
            Self::ClaimedBy(actor) => {
                record.claimer.as_ref() == Some(actor) && record.status != BountyStatus::Deleted
            }
            Self::DraftedBy(actor) => {
                record.creator == *actor && record.status == BountyStatus::Draft
            }
            Self::AllOpen => record.status == BountyStatus::Open,
            Self::AllInProgress => record.status == BountyStatus::InProgress,
        }
    }
}

/// Durable keyed storage for bounty records. The engine owns no persistence;
/// it drives every transition through `conditional_update`, whose
/// compare-and-swap semantics are what serialize concurrent writers without
/// an engine-level lock.
#[async_trait]
pub trait BountyStore: Send + Sync {
    /// Fetch a record by id.
    async fn get(&self, id: &BountyId) -> Result<Option<BountyRecord>>;

    /// Persist a new record; `AlreadyExists` on id conflict.
    async fn insert(&self, record: &BountyRecord) -> Result<()>;

    /// Atomically: verify the record's status equals `expected`, then apply
    /// the mutation and bump `status_changed_at`. On mismatch, fail with
    /// `PreconditionFailed` carrying the actual status and mutate nothing.
    /// Returns the updated record.
    async fn conditional_update(
        &self,
        id: &BountyId,
        expected: BountyStatus,
        mutation: BountyMutation,
    ) -> Result<BountyRecord>;

    /// Snapshot of matching records ordered by `created_at` ascending.
    async fn query(&self, filter: &BountyFilter) -> Result<Vec<BountyRecord>>;

    /// Append a payout obligation to the ledger.
    async fn record_obligation(&self, obligation: PayoutObligation) -> Result<()>;

    /// Obligations owed to the given claimer, oldest first.
    async fn obligations_for(&self, claimer: &ActorId) -> Result<Vec<PayoutObligation>>;
}
