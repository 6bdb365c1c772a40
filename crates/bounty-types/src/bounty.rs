use crate::id::{ActorId, BountyId, CopyGroupId};
use crate::reward::RewardAmount;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BountyStatus {
    Draft,
    Open,
    InProgress,
    InReview,
    Completed,
    Deleted,
}

impl BountyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::Open => "Open",
            Self::InProgress => "InProgress",
            Self::InReview => "InReview",
            Self::Completed => "Completed",
            Self::Deleted => "Deleted",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Deleted)
    }

    /// A claim is held in these statuses; `claimer` must be set.
    pub fn requires_claimer(&self) -> bool {
        matches!(self, Self::InProgress | Self::InReview | Self::Completed)
    }

    /// Work has been handed in for these statuses; `submission` must be set.
    pub fn carries_submission(&self) -> bool {
        matches!(self, Self::InReview | Self::Completed)
    }
}

impl fmt::Display for BountyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Work handed in by the claimer when a bounty moves into review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub url: Option<String>,
    pub notes: Option<String>,
}

/// The persisted bounty entity. Mutated exclusively through the lifecycle
/// engine's transition operations; never hard-deleted (`Deleted` is a
/// terminal status, not row removal).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BountyRecord {
    pub id: BountyId,
    pub title: String,
    pub summary: String,
    pub criteria: String,
    pub reward: RewardAmount,
    pub status: BountyStatus,
    pub creator: ActorId,
    pub claimer: Option<ActorId>,
    pub submission: Option<Submission>,
    pub created_at: DateTime<Utc>,
    pub status_changed_at: DateTime<Utc>,
    pub copy_group: Option<CopyGroupId>,
}

impl BountyRecord {
    pub fn draft(
        creator: ActorId,
        title: impl Into<String>,
        summary: impl Into<String>,
        criteria: impl Into<String>,
        reward: RewardAmount,
        copy_group: Option<CopyGroupId>,
        copy_index: u32,
    ) -> Self {
        let title = title.into();
        let now = Utc::now();
        Self {
            id: BountyId::fresh(&creator, &title, copy_index),
            title,
            summary: summary.into(),
            criteria: criteria.into(),
            reward,
            status: BountyStatus::Draft,
            creator,
            claimer: None,
            submission: None,
            created_at: now,
            status_changed_at: now,
            copy_group,
        }
    }

    /// Structural invariants: claimer set iff the status holds a claim,
    /// submission set iff work has been handed in.
    pub fn invariants_hold(&self) -> bool {
        self.claimer.is_some() == self.status.requires_claimer()
            && self.submission.is_some() == self.status.carries_submission()
    }
}

/// Recorded when a bounty completes: the obligation to pay the claimer.
/// This is a ledger entry, not a transfer; payment execution lives elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoutObligation {
    pub bounty_id: BountyId,
    pub creator: ActorId,
    pub claimer: ActorId,
    pub reward: RewardAmount,
    pub recorded_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reward() -> RewardAmount {
        RewardAmount::parse("100", "BANK").unwrap()
    }

    #[test]
    fn draft_starts_clean() {
        let record = BountyRecord::draft(
            ActorId::from("creator"),
            "Write a guide",
            "",
            "",
            reward(),
            None,
            0,
        );
        assert_eq!(record.status, BountyStatus::Draft);
        assert!(record.claimer.is_none());
        assert!(record.submission.is_none());
        assert_eq!(record.created_at, record.status_changed_at);
        assert!(record.invariants_hold());
    }

    #[test]
    fn terminal_statuses() {
        assert!(BountyStatus::Completed.is_terminal());
        assert!(BountyStatus::Deleted.is_terminal());
        assert!(!BountyStatus::Open.is_terminal());
        assert!(!BountyStatus::InReview.is_terminal());
    }

    #[test]
    fn invariants_reject_claimless_progress() {
        let mut record = BountyRecord::draft(
            ActorId::from("creator"),
            "Title",
            "s",
            "c",
            reward(),
            None,
            0,
        );
        record.status = BountyStatus::InProgress;
        assert!(!record.invariants_hold());

        record.claimer = Some(ActorId::from("worker"));
        assert!(record.invariants_hold());
    }

    #[test]
    fn invariants_reject_submission_outside_review() {
        let mut record = BountyRecord::draft(
            ActorId::from("creator"),
            "Title",
            "s",
            "c",
            reward(),
            None,
            0,
        );
        record.submission = Some(Submission {
            url: None,
            notes: None,
        });
        assert!(!record.invariants_hold());

        record.status = BountyStatus::InReview;
        record.claimer = Some(ActorId::from("worker"));
        assert!(record.invariants_hold());
    }
}
