use crate::events::BountyEvent;
use crate::notify::NotificationSink;
use crate::policy::AuthorizationPolicy;
use bounty_storage::{BountyFilter, BountyMutation, BountyStore, StoreError};
use bounty_types::{
    ActorId, BountyError, BountyId, BountyRecord, BountyStatus, CopyGroupId, PayoutObligation,
    Result, RewardAmount, Submission,
};
use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Upper bound on copies per fan-out request.
    pub max_copies: u32,
    /// Deadline applied to each store call; `None` waits indefinitely.
    pub store_timeout: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_copies: 100,
            store_timeout: Some(Duration::from_secs(5)),
        }
    }
}

/// Parameters for drafting a bounty. Summary and criteria may still be
/// empty here; publishing validates they were filled in.
#[derive(Debug, Clone)]
pub struct CreateDraft {
    pub title: String,
    pub summary: String,
    pub criteria: String,
    /// Combined amount and currency symbol as the actor typed it, e.g. `"100 BANK"`.
    pub reward: String,
    /// Absent or zero means one copy.
    pub copies: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    CreatedByMe,
    ClaimedByMe,
    DraftedByMe,
    AllOpen,
    AllInProgress,
}

impl ListScope {
    fn into_filter(self, actor: &ActorId) -> BountyFilter {
        match self {
            Self::CreatedByMe => BountyFilter::CreatedBy(actor.clone()),
            Self::ClaimedByMe => BountyFilter::ClaimedBy(actor.clone()),
            Self::DraftedByMe => BountyFilter::DraftedBy(actor.clone()),
            Self::AllOpen => BountyFilter::AllOpen,
            Self::AllInProgress => BountyFilter::AllInProgress,
        }
    }
}

/// Enforces the bounty state machine over an injected store.
///
/// Every transition is a single conditional update keyed on the expected
/// source status, so concurrent writers are serialized by the store's
/// arbitration and the engine needs no lock of its own. Guards are checked
/// before any write; notifications and the payout ledger entry are
/// post-commit side effects that never unwind a committed transition.
pub struct LifecycleEngine {
    store: Arc<dyn BountyStore>,
    notifier: Arc<dyn NotificationSink>,
    policy: Arc<dyn AuthorizationPolicy>,
    config: EngineConfig,
}

impl LifecycleEngine {
    pub fn new(
        store: Arc<dyn BountyStore>,
        notifier: Arc<dyn NotificationSink>,
        policy: Arc<dyn AuthorizationPolicy>,
    ) -> Self {
        Self {
            store,
            notifier,
            policy,
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Draft one or more copies of a new bounty.
    ///
    /// Copies are independent records sharing one copy group; they are
    /// persisted individually, and a failure partway reports the ids
    /// already created instead of rolling them back.
    pub async fn create_draft(
        &self,
        actor: &ActorId,
        params: CreateDraft,
    ) -> Result<Vec<BountyRecord>> {
        let title = params.title.trim().to_string();
        if title.is_empty() {
            return Err(BountyError::Validation("A bounty needs a title".into()));
        }
        let reward = RewardAmount::parse_with_symbol(&params.reward)?;

        let copies = params.copies.filter(|n| *n >= 1).unwrap_or(1);
        if copies > self.config.max_copies {
            return Err(BountyError::Validation(format!(
                "At most {} copies can be created per request",
                self.config.max_copies
            )));
        }
        if copies > 1 && !self.may_fan_out(actor).await? {
            return Err(BountyError::Unauthorized {
                actor: actor.clone(),
                action: "create multiple copies of",
            });
        }

        let copy_group = (copies > 1).then(CopyGroupId::fresh);
        let mut created: Vec<BountyRecord> = Vec::with_capacity(copies as usize);
        for index in 0..copies {
            let record = BountyRecord::draft(
                actor.clone(),
                title.clone(),
                params.summary.clone(),
                params.criteria.clone(),
                reward.clone(),
                copy_group,
                index,
            );
            let result = match self.store_call("create", self.store.insert(&record)).await {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(store_failure("create", e)),
                Err(timed_out) => Err(timed_out),
            };
            match result {
                Ok(()) => created.push(record),
                Err(e) if created.is_empty() => return Err(e),
                Err(e) => {
                    return Err(BountyError::PartialCreate {
                        created: created.iter().map(|r| r.id).collect(),
                        reason: e.to_string(),
                    })
                }
            }
        }

        info!(
            creator = %actor,
            copies = copies,
            reward = %reward,
            title = %title,
            "📝 Bounty drafted"
        );
        for record in &created {
            self.notify_quietly(&record.creator, &BountyEvent::drafted(record))
                .await;
        }
        Ok(created)
    }

    /// Take a draft live. Only the creator may publish, and only once the
    /// summary and acceptance criteria have been filled in.
    pub async fn publish(&self, actor: &ActorId, id: &BountyId) -> Result<BountyRecord> {
        let record = self.load("publish", id).await?;
        if record.status != BountyStatus::Draft {
            return Err(BountyError::InvalidTransition {
                from: record.status,
                requested: "publish",
            });
        }
        if record.creator != *actor {
            return Err(BountyError::Unauthorized {
                actor: actor.clone(),
                action: "publish",
            });
        }
        if record.summary.trim().is_empty() || record.criteria.trim().is_empty() {
            return Err(BountyError::Validation(
                "A bounty needs a summary and acceptance criteria before it can be published"
                    .into(),
            ));
        }

        let updated = match self
            .store_call(
                "publish",
                self.store.conditional_update(
                    id,
                    BountyStatus::Draft,
                    BountyMutation::to(BountyStatus::Open),
                ),
            )
            .await?
        {
            Ok(updated) => updated,
            Err(StoreError::PreconditionFailed { actual, .. }) => {
                return Err(BountyError::InvalidTransition {
                    from: actual,
                    requested: "publish",
                })
            }
            Err(StoreError::NotFound(_)) => return Err(BountyError::NotFound(*id)),
            Err(e) => return Err(store_failure("publish", e)),
        };

        info!(bounty_id = %id, creator = %actor, "📢 Bounty published");
        self.notify_quietly(&updated.creator, &BountyEvent::published(&updated))
            .await;
        Ok(updated)
    }

    /// Take exclusive claim on an open bounty.
    ///
    /// The claim is one conditional update: set `InProgress` and the claimer
    /// where the status is still `Open`. When two actors race, exactly one
    /// update observes `Open`; the loser gets `AlreadyClaimed`, never a
    /// silently overwritten claim.
    pub async fn claim(&self, actor: &ActorId, id: &BountyId) -> Result<BountyRecord> {
        let record = self.load("claim", id).await?;
        if record.status != BountyStatus::Open {
            return Err(claim_refusal(id, record.status));
        }
        if record.creator == *actor {
            return Err(BountyError::Unauthorized {
                actor: actor.clone(),
                action: "claim",
            });
        }

        let mutation =
            BountyMutation::to(BountyStatus::InProgress).with_claimer(actor.clone());
        let updated = match self
            .store_call(
                "claim",
                self.store.conditional_update(id, BountyStatus::Open, mutation),
            )
            .await?
        {
            Ok(updated) => updated,
            Err(StoreError::PreconditionFailed { actual, .. }) => {
                return Err(claim_refusal(id, actual))
            }
            Err(StoreError::NotFound(_)) => return Err(BountyError::NotFound(*id)),
            Err(e) => return Err(store_failure("claim", e)),
        };

        info!(bounty_id = %id, claimer = %actor, "🔒 Bounty claimed");
        self.notify_quietly(&updated.creator, &BountyEvent::claimed(&updated, actor))
            .await;
        Ok(updated)
    }

    /// Hand in work for review. Only the current claimer may submit.
    pub async fn submit(
        &self,
        actor: &ActorId,
        id: &BountyId,
        url: Option<String>,
        notes: Option<String>,
    ) -> Result<BountyRecord> {
        let record = self.load("submit", id).await?;
        if record.status != BountyStatus::InProgress {
            return Err(BountyError::InvalidTransition {
                from: record.status,
                requested: "submit",
            });
        }
        if record.claimer.as_ref() != Some(actor) {
            return Err(BountyError::Unauthorized {
                actor: actor.clone(),
                action: "submit work for",
            });
        }

        let mutation = BountyMutation::to(BountyStatus::InReview)
            .with_submission(Submission { url, notes });
        let updated = match self
            .store_call(
                "submit",
                self.store
                    .conditional_update(id, BountyStatus::InProgress, mutation),
            )
            .await?
        {
            Ok(updated) => updated,
            Err(StoreError::PreconditionFailed { actual, .. }) => {
                return Err(BountyError::InvalidTransition {
                    from: actual,
                    requested: "submit",
                })
            }
            Err(StoreError::NotFound(_)) => return Err(BountyError::NotFound(*id)),
            Err(e) => return Err(store_failure("submit", e)),
        };

        info!(bounty_id = %id, claimer = %actor, "📬 Submission received");
        self.notify_quietly(&updated.creator, &BountyEvent::submitted(&updated, actor))
            .await;
        Ok(updated)
    }

    /// Approve the bounty and record the payout obligation.
    ///
    /// Valid from `InReview`, or directly from `InProgress` as direct
    /// approval; both paths require the creator or a reviewer role. The
    /// obligation ledger entry is a record of what is owed, not a transfer.
    pub async fn complete(&self, actor: &ActorId, id: &BountyId) -> Result<BountyRecord> {
        let record = self.load("complete", id).await?;
        if !matches!(
            record.status,
            BountyStatus::InReview | BountyStatus::InProgress
        ) {
            return Err(BountyError::InvalidTransition {
                from: record.status,
                requested: "complete",
            });
        }
        if record.creator != *actor && !self.is_reviewer(actor).await? {
            return Err(BountyError::Unauthorized {
                actor: actor.clone(),
                action: "complete",
            });
        }

        let expected = record.status;
        let updated = match self
            .store_call(
                "complete",
                self.store
                    .conditional_update(id, expected, BountyMutation::to(BountyStatus::Completed)),
            )
            .await?
        {
            Ok(updated) => updated,
            Err(StoreError::PreconditionFailed { actual, .. }) => {
                return Err(match actual {
                    // A concurrent submit moved it between review stages; the
                    // bounty is still completable.
                    BountyStatus::InProgress | BountyStatus::InReview => BountyError::Conflict(
                        format!("bounty {} changed status concurrently", id),
                    ),
                    other => BountyError::InvalidTransition {
                        from: other,
                        requested: "complete",
                    },
                })
            }
            Err(StoreError::NotFound(_)) => return Err(BountyError::NotFound(*id)),
            Err(e) => return Err(store_failure("complete", e)),
        };

        info!(
            bounty_id = %id,
            completed_by = %actor,
            reward = %updated.reward,
            "✅ Bounty completed"
        );
        if let Some(claimer) = updated.claimer.clone() {
            self.record_obligation_quietly(&updated, &claimer).await;
            self.notify_quietly(&claimer, &BountyEvent::completed(&updated, actor, &claimer))
                .await;
            self.notify_quietly(
                &updated.creator,
                &BountyEvent::completed(&updated, actor, &claimer),
            )
            .await;
        }
        Ok(updated)
    }

    /// Withdraw a bounty nobody has claimed yet. `Deleted` is a terminal
    /// status, not row removal; the record stays for the audit trail.
    pub async fn delete(&self, actor: &ActorId, id: &BountyId) -> Result<BountyRecord> {
        let record = self.load("delete", id).await?;
        if !matches!(record.status, BountyStatus::Draft | BountyStatus::Open) {
            return Err(BountyError::InvalidTransition {
                from: record.status,
                requested: "delete",
            });
        }
        if record.creator != *actor {
            return Err(BountyError::Unauthorized {
                actor: actor.clone(),
                action: "delete",
            });
        }

        let expected = record.status;
        let updated = match self
            .store_call(
                "delete",
                self.store
                    .conditional_update(id, expected, BountyMutation::to(BountyStatus::Deleted)),
            )
            .await?
        {
            Ok(updated) => updated,
            Err(StoreError::PreconditionFailed { actual, .. }) => {
                return Err(match actual {
                    BountyStatus::Draft | BountyStatus::Open => BountyError::Conflict(format!(
                        "bounty {} changed status concurrently",
                        id
                    )),
                    other => BountyError::InvalidTransition {
                        from: other,
                        requested: "delete",
                    },
                })
            }
            Err(StoreError::NotFound(_)) => return Err(BountyError::NotFound(*id)),
            Err(e) => return Err(store_failure("delete", e)),
        };

        info!(bounty_id = %id, deleted_by = %actor, "🗑️ Bounty deleted");
        self.notify_quietly(&updated.creator, &BountyEvent::deleted(&updated, actor))
            .await;
        Ok(updated)
    }

    /// Read-only snapshot projection; no side effects.
    pub async fn list_for_actor(
        &self,
        actor: &ActorId,
        scope: ListScope,
    ) -> Result<Vec<BountyRecord>> {
        let filter = scope.into_filter(actor);
        match self.store_call("list", self.store.query(&filter)).await? {
            Ok(records) => Ok(records),
            Err(e) => Err(store_failure("list", e)),
        }
    }

    /// Obligations owed to a claimer from completed bounties.
    pub async fn obligations_for(&self, claimer: &ActorId) -> Result<Vec<PayoutObligation>> {
        match self
            .store_call("obligations", self.store.obligations_for(claimer))
            .await?
        {
            Ok(obligations) => Ok(obligations),
            Err(e) => Err(store_failure("obligations", e)),
        }
    }

    async fn load(&self, operation: &'static str, id: &BountyId) -> Result<BountyRecord> {
        match self.store_call(operation, self.store.get(id)).await? {
            Ok(Some(record)) => Ok(record),
            Ok(None) => Err(BountyError::NotFound(*id)),
            Err(e) => Err(store_failure(operation, e)),
        }
    }

    /// Bound a store call by the configured deadline. The store's
    /// conditional write is atomic, so a timeout never leaves a record
    /// half-updated; the caller may retry.
    async fn store_call<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = StoreResult<T>>,
    ) -> Result<StoreResult<T>> {
        match self.config.store_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| BountyError::Timeout { operation }),
            None => Ok(call.await),
        }
    }

    async fn is_reviewer(&self, actor: &ActorId) -> Result<bool> {
        self.policy
            .is_reviewer(actor)
            .await
            .map_err(|e| BountyError::Unexpected(format!("authorization lookup failed: {}", e)))
    }

    async fn may_fan_out(&self, actor: &ActorId) -> Result<bool> {
        self.policy
            .may_fan_out(actor)
            .await
            .map_err(|e| BountyError::Unexpected(format!("authorization lookup failed: {}", e)))
    }

    async fn notify_quietly(&self, recipient: &ActorId, event: &BountyEvent) {
        if let Err(e) = self.notifier.notify(recipient, event).await {
            warn!(
                recipient = %recipient,
                event_type = event.event_type(),
                error = %e,
                "Notification delivery failed"
            );
        }
    }

    async fn record_obligation_quietly(&self, record: &BountyRecord, claimer: &ActorId) {
        let obligation = PayoutObligation {
            bounty_id: record.id,
            creator: record.creator.clone(),
            claimer: claimer.clone(),
            reward: record.reward.clone(),
            recorded_at: Utc::now(),
        };
        if let Err(e) = self.store.record_obligation(obligation).await {
            warn!(
                bounty_id = %record.id,
                claimer = %claimer,
                error = %e,
                "Failed to record payout obligation"
            );
        }
    }
}

fn claim_refusal(id: &BountyId, status: BountyStatus) -> BountyError {
    match status {
        BountyStatus::InProgress | BountyStatus::InReview | BountyStatus::Completed => {
            BountyError::AlreadyClaimed(*id)
        }
        other => BountyError::InvalidTransition {
            from: other,
            requested: "claim",
        },
    }
}

fn store_failure(operation: &'static str, err: StoreError) -> BountyError {
    match err {
        StoreError::AlreadyExists(id) => {
            BountyError::Conflict(format!("bounty {} already exists", id))
        }
        StoreError::PreconditionFailed { expected, actual } => BountyError::Conflict(format!(
            "status changed concurrently during {}: expected {}, found {}",
            operation, expected, actual
        )),
        other => BountyError::Unexpected(format!("storage failed during {}: {}", operation, other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::LogSink;
    use crate::policy::StaticPolicy;
    use bounty_storage::MemoryStore;

    fn engine() -> LifecycleEngine {
        LifecycleEngine::new(
            Arc::new(MemoryStore::new()),
            Arc::new(LogSink),
            Arc::new(StaticPolicy::new().with_fan_out([ActorId::from("power-user")])),
        )
    }

    fn draft_params(copies: Option<u32>) -> CreateDraft {
        CreateDraft {
            title: "Write release notes".into(),
            summary: "Summarize the release".into(),
            criteria: "Published on the blog".into(),
            reward: "100 BANK".into(),
            copies,
        }
    }

    #[tokio::test]
    async fn create_rejects_blank_title() {
        let err = engine()
            .create_draft(
                &ActorId::from("creator"),
                CreateDraft {
                    title: "   ".into(),
                    ..draft_params(None)
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BountyError::Validation(_)));
    }

    #[tokio::test]
    async fn create_rejects_malformed_reward() {
        let err = engine()
            .create_draft(
                &ActorId::from("creator"),
                CreateDraft {
                    reward: "12.5.3 BANK".into(),
                    ..draft_params(None)
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BountyError::Validation(_)));
    }

    #[tokio::test]
    async fn copies_default_to_one() {
        let records = engine()
            .create_draft(&ActorId::from("creator"), draft_params(Some(0)))
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].copy_group.is_none());
    }

    #[tokio::test]
    async fn fan_out_requires_capability() {
        let err = engine()
            .create_draft(&ActorId::from("creator"), draft_params(Some(3)))
            .await
            .unwrap_err();
        assert!(matches!(err, BountyError::Unauthorized { .. }));

        let records = engine()
            .create_draft(&ActorId::from("power-user"), draft_params(Some(3)))
            .await
            .unwrap();
        assert_eq!(records.len(), 3);
    }

    #[tokio::test]
    async fn fan_out_respects_copy_cap() {
        let err = engine()
            .create_draft(&ActorId::from("power-user"), draft_params(Some(101)))
            .await
            .unwrap_err();
        assert!(matches!(err, BountyError::Validation(_)));
    }
}
