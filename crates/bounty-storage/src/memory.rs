use crate::store::{BountyFilter, BountyMutation, BountyStore, Result, StoreError};
use async_trait::async_trait;
use bounty_types::{ActorId, BountyId, BountyRecord, BountyStatus, PayoutObligation};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// In-memory store for testing and embedding.
///
/// `conditional_update` holds the write lock across check-and-mutate, which
/// gives it the same arbitration a durable backend provides with a
/// compare-and-swap write: concurrent claimers of one record serialize here,
/// and exactly one observes the expected status.
pub struct MemoryStore {
    bounties: Arc<RwLock<HashMap<BountyId, BountyRecord>>>,
    obligations: Arc<RwLock<Vec<PayoutObligation>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            bounties: Arc::new(RwLock::new(HashMap::new())),
            obligations: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BountyStore for MemoryStore {
    async fn get(&self, id: &BountyId) -> Result<Option<BountyRecord>> {
        let bounties = self.bounties.read().await;
        Ok(bounties.get(id).cloned())
    }

    async fn insert(&self, record: &BountyRecord) -> Result<()> {
        let mut bounties = self.bounties.write().await;

        if bounties.contains_key(&record.id) {
            return Err(StoreError::AlreadyExists(record.id.to_string()));
        }

        debug_assert!(record.invariants_hold());
        bounties.insert(record.id, record.clone());

        debug!(
            bounty_id = %record.id,
            status = %record.status,
            "Bounty stored"
        );
        Ok(())
    }

    async fn conditional_update(
        &self,
        id: &BountyId,
        expected: BountyStatus,
        mutation: BountyMutation,
    ) -> Result<BountyRecord> {
        let mut bounties = self.bounties.write().await;

        let record = bounties
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if record.status != expected {
            return Err(StoreError::PreconditionFailed {
                expected,
                actual: record.status,
            });
        }

        record.status = mutation.status;
        if let Some(claimer) = mutation.claimer {
            record.claimer = Some(claimer);
        }
        if let Some(submission) = mutation.submission {
            record.submission = Some(submission);
        }
        record.status_changed_at = Utc::now();

        debug_assert!(record.invariants_hold());

        debug!(
            bounty_id = %id,
            from = %expected,
            to = %record.status,
            "Bounty status updated"
        );
        Ok(record.clone())
    }

    async fn query(&self, filter: &BountyFilter) -> Result<Vec<BountyRecord>> {
        let bounties = self.bounties.read().await;

        let mut matches: Vec<BountyRecord> = bounties
            .values()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect();
        matches.sort_by_key(|record| record.created_at);

        Ok(matches)
    }

    async fn record_obligation(&self, obligation: PayoutObligation) -> Result<()> {
        let mut obligations = self.obligations.write().await;

        debug!(
            bounty_id = %obligation.bounty_id,
            claimer = %obligation.claimer,
            reward = %obligation.reward,
            "Payout obligation recorded"
        );
        obligations.push(obligation);
        Ok(())
    }

    async fn obligations_for(&self, claimer: &ActorId) -> Result<Vec<PayoutObligation>> {
        let obligations = self.obligations.read().await;
        Ok(obligations
            .iter()
            .filter(|o| o.claimer == *claimer)
            .cloned()
            .collect())
    }
}
