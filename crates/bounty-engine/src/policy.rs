use async_trait::async_trait;
use bounty_types::ActorId;
use std::collections::HashSet;

/// Injected capability check for privileged operations. The engine queries
/// it per operation; role configuration lives with the embedding
/// application, not as process-wide mutable state.
#[async_trait]
pub trait AuthorizationPolicy: Send + Sync {
    /// May this actor approve completion of bounties they did not create?
    async fn is_reviewer(&self, actor: &ActorId) -> anyhow::Result<bool>;

    /// May this actor create more than one copy in a single request?
    async fn may_fan_out(&self, actor: &ActorId) -> anyhow::Result<bool>;
}

/// Fixed allow-lists, for tests and single-tenant deployments.
#[derive(Debug, Default, Clone)]
pub struct StaticPolicy {
    reviewers: HashSet<ActorId>,
    fan_out: HashSet<ActorId>,
}

impl StaticPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reviewers(mut self, reviewers: impl IntoIterator<Item = ActorId>) -> Self {
        self.reviewers.extend(reviewers);
        self
    }

    pub fn with_fan_out(mut self, actors: impl IntoIterator<Item = ActorId>) -> Self {
        self.fan_out.extend(actors);
        self
    }
}

#[async_trait]
impl AuthorizationPolicy for StaticPolicy {
    async fn is_reviewer(&self, actor: &ActorId) -> anyhow::Result<bool> {
        Ok(self.reviewers.contains(actor))
    }

    async fn may_fan_out(&self, actor: &ActorId) -> anyhow::Result<bool> {
        Ok(self.fan_out.contains(actor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_policy_membership() {
        let policy = StaticPolicy::new()
            .with_reviewers([ActorId::from("rev")])
            .with_fan_out([ActorId::from("power-user")]);

        assert!(policy.is_reviewer(&ActorId::from("rev")).await.unwrap());
        assert!(!policy.is_reviewer(&ActorId::from("other")).await.unwrap());
        assert!(policy
            .may_fan_out(&ActorId::from("power-user"))
            .await
            .unwrap());
        assert!(!policy.may_fan_out(&ActorId::from("rev")).await.unwrap());
    }
}
