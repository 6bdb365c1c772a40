use crate::events::BountyEvent;
use async_trait::async_trait;
use bounty_types::ActorId;
use tracing::info;

/// Fire-and-forget delivery of outcome events to actors.
///
/// Owned by the embedding application, not the engine: the engine commits a
/// transition first and then issues one notify call per interested actor.
/// Delivery failure is logged by the engine and never unwinds the committed
/// transition.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, recipient: &ActorId, event: &BountyEvent) -> anyhow::Result<()>;
}

/// Sink that only logs, for embedding without a delivery layer.
#[derive(Debug, Default)]
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn notify(&self, recipient: &ActorId, event: &BountyEvent) -> anyhow::Result<()> {
        info!(
            recipient = %recipient,
            event_type = event.event_type(),
            "📨 Notification"
        );
        Ok(())
    }
}
