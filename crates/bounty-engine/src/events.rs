//! Outcome events for bounty state changes.
//!
//! The engine emits one event per committed transition so delivery layers
//! (chat DMs, webhooks, dashboards) can react without polling the store.

use async_trait::async_trait;
use bounty_types::{ActorId, BountyRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

use crate::notify::NotificationSink;

/// Events buffered per channel before old ones are dropped for slow readers.
const EVENT_BUFFER: usize = 256;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum BountyEvent {
    /// A draft was created (one event per copy in a fan-out).
    Drafted {
        bounty_id: String,
        creator: String,
        title: String,
        reward: String,
        #[serde(with = "chrono::serde::ts_seconds")]
        timestamp: DateTime<Utc>,
    },

    /// A draft went live and is claimable.
    Published {
        bounty_id: String,
        creator: String,
        title: String,
        reward: String,
        #[serde(with = "chrono::serde::ts_seconds")]
        timestamp: DateTime<Utc>,
    },

    /// An actor took exclusive claim.
    Claimed {
        bounty_id: String,
        claimer: String,
        title: String,
        #[serde(with = "chrono::serde::ts_seconds")]
        timestamp: DateTime<Utc>,
    },

    /// The claimer handed in work for review.
    Submitted {
        bounty_id: String,
        claimer: String,
        url: Option<String>,
        #[serde(with = "chrono::serde::ts_seconds")]
        timestamp: DateTime<Utc>,
    },

    /// The bounty completed; a payout obligation was recorded.
    Completed {
        bounty_id: String,
        completed_by: String,
        claimer: String,
        reward: String,
        #[serde(with = "chrono::serde::ts_seconds")]
        timestamp: DateTime<Utc>,
    },

    /// The bounty was withdrawn before any claim.
    Deleted {
        bounty_id: String,
        deleted_by: String,
        #[serde(with = "chrono::serde::ts_seconds")]
        timestamp: DateTime<Utc>,
    },
}

impl BountyEvent {
    pub fn drafted(record: &BountyRecord) -> Self {
        Self::Drafted {
            bounty_id: record.id.to_string(),
            creator: record.creator.to_string(),
            title: record.title.clone(),
            reward: record.reward.to_string(),
            timestamp: Utc::now(),
        }
    }

    pub fn published(record: &BountyRecord) -> Self {
        Self::Published {
            bounty_id: record.id.to_string(),
            creator: record.creator.to_string(),
            title: record.title.clone(),
            reward: record.reward.to_string(),
            timestamp: Utc::now(),
        }
    }

    pub fn claimed(record: &BountyRecord, claimer: &ActorId) -> Self {
        Self::Claimed {
            bounty_id: record.id.to_string(),
            claimer: claimer.to_string(),
            title: record.title.clone(),
            timestamp: Utc::now(),
        }
    }

    pub fn submitted(record: &BountyRecord, claimer: &ActorId) -> Self {
        Self::Submitted {
            bounty_id: record.id.to_string(),
            claimer: claimer.to_string(),
            url: record.submission.as_ref().and_then(|s| s.url.clone()),
            timestamp: Utc::now(),
        }
    }

    pub fn completed(record: &BountyRecord, completed_by: &ActorId, claimer: &ActorId) -> Self {
        Self::Completed {
            bounty_id: record.id.to_string(),
            completed_by: completed_by.to_string(),
            claimer: claimer.to_string(),
            reward: record.reward.to_string(),
            timestamp: Utc::now(),
        }
    }

    pub fn deleted(record: &BountyRecord, deleted_by: &ActorId) -> Self {
        Self::Deleted {
            bounty_id: record.id.to_string(),
            deleted_by: deleted_by.to_string(),
            timestamp: Utc::now(),
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Drafted { .. } => "bounty_drafted",
            Self::Published { .. } => "bounty_published",
            Self::Claimed { .. } => "bounty_claimed",
            Self::Submitted { .. } => "bounty_submitted",
            Self::Completed { .. } => "bounty_completed",
            Self::Deleted { .. } => "bounty_deleted",
        }
    }
}

/// An event addressed to the actor it concerns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub recipient: String,
    pub event: BountyEvent,
}

/// Broadcast-based notification sink.
///
/// If no subscribers are listening, events are dropped; that is expected,
/// not an error.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Notification>,
    emitted: Arc<AtomicU64>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            sender,
            emitted: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    pub fn emit(&self, notification: Notification) {
        match self.sender.send(notification.clone()) {
            Ok(subscriber_count) => {
                debug!(
                    event_type = notification.event.event_type(),
                    recipient = %notification.recipient,
                    subscribers = subscriber_count,
                    "Event emitted"
                );
                self.emitted.fetch_add(1, Ordering::Relaxed);
            }
            Err(_) => {
                debug!(
                    event_type = notification.event.event_type(),
                    "Event emitted but no subscribers listening"
                );
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub fn total_events_emitted(&self) -> u64 {
        self.emitted.load(Ordering::Relaxed)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationSink for EventBus {
    async fn notify(&self, recipient: &ActorId, event: &BountyEvent) -> anyhow::Result<()> {
        self.emit(Notification {
            recipient: recipient.to_string(),
            event: event.clone(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bounty_types::RewardAmount;

    fn sample_record() -> BountyRecord {
        BountyRecord::draft(
            ActorId::from("creator"),
            "Ship the feature",
            "summary",
            "criteria",
            RewardAmount::parse("12.5", "BANK").unwrap(),
            None,
            0,
        )
    }

    #[tokio::test]
    async fn bus_delivers_to_subscriber() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        let record = sample_record();
        bus.notify(&record.creator, &BountyEvent::drafted(&record))
            .await
            .unwrap();

        let delivered = rx.recv().await.unwrap();
        assert_eq!(delivered.recipient, "creator");
        assert_eq!(delivered.event.event_type(), "bounty_drafted");
        assert_eq!(bus.total_events_emitted(), 1);
    }

    #[tokio::test]
    async fn no_subscribers_is_not_an_error() {
        let bus = EventBus::new();
        assert_eq!(bus.subscriber_count(), 0);

        let record = sample_record();
        bus.notify(&record.creator, &BountyEvent::drafted(&record))
            .await
            .unwrap();
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let record = sample_record();
        let event = BountyEvent::published(&record);

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "Published");
        assert_eq!(json["data"]["reward"], "12.5 BANK");
        assert!(json["data"]["timestamp"].is_number());
    }
}
