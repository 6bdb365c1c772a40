pub mod engine;
pub mod events;
pub mod notify;
pub mod policy;

pub use engine::{CreateDraft, EngineConfig, LifecycleEngine, ListScope};
pub use events::{BountyEvent, EventBus, Notification};
pub use notify::{LogSink, NotificationSink};
pub use policy::{AuthorizationPolicy, StaticPolicy};
