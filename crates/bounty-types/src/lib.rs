pub mod bounty;
pub mod error;
pub mod id;
pub mod reward;

pub use bounty::{BountyRecord, BountyStatus, PayoutObligation, Submission};
pub use error::{BountyError, Result};
pub use id::{ActorId, BountyId, CopyGroupId};
pub use reward::{RewardAmount, RewardParseError};
