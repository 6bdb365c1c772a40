use blake3::Hasher;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identity token for an actor, minted by the upstream identity
/// provider. The engine never inspects it beyond equality.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(String);

impl ActorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ActorId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ActorId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Debug for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActorId({})", self.0)
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BountyId([u8; 32]);

impl BountyId {
    /// Derive a fresh id for a draft. The random nonce keeps ids unique even
    /// when one fan-out request creates many structurally identical copies.
    pub fn fresh(creator: &ActorId, title: &str, copy_index: u32) -> Self {
        let mut hasher = Hasher::new();
        hasher.update(creator.as_str().as_bytes());
        hasher.update(title.as_bytes());
        hasher.update(
            &chrono::Utc::now()
                .timestamp_nanos_opt()
                .unwrap_or_default()
                .to_le_bytes(),
        );
        hasher.update(&copy_index.to_le_bytes());
        hasher.update(&rand::random::<u64>().to_le_bytes());
        Self(*hasher.finalize().as_bytes())
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for BountyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BountyId({}...)", &self.to_hex()[..8])
    }
}

impl fmt::Display for BountyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Links the records created by a single fan-out request. Each copy is an
/// independent record with its own id and lifecycle.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CopyGroupId([u8; 32]);

impl CopyGroupId {
    pub fn fresh() -> Self {
        let mut hasher = Hasher::new();
        hasher.update(
            &chrono::Utc::now()
                .timestamp_nanos_opt()
                .unwrap_or_default()
                .to_le_bytes(),
        );
        hasher.update(&rand::random::<u64>().to_le_bytes());
        Self(*hasher.finalize().as_bytes())
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for CopyGroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CopyGroupId({}...)", &self.to_hex()[..8])
    }
}

impl fmt::Display for CopyGroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounty_id_hex_round_trip() {
        let id = BountyId::fresh(&ActorId::from("actor-1"), "Fix the docs", 0);
        let hex = id.to_hex();
        assert_eq!(BountyId::from_hex(&hex).unwrap(), id);
    }

    #[test]
    fn fresh_ids_are_unique_across_copies() {
        let creator = ActorId::from("actor-1");
        let a = BountyId::fresh(&creator, "Same title", 0);
        let b = BountyId::fresh(&creator, "Same title", 1);
        assert_ne!(a, b);
    }

    #[test]
    fn from_hex_rejects_wrong_length() {
        assert!(BountyId::from_hex("abcd").is_err());
    }
}
