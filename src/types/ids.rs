//! Newtype wrappers for domain identifiers.
//!
//! These types prevent accidental mixing of different ID types (e.g., using a
//! ParticipantId where a ConversationId is expected) and make the code more
//! self-documenting.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A conversation identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(pub u64);

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conv:{}", self.0)
    }
}

impl From<u64> for ConversationId {
    fn from(n: u64) -> Self {
        ConversationId(n)
    }
}

/// A conversation-scoped participant identifier.
///
/// Distinct from the account/user identity: the same person has a different
/// `ParticipantId` in each conversation they join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub u64);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pid:{}", self.0)
    }
}

impl From<u64> for ParticipantId {
    fn from(n: u64) -> Self {
        ParticipantId(n)
    }
}

/// The externally visible identifier of a fine ("base") opinion cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BaseClusterId(pub u32);

impl fmt::Display for BaseClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for BaseClusterId {
    fn from(n: u32) -> Self {
        BaseClusterId(n)
    }
}

/// The identifier of a coarse group cluster (a bloc of base clusters).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub u32);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for GroupId {
    fn from(n: u32) -> Self {
        GroupId(n)
    }
}

/// A monotonically increasing stamp identifying a computed snapshot.
///
/// For a given conversation, ticks are strictly increasing and never reused.
/// A larger tick always denotes a newer snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MathTick(pub u64);

impl fmt::Display for MathTick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for MathTick {
    fn from(n: u64) -> Self {
        MathTick(n)
    }
}

/// A delivery email address.
///
/// Not validated beyond being non-empty at the seams that consume it; the
/// email collaborator owns real address validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmailAddress(pub String);

impl EmailAddress {
    pub fn new(s: impl Into<String>) -> Self {
        EmailAddress(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EmailAddress {
    fn from(s: &str) -> Self {
        EmailAddress(s.to_string())
    }
}
