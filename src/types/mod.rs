//! Core domain types: identifiers, queue/participant records, and snapshots.

pub mod ids;
pub mod snapshot;
pub mod task;

pub use ids::{
    BaseClusterId, ConversationId, EmailAddress, GroupId, MathTick, ParticipantId,
};
pub use snapshot::{ComputedSnapshot, GroupCluster, RawSnapshot, SnapshotDataError};
pub use task::{NotificationCandidate, NotificationTask};
