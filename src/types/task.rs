//! Records exchanged with the backing store's notification tables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{ConversationId, EmailAddress, ParticipantId};

/// A queued "this conversation needs a notification pass" marker.
///
/// At most one task per conversation is queued at any instant; duplicate
/// enqueues coalesce into the existing row without touching its timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationTask {
    /// The conversation needing a pass.
    pub conversation: ConversationId,

    /// When the interaction event that created this task happened.
    ///
    /// Candidate loading uses this as the notified-before cutoff, so a pass
    /// never re-notifies participants already notified after the trigger.
    pub triggered_at: DateTime<Utc>,
}

impl NotificationTask {
    pub fn new(conversation: ConversationId, triggered_at: DateTime<Utc>) -> Self {
        NotificationTask {
            conversation,
            triggered_at,
        }
    }
}

/// A participant row as loaded for a notification pass.
///
/// Carries the subscription/backoff fields mutated after each send, plus the
/// delivery email resolved by the store. `None` timestamps mean "never".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationCandidate {
    pub participant: ParticipantId,
    pub conversation: ConversationId,

    /// Delivery address, if the participant's account has one.
    pub email: Option<EmailAddress>,

    /// Whether the participant is subscribed to notifications.
    pub subscribed: bool,

    /// When the participant was last notified. `None` = never notified.
    pub last_notified_at: Option<DateTime<Utc>>,

    /// When the participant last voted or commented. `None` = unknown.
    pub last_interaction_at: Option<DateTime<Utc>>,

    /// Count of notifications already sent; governs escalating wait times.
    pub strike_count: u32,
}
