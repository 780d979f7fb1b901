//! Collaborator seams for the backing store and adjacent external systems.
//!
//! The relational store itself is out of scope; these traits are the
//! interfaces the engine programs against. The trait-based design enables:
//! - In-memory implementations for tests and local runs
//! - A SQL-backed implementation as a deployment concern
//! - Logging/tracing wrappers
//!
//! Traits use return-position futures rather than an async-trait macro, so
//! implementations stay zero-cost and `Send`-ness is explicit in the
//! signature.

use std::future::Future;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::types::{
    ComputedSnapshot, ConversationId, MathTick, NotificationCandidate, NotificationTask,
    ParticipantId,
};

pub mod memory;

pub use memory::{MemoryRecomputeQueue, MemoryStore};

/// Errors surfaced by backing-store operations.
///
/// The scheduler logs these and continues on its next tick; nothing above the
/// store retries immediately or crashes on them.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached.
    #[error("backing store unavailable: {0}")]
    Unavailable(String),

    /// A query or statement failed.
    #[error("backing store query failed: {0}")]
    Query(String),
}

/// The relational backing store: notification task queue, participant
/// notification state, and the computed-snapshot store.
pub trait Store: Send + Sync {
    /// Queues a notification pass for a conversation.
    ///
    /// Idempotent coalescing: if a task for the conversation is already
    /// queued, the call succeeds without touching the existing row — in
    /// particular, the existing row's `triggered_at` is NOT updated. This is
    /// an insert-do-nothing-on-conflict, not a read-then-insert race.
    fn enqueue_task(
        &self,
        conversation: ConversationId,
        triggered_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Atomically claims one queued task: selects a row in random order
    /// across conversations, locks it against concurrent claimers, deletes
    /// it, and returns it.
    ///
    /// This is the sole concurrency-safety primitive for scheduling: many
    /// processes may call it simultaneously and each queued task is delivered
    /// to exactly one caller. Returns `None` when the queue is empty (not an
    /// error).
    fn claim_next_task(
        &self,
    ) -> impl Future<Output = Result<Option<NotificationTask>, StoreError>> + Send;

    /// Loads the subscribed participants of a conversation whose
    /// `last_notified_at` is strictly before `notified_before` (participants
    /// never notified count as before everything).
    fn notification_candidates(
        &self,
        conversation: ConversationId,
        notified_before: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<NotificationCandidate>, StoreError>> + Send;

    /// Atomically sets `last_notified_at = at` and increments the strike
    /// count for one participant. Called only after a successful send.
    fn record_notification(
        &self,
        conversation: ConversationId,
        participant: ParticipantId,
        at: DateTime<Utc>,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Fetches the latest computed snapshot for a conversation.
    ///
    /// With `newer_than` set, returns the snapshot only if its tick is
    /// strictly greater; `None` otherwise. `None` with `newer_than` unset
    /// means no snapshot has ever been computed for the conversation.
    fn latest_snapshot(
        &self,
        conversation: ConversationId,
        newer_than: Option<MathTick>,
    ) -> impl Future<Output = Result<Option<ComputedSnapshot>, StoreError>> + Send;
}

/// The remaining-content collaborator: how many statements a participant has
/// not yet voted on.
pub trait RemainingCounter: Send + Sync {
    fn remaining_unvoted(
        &self,
        conversation: ConversationId,
        participant: ParticipantId,
    ) -> impl Future<Output = Result<usize, StoreError>> + Send;
}

/// The separate external work queue consumed by the math worker.
///
/// The engine only enqueues and returns; it never processes this queue.
pub trait RecomputeQueue: Send + Sync {
    fn enqueue_recompute(
        &self,
        conversation: ConversationId,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}
