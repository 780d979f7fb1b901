//! In-memory reference implementation of the store seams.
//!
//! Backs the test suite and the binary's default wiring. The claim path
//! demonstrates the contract a SQL implementation must honor: selection in
//! random order across conversations, and claim-and-delete under a single
//! lock so each queued task is delivered to exactly one caller.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::warn;

use crate::types::{
    ComputedSnapshot, ConversationId, MathTick, NotificationCandidate, NotificationTask,
    ParticipantId,
};

use super::{RecomputeQueue, RemainingCounter, Store, StoreError};

#[derive(Debug, Default)]
struct MemoryInner {
    tasks: BTreeMap<ConversationId, NotificationTask>,
    participants: BTreeMap<(ConversationId, ParticipantId), NotificationCandidate>,
    snapshots: BTreeMap<ConversationId, ComputedSnapshot>,
    remaining: BTreeMap<(ConversationId, ParticipantId), usize>,
}

/// An in-memory backing store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,

    /// Count of `latest_snapshot` calls, for asserting that the cache's
    /// absent memo actually skips lookups.
    snapshot_lookups: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn locked(&self) -> Result<MutexGuard<'_, MemoryInner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }

    /// Seeds a participant row.
    pub fn add_participant(&self, candidate: NotificationCandidate) {
        let mut inner = self.inner.lock().expect("memory store lock poisoned");
        inner
            .participants
            .insert((candidate.conversation, candidate.participant), candidate);
    }

    /// Seeds the remaining-unvoted count for a participant.
    pub fn set_remaining(&self, conversation: ConversationId, participant: ParticipantId, n: usize) {
        let mut inner = self.inner.lock().expect("memory store lock poisoned");
        inner.remaining.insert((conversation, participant), n);
    }

    /// Stores a snapshot, keeping only the latest per conversation.
    ///
    /// Ticks are monotonic per conversation; a stale or repeated tick is
    /// dropped with a warning rather than rolling the store backwards.
    pub fn insert_snapshot(&self, snapshot: ComputedSnapshot) {
        let mut inner = self.inner.lock().expect("memory store lock poisoned");
        match inner.snapshots.get(&snapshot.conversation) {
            Some(existing) if existing.math_tick >= snapshot.math_tick => {
                warn!(
                    conversation = %snapshot.conversation,
                    stored = %existing.math_tick,
                    offered = %snapshot.math_tick,
                    "dropping non-monotonic snapshot"
                );
            }
            _ => {
                inner.snapshots.insert(snapshot.conversation, snapshot);
            }
        }
    }

    /// Returns the queued task for a conversation, if any.
    pub fn queued_task(&self, conversation: ConversationId) -> Option<NotificationTask> {
        let inner = self.inner.lock().expect("memory store lock poisoned");
        inner.tasks.get(&conversation).cloned()
    }

    /// Number of queued tasks across all conversations.
    pub fn queued_len(&self) -> usize {
        let inner = self.inner.lock().expect("memory store lock poisoned");
        inner.tasks.len()
    }

    /// Returns a participant's current row.
    pub fn participant(
        &self,
        conversation: ConversationId,
        participant: ParticipantId,
    ) -> Option<NotificationCandidate> {
        let inner = self.inner.lock().expect("memory store lock poisoned");
        inner.participants.get(&(conversation, participant)).cloned()
    }

    /// How many `latest_snapshot` lookups have hit this store.
    pub fn snapshot_lookup_count(&self) -> usize {
        self.snapshot_lookups.load(Ordering::Relaxed)
    }
}

impl Store for MemoryStore {
    fn enqueue_task(
        &self,
        conversation: ConversationId,
        triggered_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        async move {
            let mut inner = self.locked()?;
            // Insert-if-absent: a queued conversation keeps its original row.
            inner
                .tasks
                .entry(conversation)
                .or_insert_with(|| NotificationTask::new(conversation, triggered_at));
            Ok(())
        }
    }

    fn claim_next_task(
        &self,
    ) -> impl Future<Output = Result<Option<NotificationTask>, StoreError>> + Send {
        async move {
            let mut inner = self.locked()?;
            let keys: Vec<ConversationId> = inner.tasks.keys().copied().collect();
            if keys.is_empty() {
                return Ok(None);
            }
            // Random order across conversations so no conversation starves
            // under sustained load.
            let chosen = keys[rand::thread_rng().gen_range(0..keys.len())];
            Ok(inner.tasks.remove(&chosen))
        }
    }

    fn notification_candidates(
        &self,
        conversation: ConversationId,
        notified_before: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<NotificationCandidate>, StoreError>> + Send {
        async move {
            let inner = self.locked()?;
            Ok(inner
                .participants
                .values()
                .filter(|c| c.conversation == conversation)
                .filter(|c| c.subscribed)
                .filter(|c| match c.last_notified_at {
                    Some(at) => at < notified_before,
                    None => true,
                })
                .cloned()
                .collect())
        }
    }

    fn record_notification(
        &self,
        conversation: ConversationId,
        participant: ParticipantId,
        at: DateTime<Utc>,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        async move {
            let mut inner = self.locked()?;
            match inner.participants.get_mut(&(conversation, participant)) {
                Some(row) => {
                    row.last_notified_at = Some(at);
                    row.strike_count += 1;
                    Ok(())
                }
                None => Err(StoreError::Query(format!(
                    "no participant {participant} in {conversation}"
                ))),
            }
        }
    }

    fn latest_snapshot(
        &self,
        conversation: ConversationId,
        newer_than: Option<MathTick>,
    ) -> impl Future<Output = Result<Option<ComputedSnapshot>, StoreError>> + Send {
        async move {
            self.snapshot_lookups.fetch_add(1, Ordering::Relaxed);
            let inner = self.locked()?;
            Ok(inner
                .snapshots
                .get(&conversation)
                .filter(|s| match newer_than {
                    Some(tick) => s.math_tick > tick,
                    None => true,
                })
                .cloned())
        }
    }
}

impl RemainingCounter for MemoryStore {
    fn remaining_unvoted(
        &self,
        conversation: ConversationId,
        participant: ParticipantId,
    ) -> impl Future<Output = Result<usize, StoreError>> + Send {
        async move {
            let inner = self.locked()?;
            Ok(inner
                .remaining
                .get(&(conversation, participant))
                .copied()
                .unwrap_or(0))
        }
    }
}

/// An in-memory stand-in for the external recompute work queue.
#[derive(Debug, Default)]
pub struct MemoryRecomputeQueue {
    jobs: Mutex<Vec<ConversationId>>,
}

impl MemoryRecomputeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Conversations enqueued so far, in order.
    pub fn jobs(&self) -> Vec<ConversationId> {
        self.jobs.lock().expect("recompute queue lock poisoned").clone()
    }
}

impl RecomputeQueue for MemoryRecomputeQueue {
    fn enqueue_recompute(
        &self,
        conversation: ConversationId,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        async move {
            let mut jobs = self
                .jobs
                .lock()
                .map_err(|_| StoreError::Unavailable("recompute queue lock poisoned".into()))?;
            jobs.push(conversation);
            Ok(())
        }
    }
}
