//! Shared test fixtures: a manual clock, a recording mailer, a fault-injecting
//! store wrapper, and candidate builders.

use std::collections::HashSet;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

use crate::clock::Clock;
use crate::notify::{EmailMessage, Mailer, SendError};
use crate::store::{MemoryStore, RemainingCounter, Store, StoreError};
use crate::types::{
    ComputedSnapshot, ConversationId, EmailAddress, MathTick, NotificationCandidate,
    NotificationTask, ParticipantId,
};

/// A clock pinned to an explicit instant, advanced by hand.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        ManualClock { now: Mutex::new(now) }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// A subscribed, never-notified, zero-strike candidate whose last interaction
/// was at `last_interaction_at`.
pub fn candidate_at(
    conversation: ConversationId,
    pid: u64,
    last_interaction_at: DateTime<Utc>,
) -> NotificationCandidate {
    NotificationCandidate {
        participant: ParticipantId(pid),
        conversation,
        email: Some(EmailAddress::new(format!("p{pid}@example.org"))),
        subscribed: true,
        last_notified_at: None,
        last_interaction_at: Some(last_interaction_at),
        strike_count: 0,
    }
}

/// A mailer that records messages and can be told to fail for an address.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<EmailMessage>>,
    failing: Mutex<HashSet<EmailAddress>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn fail_for(&self, address: EmailAddress) {
        self.failing.lock().unwrap().insert(address);
    }
}

impl Mailer for RecordingMailer {
    fn send(&self, message: &EmailMessage) -> impl Future<Output = Result<(), SendError>> + Send {
        let message = message.clone();
        async move {
            if self.failing.lock().unwrap().contains(&message.to) {
                return Err(SendError {
                    recipient: message.to,
                    reason: "injected failure".into(),
                });
            }
            self.sent.lock().unwrap().push(message);
            Ok(())
        }
    }
}

/// A store wrapper that injects claim failures on demand.
#[derive(Debug)]
pub struct FlakyStore {
    inner: MemoryStore,
    claims_fail: AtomicBool,
}

impl FlakyStore {
    pub fn new(inner: MemoryStore) -> Self {
        FlakyStore {
            inner,
            claims_fail: AtomicBool::new(false),
        }
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    pub fn fail_claims(&self, fail: bool) {
        self.claims_fail.store(fail, Ordering::SeqCst);
    }
}

impl Store for FlakyStore {
    fn enqueue_task(
        &self,
        conversation: ConversationId,
        triggered_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        self.inner.enqueue_task(conversation, triggered_at)
    }

    fn claim_next_task(
        &self,
    ) -> impl Future<Output = Result<Option<NotificationTask>, StoreError>> + Send {
        async move {
            if self.claims_fail.load(Ordering::SeqCst) {
                return Err(StoreError::Unavailable("injected claim failure".into()));
            }
            self.inner.claim_next_task().await
        }
    }

    fn notification_candidates(
        &self,
        conversation: ConversationId,
        notified_before: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<NotificationCandidate>, StoreError>> + Send {
        self.inner.notification_candidates(conversation, notified_before)
    }

    fn record_notification(
        &self,
        conversation: ConversationId,
        participant: ParticipantId,
        at: DateTime<Utc>,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        self.inner.record_notification(conversation, participant, at)
    }

    fn latest_snapshot(
        &self,
        conversation: ConversationId,
        newer_than: Option<MathTick>,
    ) -> impl Future<Output = Result<Option<ComputedSnapshot>, StoreError>> + Send {
        self.inner.latest_snapshot(conversation, newer_than)
    }
}

impl RemainingCounter for FlakyStore {
    fn remaining_unvoted(
        &self,
        conversation: ConversationId,
        participant: ParticipantId,
    ) -> impl Future<Output = Result<usize, StoreError>> + Send {
        self.inner.remaining_unvoted(conversation, participant)
    }
}

/// Builds a validated snapshot from literal membership/group data.
pub fn snapshot_with(
    conversation: ConversationId,
    math_tick: MathTick,
    base_cluster_ids: Vec<u32>,
    members: Vec<Vec<u64>>,
    groups: Vec<(u32, Vec<usize>)>,
) -> ComputedSnapshot {
    let members: Vec<Vec<ParticipantId>> = members
        .into_iter()
        .map(|l| l.into_iter().map(ParticipantId).collect())
        .collect();
    ComputedSnapshot::from_raw(crate::types::RawSnapshot {
        conversation,
        math_tick,
        base_cluster_ids: base_cluster_ids
            .into_iter()
            .map(crate::types::BaseClusterId)
            .collect(),
        base_cluster_members: members.clone(),
        index_to_participants: members,
        group_clusters: groups
            .into_iter()
            .map(|(id, member_base_cluster_indices)| crate::types::GroupCluster {
                id: crate::types::GroupId(id),
                member_base_cluster_indices,
            })
            .collect(),
    })
    .expect("literal snapshot data is consistent")
}
