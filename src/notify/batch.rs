//! The notification pass run for one claimed task.
//!
//! # Algorithm
//!
//! 1. Load subscribed candidates not yet notified since the task's trigger.
//! 2. Ask the remaining-content collaborator for each candidate's un-voted
//!    statement count.
//! 3. Partition into eligible and excluded via the policy predicate.
//! 4. Send to each eligible candidate, then persist the backoff update.
//!    A failed send is logged and does not block the other recipients.
//! 5. If anyone was excluded purely on timing (not yet due, or mid-session),
//!    re-queue the conversation so the pass is retried later.
//!
//! Reprocessing is safe: eligibility is recomputed fresh from persisted state
//! on every pass, so an overlapping or repeated task cannot double-notify
//! anyone inside their backoff window.

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::clock::Clock;
use crate::store::{RemainingCounter, Store, StoreError};
use crate::types::{ConversationId, NotificationTask, ParticipantId};

use super::email::{compose_notification, EmailMessage, Mailer};
use super::policy::{evaluate, Eligibility, ExclusionReason};

/// What a notification pass did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    pub conversation: ConversationId,

    /// Participants who were sent an email and had their backoff advanced.
    pub notified: Vec<ParticipantId>,

    /// Participants evaluated but not notified, with the first failing
    /// predicate.
    pub excluded: Vec<(ParticipantId, ExclusionReason)>,

    /// Eligible participants whose send failed or who had no delivery
    /// address. Their backoff state is left untouched.
    pub send_failures: Vec<ParticipantId>,

    /// Whether the conversation's task was re-queued for a later pass.
    pub retry_enqueued: bool,
}

/// Errors that abort a notification pass.
///
/// Per-recipient send failures are NOT errors at this level; only
/// backing-store failures abort the pass, and the scheduler logs those and
/// moves on.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("store failure during notification pass: {0}")]
    Store(#[from] StoreError),
}

/// Runs the notification pass for one claimed task.
#[instrument(skip_all, fields(conversation = %task.conversation))]
pub async fn run_notification_batch<S, R, M>(
    store: &S,
    remaining: &R,
    mailer: &M,
    clock: &dyn Clock,
    task: &NotificationTask,
) -> Result<BatchOutcome, BatchError>
where
    S: Store,
    R: RemainingCounter,
    M: Mailer,
{
    let now = clock.now();
    let candidates = store
        .notification_candidates(task.conversation, task.triggered_at)
        .await?;
    debug!(candidates = candidates.len(), "loaded notification candidates");

    let mut outcome = BatchOutcome {
        conversation: task.conversation,
        notified: Vec::new(),
        excluded: Vec::new(),
        send_failures: Vec::new(),
        retry_enqueued: false,
    };

    for candidate in &candidates {
        let unvoted = remaining
            .remaining_unvoted(task.conversation, candidate.participant)
            .await?;

        match evaluate(candidate, unvoted, now) {
            Eligibility::Excluded(reason) => {
                debug!(participant = %candidate.participant, ?reason, "excluded");
                outcome.excluded.push((candidate.participant, reason));
            }
            Eligibility::Eligible => {
                let Some(email) = &candidate.email else {
                    warn!(participant = %candidate.participant, "eligible but has no delivery address");
                    outcome.send_failures.push(candidate.participant);
                    continue;
                };

                let (subject, body) = compose_notification(task.conversation, unvoted);
                let message = EmailMessage {
                    to: email.clone(),
                    subject,
                    body,
                };

                // Per-recipient isolation: a failed send is logged and the
                // rest of the batch proceeds.
                if let Err(e) = mailer.send(&message).await {
                    warn!(participant = %candidate.participant, error = %e, "notification send failed");
                    outcome.send_failures.push(candidate.participant);
                    continue;
                }

                store
                    .record_notification(task.conversation, candidate.participant, now)
                    .await?;
                outcome.notified.push(candidate.participant);
            }
        }
    }

    // Anyone held back purely on timing still has content waiting; queue
    // another pass so they are picked up once due.
    if outcome.excluded.iter().any(|(_, reason)| reason.needs_retry()) {
        store.enqueue_task(task.conversation, now).await?;
        outcome.retry_enqueued = true;
    }

    info!(
        notified = outcome.notified.len(),
        excluded = outcome.excluded.len(),
        send_failures = outcome.send_failures.len(),
        retry = outcome.retry_enqueued,
        "notification pass complete"
    );
    Ok(outcome)
}
