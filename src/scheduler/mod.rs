//! The notification scheduler loop.
//!
//! One loop per worker process: claim a queued task, run the notification
//! pass for it, sleep a fixed interval, repeat. The loop is sequential within
//! a process; mutual exclusion across processes comes entirely from the
//! queue's atomic claim-and-delete, not from any in-process locking.
//!
//! A backing-store failure during claim or pass is logged and the loop
//! carries on at its next tick — no immediate retry, no crash. Shutdown is
//! observed between iterations only: once claimed, a task runs to completion
//! (a restart mid-pass can leave a participant un-notified until the next
//! natural trigger; see DESIGN.md).

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::clock::Clock;
use crate::notify::{run_notification_batch, BatchError, BatchOutcome, Mailer};
use crate::store::{RemainingCounter, Store};

/// Default fixed interval between poll attempts.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// What one poll attempt did.
#[derive(Debug)]
pub enum TickOutcome {
    /// The queue was empty.
    Idle,

    /// A task was claimed and its pass ran to completion.
    Processed(BatchOutcome),
}

/// Claims at most one task and runs its notification pass.
pub async fn scheduler_tick<S, R, M>(
    store: &S,
    remaining: &R,
    mailer: &M,
    clock: &dyn Clock,
) -> Result<TickOutcome, BatchError>
where
    S: Store,
    R: RemainingCounter,
    M: Mailer,
{
    let Some(task) = store.claim_next_task().await? else {
        return Ok(TickOutcome::Idle);
    };

    debug!(conversation = %task.conversation, "claimed notification task");
    let outcome = run_notification_batch(store, remaining, mailer, clock, &task).await?;
    Ok(TickOutcome::Processed(outcome))
}

/// Runs the scheduler loop until `shutdown` is cancelled.
///
/// Cancellation is honored between iterations; an in-flight pass is never
/// interrupted.
pub async fn run_scheduler_loop<S, R, M>(
    store: Arc<S>,
    remaining: Arc<R>,
    mailer: Arc<M>,
    clock: Arc<dyn Clock>,
    poll_interval: Duration,
    shutdown: CancellationToken,
) where
    S: Store,
    R: RemainingCounter,
    M: Mailer,
{
    info!(interval_secs = poll_interval.as_secs(), "notification scheduler started");

    loop {
        match scheduler_tick(&*store, &*remaining, &*mailer, &*clock).await {
            Ok(TickOutcome::Idle) => {}
            Ok(TickOutcome::Processed(outcome)) => {
                debug!(
                    conversation = %outcome.conversation,
                    notified = outcome.notified.len(),
                    "processed notification task"
                );
            }
            Err(e) => {
                error!(error = %e, "notification pass failed; continuing on next tick");
            }
        }

        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("notification scheduler stopping");
                break;
            }
            _ = tokio::time::sleep(poll_interval) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};

    use crate::notify::ExclusionReason;
    use crate::store::MemoryStore;
    use crate::test_utils::{candidate_at, FlakyStore, ManualClock, RecordingMailer};
    use crate::types::{ConversationId, NotificationTask, ParticipantId};

    const CONV: ConversationId = ConversationId(42);

    fn clock() -> ManualClock {
        ManualClock::at(Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap())
    }

    #[tokio::test]
    async fn tick_is_idle_on_empty_queue() {
        let store = MemoryStore::new();
        let mailer = RecordingMailer::new();
        let clock = clock();

        let outcome = scheduler_tick(&store, &store, &mailer, &clock).await.unwrap();
        assert!(matches!(outcome, TickOutcome::Idle));
    }

    // ─── End-to-end scenarios ───

    #[tokio::test]
    async fn vote_event_notifies_all_eligible_with_no_retry() {
        let store = MemoryStore::new();
        let mailer = RecordingMailer::new();
        let clock = clock();

        // 3 subscribed participants, no strikes, never notified, idle 10 min,
        // each with one statement remaining.
        for pid in 1..=3 {
            store.add_participant(candidate_at(
                CONV,
                pid,
                clock.now() - ChronoDuration::minutes(10),
            ));
            store.set_remaining(CONV, ParticipantId(pid), 1);
        }

        // The vote event enqueues the conversation's task.
        store.enqueue_task(CONV, clock.now()).await.unwrap();

        let outcome = scheduler_tick(&store, &store, &mailer, &clock).await.unwrap();
        let TickOutcome::Processed(batch) = outcome else {
            panic!("expected a processed task");
        };

        assert_eq!(batch.notified.len(), 3);
        assert_eq!(mailer.sent().len(), 3);
        assert!(!batch.retry_enqueued);
        assert_eq!(store.queued_len(), 0);
        for pid in 1..=3 {
            let row = store.participant(CONV, ParticipantId(pid)).unwrap();
            assert_eq!(row.strike_count, 1);
            assert_eq!(row.last_notified_at, Some(clock.now()));
        }
    }

    #[tokio::test]
    async fn participant_inside_backoff_causes_partial_pass_and_retry() {
        let store = MemoryStore::new();
        let mailer = RecordingMailer::new();
        let clock = clock();

        // A: strike 1, last notified 30 minutes ago (needs 2h) — held back.
        let mut a = candidate_at(CONV, 1, clock.now() - ChronoDuration::minutes(10));
        a.strike_count = 1;
        a.last_notified_at = Some(clock.now() - ChronoDuration::minutes(30));
        store.add_participant(a);
        // B and C: due.
        for pid in 2..=3 {
            store.add_participant(candidate_at(
                CONV,
                pid,
                clock.now() - ChronoDuration::minutes(10),
            ));
        }
        for pid in 1..=3 {
            store.set_remaining(CONV, ParticipantId(pid), 1);
        }
        store.enqueue_task(CONV, clock.now()).await.unwrap();

        let TickOutcome::Processed(batch) =
            scheduler_tick(&store, &store, &mailer, &clock).await.unwrap()
        else {
            panic!("expected a processed task");
        };

        assert_eq!(batch.notified, vec![ParticipantId(2), ParticipantId(3)]);
        assert_eq!(batch.excluded, vec![(ParticipantId(1), ExclusionReason::NotYetDue)]);
        assert!(batch.retry_enqueued);
        assert!(store.queued_task(CONV).is_some(), "task re-queued for A");

        // Once A's 2h wait has elapsed, the retried task notifies A alone.
        clock.advance(ChronoDuration::hours(2));
        let TickOutcome::Processed(batch) =
            scheduler_tick(&store, &store, &mailer, &clock).await.unwrap()
        else {
            panic!("expected a processed task");
        };
        assert_eq!(batch.notified, vec![ParticipantId(1)]);
        assert!(!batch.retry_enqueued);
        assert_eq!(store.queued_len(), 0);
    }

    // ─── Loop behavior ───

    #[tokio::test(start_paused = true)]
    async fn loop_processes_queued_tasks_and_stops_on_cancel() {
        let store = Arc::new(MemoryStore::new());
        let mailer = Arc::new(RecordingMailer::new());
        let clock: Arc<dyn Clock> = Arc::new(clock());

        store.add_participant(candidate_at(
            CONV,
            1,
            clock.now() - ChronoDuration::minutes(10),
        ));
        store.set_remaining(CONV, ParticipantId(1), 1);
        store.enqueue_task(CONV, clock.now()).await.unwrap();

        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(run_scheduler_loop(
            Arc::clone(&store),
            Arc::clone(&store),
            Arc::clone(&mailer),
            Arc::clone(&clock),
            Duration::from_secs(10),
            shutdown.clone(),
        ));

        // Let a few ticks elapse under the paused clock.
        tokio::time::sleep(Duration::from_secs(35)).await;
        shutdown.cancel();
        handle.await.unwrap();

        assert_eq!(mailer.sent().len(), 1);
        assert_eq!(store.queued_len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn loop_survives_store_failures() {
        let store = Arc::new(FlakyStore::new(MemoryStore::new()));
        let mailer = Arc::new(RecordingMailer::new());
        let clock_impl = clock();
        let clock: Arc<dyn Clock> = Arc::new(clock_impl);

        store.inner().add_participant(candidate_at(
            CONV,
            1,
            clock.now() - ChronoDuration::minutes(10),
        ));
        store.inner().set_remaining(CONV, ParticipantId(1), 1);
        store.inner().enqueue_task(CONV, clock.now()).await.unwrap();
        store.fail_claims(true);

        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(run_scheduler_loop(
            Arc::clone(&store),
            Arc::clone(&store),
            Arc::clone(&mailer),
            Arc::clone(&clock),
            Duration::from_secs(10),
            shutdown.clone(),
        ));

        // Claims fail for a while; the loop must keep ticking.
        tokio::time::sleep(Duration::from_secs(25)).await;
        assert_eq!(mailer.sent().len(), 0);

        // Once the store recovers, the queued task is processed.
        store.fail_claims(false);
        tokio::time::sleep(Duration::from_secs(25)).await;
        shutdown.cancel();
        handle.await.unwrap();

        assert_eq!(mailer.sent().len(), 1);
    }

    #[tokio::test]
    async fn task_is_claimed_by_exactly_one_of_many_loops() {
        // Correctness under concurrent schedulers rests on the claim, so
        // two ticks racing for one task must yield exactly one pass.
        let store = Arc::new(MemoryStore::new());
        let mailer = Arc::new(RecordingMailer::new());
        let clock = clock();

        store.add_participant(candidate_at(
            CONV,
            1,
            clock.now() - ChronoDuration::minutes(10),
        ));
        store.set_remaining(CONV, ParticipantId(1), 1);
        store.enqueue_task(CONV, clock.now()).await.unwrap();

        let (a, b) = tokio::join!(
            scheduler_tick(&*store, &*store, &*mailer, &clock),
            scheduler_tick(&*store, &*store, &*mailer, &clock),
        );
        let processed = [a.unwrap(), b.unwrap()]
            .into_iter()
            .filter(|t| matches!(t, TickOutcome::Processed(_)))
            .count();
        assert_eq!(processed, 1);
        assert_eq!(mailer.sent().len(), 1);
    }
}
