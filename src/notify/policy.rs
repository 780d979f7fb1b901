//! Per-participant eligibility and backoff rules.
//!
//! Each notification a participant receives without coming back to vote adds
//! a strike, and each strike lengthens the wait before the next one:
//!
//! | strikes | wait      |
//! |---------|-----------|
//! | 0       | 1 hour    |
//! | 1       | 2 hours   |
//! | 2       | 24 hours  |
//! | 3       | 48 hours  |
//! | ≥4      | never     |
//!
//! On top of the backoff, a participant is only notified if they are
//! subscribed, still have un-voted statements, and have not interacted within
//! the last five minutes (never interrupt someone mid-session).

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::types::NotificationCandidate;

/// Strike count at which a participant is never notified again.
pub const TERMINAL_STRIKE_COUNT: u32 = 4;

/// Minimum idle time since the participant's last vote or comment.
pub fn interaction_debounce() -> Duration {
    Duration::minutes(5)
}

/// Wait time before the next notification for a given strike count.
///
/// `None` means the participant is terminal and is never notified again,
/// regardless of elapsed time.
pub fn wait_time(strike_count: u32) -> Option<Duration> {
    match strike_count {
        0 => Some(Duration::hours(1)),
        1 => Some(Duration::hours(2)),
        2 => Some(Duration::hours(24)),
        3 => Some(Duration::hours(48)),
        _ => None,
    }
}

/// Why a candidate was excluded from a notification pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    /// Not subscribed to notifications.
    Unsubscribed,

    /// No un-voted statements remain; nothing to come back for.
    NothingRemaining,

    /// Strike count has reached the terminal ceiling.
    TerminalStrikes,

    /// Still inside the backoff window since the last notification.
    NotYetDue,

    /// Interacted within the debounce window; likely mid-session.
    RecentlyActive,
}

impl ExclusionReason {
    /// Whether this exclusion warrants re-queueing the conversation's task.
    ///
    /// Only timing-based exclusions do: the participant still has remaining
    /// content and is under the strike ceiling, they are just not due yet.
    pub fn needs_retry(&self) -> bool {
        matches!(self, ExclusionReason::NotYetDue | ExclusionReason::RecentlyActive)
    }
}

/// The outcome of evaluating one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    Excluded(ExclusionReason),
}

/// Evaluates the eligibility predicate for one candidate at `now`.
///
/// Predicates are checked in a fixed order and the first failure wins, so a
/// participant with nothing remaining reports `NothingRemaining` even if they
/// are also inside a backoff window. That ordering matters for the retry
/// decision: retries are only owed to candidates excluded *solely* by timing.
pub fn evaluate(
    candidate: &NotificationCandidate,
    remaining_unvoted: usize,
    now: DateTime<Utc>,
) -> Eligibility {
    if !candidate.subscribed {
        return Eligibility::Excluded(ExclusionReason::Unsubscribed);
    }

    if remaining_unvoted == 0 {
        return Eligibility::Excluded(ExclusionReason::NothingRemaining);
    }

    let Some(wait) = wait_time(candidate.strike_count) else {
        return Eligibility::Excluded(ExclusionReason::TerminalStrikes);
    };

    if let Some(last_notified) = candidate.last_notified_at {
        if now - last_notified < wait {
            return Eligibility::Excluded(ExclusionReason::NotYetDue);
        }
    }

    if let Some(last_interaction) = candidate.last_interaction_at {
        if now - last_interaction < interaction_debounce() {
            return Eligibility::Excluded(ExclusionReason::RecentlyActive);
        }
    }

    Eligibility::Eligible
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::types::{ConversationId, ParticipantId};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn candidate() -> NotificationCandidate {
        NotificationCandidate {
            participant: ParticipantId(1),
            conversation: ConversationId(1),
            email: Some("p@example.org".into()),
            subscribed: true,
            last_notified_at: None,
            last_interaction_at: None,
            strike_count: 0,
        }
    }

    // ─── Wait table ───

    #[test]
    fn wait_times_escalate() {
        assert_eq!(wait_time(0), Some(Duration::hours(1)));
        assert_eq!(wait_time(1), Some(Duration::hours(2)));
        assert_eq!(wait_time(2), Some(Duration::hours(24)));
        assert_eq!(wait_time(3), Some(Duration::hours(48)));
        assert_eq!(wait_time(4), None);
        assert_eq!(wait_time(100), None);
    }

    // ─── Predicates ───

    #[test]
    fn fresh_subscribed_candidate_is_eligible() {
        assert_eq!(evaluate(&candidate(), 3, now()), Eligibility::Eligible);
    }

    #[test]
    fn unsubscribed_is_excluded() {
        let c = NotificationCandidate {
            subscribed: false,
            ..candidate()
        };
        assert_eq!(
            evaluate(&c, 3, now()),
            Eligibility::Excluded(ExclusionReason::Unsubscribed)
        );
    }

    #[test]
    fn nothing_remaining_is_excluded() {
        assert_eq!(
            evaluate(&candidate(), 0, now()),
            Eligibility::Excluded(ExclusionReason::NothingRemaining)
        );
    }

    #[test]
    fn terminal_strikes_never_eligible_regardless_of_elapsed_time() {
        let c = NotificationCandidate {
            strike_count: TERMINAL_STRIKE_COUNT,
            last_notified_at: Some(now() - Duration::days(365)),
            ..candidate()
        };
        assert_eq!(
            evaluate(&c, 10, now()),
            Eligibility::Excluded(ExclusionReason::TerminalStrikes)
        );
    }

    #[test]
    fn inside_backoff_window_is_not_yet_due() {
        // Strike 1 requires a 2h wait; only 30 minutes have passed.
        let c = NotificationCandidate {
            strike_count: 1,
            last_notified_at: Some(now() - Duration::minutes(30)),
            ..candidate()
        };
        assert_eq!(
            evaluate(&c, 1, now()),
            Eligibility::Excluded(ExclusionReason::NotYetDue)
        );
    }

    #[test]
    fn exactly_at_wait_boundary_is_due() {
        let c = NotificationCandidate {
            strike_count: 0,
            last_notified_at: Some(now() - Duration::hours(1)),
            ..candidate()
        };
        assert_eq!(evaluate(&c, 1, now()), Eligibility::Eligible);
    }

    #[test]
    fn debounce_excludes_recent_interaction() {
        let c = NotificationCandidate {
            last_interaction_at: Some(now() - Duration::minutes(2)),
            ..candidate()
        };
        assert_eq!(
            evaluate(&c, 1, now()),
            Eligibility::Excluded(ExclusionReason::RecentlyActive)
        );
    }

    #[test]
    fn debounce_clears_after_five_minutes() {
        let c = NotificationCandidate {
            last_interaction_at: Some(now() - Duration::minutes(5)),
            ..candidate()
        };
        assert_eq!(evaluate(&c, 1, now()), Eligibility::Eligible);
    }

    #[test]
    fn first_failing_predicate_wins() {
        // Nothing remaining AND inside backoff: reported as NothingRemaining,
        // which does not warrant a retry.
        let c = NotificationCandidate {
            strike_count: 1,
            last_notified_at: Some(now() - Duration::minutes(10)),
            ..candidate()
        };
        let result = evaluate(&c, 0, now());
        assert_eq!(result, Eligibility::Excluded(ExclusionReason::NothingRemaining));
    }

    #[test]
    fn retry_worthiness_is_timing_only() {
        assert!(ExclusionReason::NotYetDue.needs_retry());
        assert!(ExclusionReason::RecentlyActive.needs_retry());
        assert!(!ExclusionReason::NothingRemaining.needs_retry());
        assert!(!ExclusionReason::TerminalStrikes.needs_retry());
        assert!(!ExclusionReason::Unsubscribed.needs_retry());
    }
}
