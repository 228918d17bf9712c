// src/engine/time_budget.rs

use chrono::{DateTime, Duration, Utc};

/// Time remaining on an attempt, relative to the definition's optional
/// time limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeBudget {
    /// The definition carries no time limit.
    Unlimited,
    Remaining(Duration),
    /// Past the deadline by `overrun`. Submissions are still accepted and
    /// graded; enforcement is advisory.
    Expired { overrun: Duration },
}

impl TimeBudget {
    /// Seconds left for display purposes: `None` when unlimited, zero once
    /// the deadline has passed.
    pub fn remaining_seconds(&self) -> Option<i64> {
        match self {
            TimeBudget::Unlimited => None,
            TimeBudget::Remaining(left) => Some(left.num_seconds()),
            TimeBudget::Expired { .. } => Some(0),
        }
    }
}

/// Computes the budget for an attempt started at `started_at`.
pub fn remaining(
    started_at: DateTime<Utc>,
    time_limit_minutes: Option<i64>,
    now: DateTime<Utc>,
) -> TimeBudget {
    let Some(limit) = time_limit_minutes else {
        return TimeBudget::Unlimited;
    };

    let deadline = started_at + Duration::minutes(limit);
    if now <= deadline {
        TimeBudget::Remaining(deadline - now)
    } else {
        TimeBudget::Expired {
            overrun: now - deadline,
        }
    }
}

/// Elapsed seconds for the completion record.
///
/// Prefers the client-reported start instant when present (the client knows
/// when the questions were actually shown), falling back to the server-side
/// start. Clamped to zero so client clock skew can never record a negative
/// duration.
pub fn elapsed_seconds(
    client_started_at: Option<DateTime<Utc>>,
    server_started_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> i64 {
    let start = client_started_at.unwrap_or(server_started_at);
    (now - start).num_seconds().max(0)
}

/// Whether a late submission falls outside the configured grace window.
///
/// With no grace configured (the default) this never rejects: late
/// submissions are accepted with the true elapsed time recorded.
pub fn past_grace_window(
    started_at: DateTime<Utc>,
    time_limit_minutes: Option<i64>,
    grace_minutes: Option<i64>,
    now: DateTime<Utc>,
) -> bool {
    let (Some(limit), Some(grace)) = (time_limit_minutes, grace_minutes) else {
        return false;
    };

    now > started_at + Duration::minutes(limit + grace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn no_limit_means_unlimited() {
        assert_eq!(
            remaining(start(), None, start() + Duration::hours(40)),
            TimeBudget::Unlimited
        );
    }

    #[test]
    fn remaining_counts_down() {
        let budget = remaining(start(), Some(30), start() + Duration::minutes(10));
        assert_eq!(budget, TimeBudget::Remaining(Duration::minutes(20)));
    }

    #[test]
    fn expired_reports_overrun() {
        let budget = remaining(start(), Some(2), start() + Duration::minutes(5));
        assert_eq!(
            budget,
            TimeBudget::Expired {
                overrun: Duration::minutes(3)
            }
        );
    }

    #[test]
    fn elapsed_prefers_client_start() {
        let client = start() - Duration::minutes(5);
        let now = start() + Duration::minutes(1);
        assert_eq!(elapsed_seconds(Some(client), start(), now), 360);
    }

    #[test]
    fn elapsed_falls_back_to_server_start() {
        let now = start() + Duration::seconds(90);
        assert_eq!(elapsed_seconds(None, start(), now), 90);
    }

    #[test]
    fn elapsed_clamps_clock_skew_to_zero() {
        let client = start() + Duration::minutes(10);
        assert_eq!(elapsed_seconds(Some(client), start(), start()), 0);
    }

    #[test]
    fn no_grace_configured_never_rejects() {
        let late = start() + Duration::hours(3);
        assert!(!past_grace_window(start(), Some(2), None, late));
    }

    #[test]
    fn grace_window_rejects_only_past_limit_plus_grace() {
        let now = start() + Duration::minutes(11);
        assert!(!past_grace_window(start(), Some(10), Some(5), now));

        let now = start() + Duration::minutes(16);
        assert!(past_grace_window(start(), Some(10), Some(5), now));
    }
}
