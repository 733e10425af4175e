//! Per-actor aggregation
//!
//! Rolls an actor's sessions up into a single [`UserSummaryRow`].

use std::collections::BTreeSet;

use crate::error::SessionError;
use crate::session_stats::SessionStatsCalculator;
use crate::stats;
use crate::types::{Session, SessionStats, UserSummaryRow};

/// Sessions needed before the first-two and last-two windows stop overlapping
pub const MIN_SESSIONS_FOR_TREND: usize = 4;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Builds one summary row from all of an actor's sessions
#[derive(Debug, Clone, Copy, Default)]
pub struct UserStatsAggregator {
    session_stats: SessionStatsCalculator,
}

impl UserStatsAggregator {
    pub fn new(session_stats: SessionStatsCalculator) -> Self {
        Self { session_stats }
    }

    /// Summarize an actor's ordered sessions
    pub fn aggregate(
        &self,
        actor_id: &str,
        actor_numeric_id: Option<u64>,
        sessions: &[Session],
    ) -> Result<UserSummaryRow, SessionError> {
        let events: Vec<_> = sessions.iter().flat_map(|s| s.events.iter()).collect();
        let (first, last) = match (events.first(), events.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => {
                return Err(SessionError::InvariantViolation(format!(
                    "actor {actor_id} has no sessions"
                )))
            }
        };

        let per_session = self.session_stats.compute_all(sessions)?;

        let counts: Vec<usize> = per_session.iter().map(|s| s.class_count).collect();
        let count_values = stats::as_f64(&counts);
        let totals: Vec<f64> = per_session.iter().map(|s| s.class_length_total).collect();
        let all_lengths: Vec<f64> = per_session
            .iter()
            .flat_map(|s| s.class_lengths.iter().copied())
            .collect();

        let days: BTreeSet<_> = events.iter().map(|e| e.created_day()).collect();

        let tdiff_firstlast_hours =
            (last.finished_at - first.started_at).num_milliseconds() as f64 / MILLIS_PER_HOUR;

        let trend = TrendWindows::from_sessions(&per_session);

        Ok(UserSummaryRow {
            actor_id: actor_id.to_string(),
            actor_numeric_id,
            n_class: events.len(),
            n_sessions: per_session.len(),
            n_days: days.len(),
            first_day: first.created_day(),
            last_day: last.created_day(),
            tdiff_firstlast_hours,
            time_spent_classifying_total_minutes: totals.iter().sum(),
            class_per_session_min: counts.iter().copied().min().unwrap_or(0),
            class_per_session_max: counts.iter().copied().max().unwrap_or(0),
            class_per_session_med: stats::median(&count_values).unwrap_or(0.0),
            class_per_session_mean: stats::mean(&count_values).unwrap_or(0.0),
            class_length_mean_overall: stats::mean(&all_lengths).unwrap_or(0.0),
            class_length_median_overall: stats::median(&all_lengths).unwrap_or(0.0),
            session_length_mean: stats::mean(&totals).unwrap_or(0.0),
            session_length_median: stats::median(&totals).unwrap_or(0.0),
            session_length_min: stats::min(&totals).unwrap_or(0.0),
            session_length_max: stats::max(&totals).unwrap_or(0.0),
            mean_session_length_first2: trend.map(|t| t.first.mean_session_length()),
            mean_session_length_last2: trend.map(|t| t.last.mean_session_length()),
            mean_class_length_first2: trend.map(|t| t.first.mean_class_length()),
            mean_class_length_last2: trend.map(|t| t.last.mean_class_length()),
            class_count_session_list: counts,
        })
    }
}

/// Combined totals of two sessions
#[derive(Debug, Clone, Copy)]
struct SessionPair {
    length_total: f64,
    class_count: usize,
}

impl SessionPair {
    fn of(a: &SessionStats, b: &SessionStats) -> Self {
        Self {
            length_total: a.class_length_total + b.class_length_total,
            class_count: a.class_count + b.class_count,
        }
    }

    fn mean_session_length(&self) -> f64 {
        self.length_total / 2.0
    }

    /// Weighted by event count, not a mean of per-session means
    fn mean_class_length(&self) -> f64 {
        self.length_total / self.class_count as f64
    }
}

/// First-two and last-two session windows, present only with enough sessions
#[derive(Debug, Clone, Copy)]
struct TrendWindows {
    first: SessionPair,
    last: SessionPair,
}

impl TrendWindows {
    fn from_sessions(sessions: &[SessionStats]) -> Option<Self> {
        let n = sessions.len();
        if n < MIN_SESSIONS_FOR_TREND {
            return None;
        }
        Some(Self {
            first: SessionPair::of(&sessions[0], &sessions[1]),
            last: SessionPair::of(&sessions[n - 2], &sessions[n - 1]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmenter::SessionSegmenter;
    use crate::types::{ClassificationEvent, EventTimeline};
    use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2015, 6, 1, 9, 0, 0).unwrap()
    }

    /// (minutes after base, class length in seconds)
    fn sessions_for(layout: &[(i64, i64)]) -> Vec<Session> {
        let events = layout
            .iter()
            .map(|&(minute, length)| {
                let started = base() + Duration::minutes(minute);
                ClassificationEvent {
                    actor_id: "volunteer".to_string(),
                    actor_numeric_id: Some(1234),
                    created_at: started + Duration::seconds(length),
                    started_at: started,
                    finished_at: started + Duration::seconds(length),
                }
            })
            .collect();
        let timeline = EventTimeline::new("volunteer", events).unwrap();
        SessionSegmenter::new(Duration::minutes(60))
            .segment(timeline)
            .unwrap()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_single_event_actor() {
        let sessions = sessions_for(&[(0, 300)]);
        let row = UserStatsAggregator::default()
            .aggregate("volunteer", None, &sessions)
            .unwrap();

        assert_eq!(row.n_class, 1);
        assert_eq!(row.n_sessions, 1);
        assert_eq!(row.n_days, 1);
        assert!(approx(row.time_spent_classifying_total_minutes, 5.0));
        assert!(approx(row.class_length_mean_overall, 5.0));
        assert!(approx(row.class_length_median_overall, 5.0));
        assert!(approx(row.session_length_min, 5.0));
        assert!(approx(row.session_length_max, 5.0));
        assert_eq!(row.mean_session_length_first2, None);
        assert_eq!(row.mean_session_length_last2, None);
        assert_eq!(row.mean_class_length_first2, None);
        assert_eq!(row.mean_class_length_last2, None);
        assert_eq!(row.class_count_session_list, vec![1]);
        assert!(!row.is_registered());
    }

    #[test]
    fn test_multi_session_distribution() {
        // sessions: {0, 10, 20} | {200} | {400, 405}
        let sessions = sessions_for(&[(0, 60), (10, 120), (20, 60), (200, 240), (400, 60), (405, 180)]);
        let row = UserStatsAggregator::default()
            .aggregate("volunteer", Some(1234), &sessions)
            .unwrap();

        assert_eq!(row.actor_numeric_id, Some(1234));
        assert_eq!(row.n_class, 6);
        assert_eq!(row.n_sessions, 3);
        assert_eq!(row.class_count_session_list, vec![3, 1, 2]);
        assert_eq!(row.class_per_session_min, 1);
        assert_eq!(row.class_per_session_max, 3);
        assert!(approx(row.class_per_session_med, 2.0));
        assert!(approx(row.class_per_session_mean, 2.0));

        // session totals: 4, 4, 4 minutes
        assert!(approx(row.time_spent_classifying_total_minutes, 12.0));
        assert!(approx(row.session_length_mean, 4.0));
        assert!(approx(row.session_length_median, 4.0));

        // lengths [1, 2, 1, 4, 1, 3]
        assert!(approx(row.class_length_mean_overall, 2.0));
        assert!(approx(row.class_length_median_overall, 1.5));

        // started 09:00, last finished 09:00 + 405 min + 3 min
        assert!(approx(row.tdiff_firstlast_hours, 408.0 / 60.0));
        assert_eq!(row.mean_session_length_first2, None);
    }

    #[test]
    fn test_trend_metrics_with_four_sessions() {
        // session totals (minutes): 2, 3 | 1 | 10, with counts 2, 1, 1, 2
        let sessions = sessions_for(&[
            (0, 60),
            (5, 60),
            (100, 180),
            (200, 60),
            (300, 300),
            (310, 300),
        ]);
        let row = UserStatsAggregator::default()
            .aggregate("volunteer", Some(1234), &sessions)
            .unwrap();

        assert_eq!(row.n_sessions, 4);
        assert_eq!(row.class_count_session_list, vec![2, 1, 1, 2]);
        assert!(approx(row.mean_session_length_first2.unwrap(), 2.5));
        assert!(approx(row.mean_session_length_last2.unwrap(), 5.5));
        // weighted: (2 + 3) / (2 + 1) and (1 + 10) / (1 + 2)
        assert!(approx(row.mean_class_length_first2.unwrap(), 5.0 / 3.0));
        assert!(approx(row.mean_class_length_last2.unwrap(), 11.0 / 3.0));
    }

    #[test]
    fn test_days_span() {
        let sessions = sessions_for(&[(0, 60), (24 * 60, 60), (24 * 60 + 5, 60), (3 * 24 * 60, 60)]);
        let row = UserStatsAggregator::default()
            .aggregate("volunteer", None, &sessions)
            .unwrap();

        assert_eq!(row.n_days, 3);
        assert_eq!(row.first_day, NaiveDate::from_ymd_opt(2015, 6, 1).unwrap());
        assert_eq!(row.last_day, NaiveDate::from_ymd_opt(2015, 6, 4).unwrap());
    }

    #[test]
    fn test_no_sessions_is_invariant_violation() {
        let result = UserStatsAggregator::default().aggregate("ghost", None, &[]);
        assert!(matches!(result, Err(SessionError::InvariantViolation(_))));
    }
}
