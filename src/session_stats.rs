//! Per-session statistics
//!
//! Class length is the client-reported active time `finished_at - started_at`.
//! It is unrelated to the idle gaps used for segmentation.

use crate::config::NegativeLengthPolicy;
use crate::error::SessionError;
use crate::stats;
use crate::types::{ClassificationEvent, Session, SessionStats};

const MILLIS_PER_MINUTE: f64 = 60_000.0;

/// Computes [`SessionStats`] for one session at a time
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionStatsCalculator {
    negative_length_policy: NegativeLengthPolicy,
}

impl SessionStatsCalculator {
    pub fn new(negative_length_policy: NegativeLengthPolicy) -> Self {
        Self {
            negative_length_policy,
        }
    }

    /// Class length of one event in minutes, after applying the negative-length policy
    pub fn class_length_minutes(&self, event: &ClassificationEvent) -> Result<f64, SessionError> {
        let minutes = event.class_length().num_milliseconds() as f64 / MILLIS_PER_MINUTE;
        if minutes >= 0.0 {
            return Ok(minutes);
        }

        match self.negative_length_policy {
            NegativeLengthPolicy::Reject => Err(SessionError::NegativeClassLength {
                actor_id: event.actor_id.clone(),
                created_at: event.created_at,
            }),
            NegativeLengthPolicy::Clamp => {
                tracing::warn!(
                    actor_id = %event.actor_id,
                    created_at = %event.created_at,
                    minutes,
                    "clamping negative class length to zero"
                );
                Ok(0.0)
            }
        }
    }

    /// Compute statistics for a session
    pub fn compute(&self, session: &Session) -> Result<SessionStats, SessionError> {
        let (first, last) = match (session.events.first(), session.events.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => {
                return Err(SessionError::InvariantViolation(format!(
                    "session {} has no events",
                    session.ordinal
                )))
            }
        };

        let class_lengths = session
            .events
            .iter()
            .map(|e| self.class_length_minutes(e))
            .collect::<Result<Vec<f64>, _>>()?;

        let class_length_total = class_lengths.iter().sum();
        let class_length_median = stats::median(&class_lengths).unwrap_or(0.0);

        Ok(SessionStats {
            ordinal: session.ordinal,
            class_count: session.events.len(),
            class_length_total,
            class_length_median,
            class_lengths,
            start: first.created_at,
            end: last.created_at,
        })
    }

    /// Compute statistics for every session, preserving order
    pub fn compute_all(&self, sessions: &[Session]) -> Result<Vec<SessionStats>, SessionError> {
        sessions.iter().map(|s| self.compute(s)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2015, 6, 1, 9, 0, 0).unwrap()
    }

    fn event(created_min: i64, length_secs: i64) -> ClassificationEvent {
        let created = base() + Duration::minutes(created_min);
        ClassificationEvent {
            actor_id: "volunteer".to_string(),
            actor_numeric_id: None,
            created_at: created,
            started_at: created - Duration::seconds(length_secs),
            finished_at: created,
        }
    }

    fn session(events: Vec<ClassificationEvent>) -> Session {
        Session { ordinal: 1, events }
    }

    #[test]
    fn test_single_event_session() {
        let calc = SessionStatsCalculator::default();
        let stats = calc.compute(&session(vec![event(0, 300)])).unwrap();

        assert_eq!(stats.class_count, 1);
        assert!((stats.class_length_total - 5.0).abs() < 1e-9);
        assert!((stats.class_length_median - 5.0).abs() < 1e-9);
        assert_eq!(stats.start, stats.end);
    }

    #[test]
    fn test_totals_and_median() {
        let calc = SessionStatsCalculator::default();
        let stats = calc
            .compute(&session(vec![event(0, 60), event(5, 180), event(9, 120), event(12, 600)]))
            .unwrap();

        assert_eq!(stats.class_count, 4);
        // 1 + 3 + 2 + 10 minutes
        assert!((stats.class_length_total - 16.0).abs() < 1e-9);
        // median of [1, 2, 3, 10]
        assert!((stats.class_length_median - 2.5).abs() < 1e-9);
        assert_eq!(stats.start, base());
        assert_eq!(stats.end, base() + Duration::minutes(12));
        assert_eq!(stats.class_lengths, vec![1.0, 3.0, 2.0, 10.0]);
    }

    #[test]
    fn test_length_uses_client_timing_not_gaps() {
        let calc = SessionStatsCalculator::default();
        // 50 minutes idle between events, but each classification took 30 seconds
        let stats = calc
            .compute(&session(vec![event(0, 30), event(50, 30)]))
            .unwrap();
        assert!((stats.class_length_total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_negative_length_rejected_by_default() {
        let calc = SessionStatsCalculator::default();
        let result = calc.compute(&session(vec![event(0, -60)]));
        assert!(matches!(
            result,
            Err(SessionError::NegativeClassLength { .. })
        ));
    }

    #[test]
    fn test_negative_length_clamped() {
        let calc = SessionStatsCalculator::new(NegativeLengthPolicy::Clamp);
        let stats = calc
            .compute(&session(vec![event(0, -60), event(1, 120)]))
            .unwrap();
        assert_eq!(stats.class_lengths, vec![0.0, 2.0]);
        assert!((stats.class_length_total - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_session_is_invariant_violation() {
        let calc = SessionStatsCalculator::default();
        let result = calc.compute(&session(Vec::new()));
        assert!(matches!(result, Err(SessionError::InvariantViolation(_))));
    }
}
