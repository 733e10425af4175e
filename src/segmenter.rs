//! Session segmentation
//!
//! Splits an actor's timeline into sessions wherever the idle gap between
//! consecutive `created_at` timestamps reaches the session break. The
//! threshold is closed: a gap exactly equal to the break starts a new session,
//! while duplicate timestamps (zero gap) never do.

use chrono::Duration;

use crate::error::SessionError;
use crate::types::{ClassificationEvent, EventTimeline, Session};

/// Gap-threshold session segmenter
#[derive(Debug, Clone, Copy)]
pub struct SessionSegmenter {
    session_break: Duration,
}

impl SessionSegmenter {
    pub fn new(session_break: Duration) -> Self {
        Self { session_break }
    }

    pub fn session_break(&self) -> Duration {
        self.session_break
    }

    /// Partition a timeline into ordered sessions covering every event once
    pub fn segment(&self, timeline: EventTimeline) -> Result<Vec<Session>, SessionError> {
        if timeline.is_empty() {
            return Err(SessionError::InvariantViolation(format!(
                "cannot segment empty timeline for actor {}",
                timeline.actor_id
            )));
        }

        let ordinals = self.session_ordinals(&timeline.events);
        let mut sessions: Vec<Session> = Vec::with_capacity(ordinals.last().copied().unwrap_or(0));

        for (event, ordinal) in timeline.events.into_iter().zip(ordinals) {
            match sessions.last_mut() {
                Some(current) if current.ordinal == ordinal => current.events.push(event),
                _ => sessions.push(Session {
                    ordinal,
                    events: vec![event],
                }),
            }
        }

        Ok(sessions)
    }

    /// 1-based session ordinal of every event, in one pass.
    ///
    /// Each ordinal is the number of session starts at or before that event.
    pub fn session_ordinals(&self, events: &[ClassificationEvent]) -> Vec<usize> {
        let mut ordinal = 0;
        let mut previous: Option<&ClassificationEvent> = None;

        events
            .iter()
            .map(|event| {
                let starts_session = match previous {
                    None => true,
                    Some(prev) => event.created_at - prev.created_at >= self.session_break,
                };
                if starts_session {
                    ordinal += 1;
                }
                previous = Some(event);
                ordinal
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2015, 6, 1, 9, 0, 0).unwrap()
    }

    fn timeline_at(minutes: &[i64]) -> EventTimeline {
        let events = minutes
            .iter()
            .map(|&m| {
                let t = base() + Duration::minutes(m);
                ClassificationEvent {
                    actor_id: "volunteer".to_string(),
                    actor_numeric_id: Some(7),
                    created_at: t,
                    started_at: t - Duration::seconds(30),
                    finished_at: t,
                }
            })
            .collect();
        EventTimeline::new("volunteer", events).unwrap()
    }

    fn minutes_of(session: &Session) -> Vec<i64> {
        session
            .events
            .iter()
            .map(|e| (e.created_at - base()).num_minutes())
            .collect()
    }

    #[test]
    fn test_gap_splits_sessions() {
        let segmenter = SessionSegmenter::new(Duration::minutes(60));
        let sessions = segmenter.segment(timeline_at(&[0, 10, 20, 130])).unwrap();

        assert_eq!(sessions.len(), 2);
        assert_eq!(minutes_of(&sessions[0]), vec![0, 10, 20]);
        assert_eq!(minutes_of(&sessions[1]), vec![130]);
        assert_eq!(sessions[0].ordinal, 1);
        assert_eq!(sessions[1].ordinal, 2);
    }

    #[test]
    fn test_single_event_is_one_session() {
        let segmenter = SessionSegmenter::new(Duration::minutes(60));
        let sessions = segmenter.segment(timeline_at(&[5])).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].events.len(), 1);
    }

    #[test]
    fn test_gap_equal_to_break_starts_session() {
        let segmenter = SessionSegmenter::new(Duration::minutes(60));
        let sessions = segmenter.segment(timeline_at(&[0, 60, 119])).unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(minutes_of(&sessions[1]), vec![60, 119]);
    }

    #[test]
    fn test_duplicate_timestamps_never_split() {
        let segmenter = SessionSegmenter::new(Duration::minutes(1));
        let sessions = segmenter.segment(timeline_at(&[0, 0, 0])).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].events.len(), 3);
    }

    #[test]
    fn test_partition_and_threshold_invariants() {
        let minutes = [0, 1, 2, 45, 200, 201, 260, 261, 262, 600, 600, 1000];
        let session_break = Duration::minutes(59);
        let segmenter = SessionSegmenter::new(session_break);
        let sessions = segmenter.segment(timeline_at(&minutes)).unwrap();

        // every event exactly once, in order
        let flattened: Vec<i64> = sessions.iter().flat_map(minutes_of).collect();
        assert_eq!(flattened, minutes.to_vec());

        for (i, session) in sessions.iter().enumerate() {
            assert_eq!(session.ordinal, i + 1);
            for pair in session.events.windows(2) {
                assert!(pair[1].created_at - pair[0].created_at < session_break);
            }
        }
        for pair in sessions.windows(2) {
            let last = pair[0].events.last().unwrap();
            let first = &pair[1].events[0];
            assert!(first.created_at - last.created_at >= session_break);
            assert!(first.created_at >= last.created_at);
        }
    }

    #[test]
    fn test_ordinals_are_non_decreasing() {
        let timeline = timeline_at(&[0, 100, 101, 300, 301, 302]);
        let segmenter = SessionSegmenter::new(Duration::minutes(60));
        let ordinals = segmenter.session_ordinals(timeline.events());
        assert_eq!(ordinals, vec![1, 2, 2, 3, 3, 3]);
    }

    #[test]
    fn test_segmentation_ignores_class_length() {
        let mut timeline = timeline_at(&[0, 10]);
        // a very long classification must not influence the idle gap
        timeline.events[0].finished_at = timeline.events[0].started_at + Duration::hours(5);
        let segmenter = SessionSegmenter::new(Duration::minutes(60));
        assert_eq!(segmenter.segment(timeline).unwrap().len(), 1);
    }
}
