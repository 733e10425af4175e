//! Per-actor event timelines
//!
//! Groups a flat batch of classification events by actor and orders each
//! actor's events by `created_at`.

use std::collections::BTreeMap;

use crate::error::SessionError;
use crate::types::{ClassificationEvent, EventTimeline};

impl EventTimeline {
    /// Build a timeline from one actor's events.
    ///
    /// Events are stably sorted by `created_at`, so equal timestamps keep
    /// their input order. The numeric id is taken from the earliest event.
    pub fn new(
        actor_id: impl Into<String>,
        mut events: Vec<ClassificationEvent>,
    ) -> Result<Self, SessionError> {
        let actor_id = actor_id.into();
        if events.is_empty() {
            return Err(SessionError::InvariantViolation(format!(
                "timeline for actor {actor_id} has no events"
            )));
        }
        if let Some(stray) = events.iter().find(|e| e.actor_id != actor_id) {
            return Err(SessionError::InvariantViolation(format!(
                "event for actor {} placed in timeline of {actor_id}",
                stray.actor_id
            )));
        }

        events.sort_by_key(|e| e.created_at);
        let actor_numeric_id = events[0].actor_numeric_id;

        Ok(Self {
            actor_id,
            actor_numeric_id,
            events,
        })
    }
}

/// Group events into one timeline per actor, ordered by actor id
pub fn group_by_actor(
    events: Vec<ClassificationEvent>,
) -> Result<Vec<EventTimeline>, SessionError> {
    let mut by_actor: BTreeMap<String, Vec<ClassificationEvent>> = BTreeMap::new();
    for event in events {
        by_actor.entry(event.actor_id.clone()).or_default().push(event);
    }

    by_actor
        .into_iter()
        .map(|(actor_id, events)| EventTimeline::new(actor_id, events))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn event(actor: &str, minute: u32, tag_seconds: u32) -> ClassificationEvent {
        let created = Utc.with_ymd_and_hms(2016, 3, 1, 12, minute, 0).unwrap();
        ClassificationEvent {
            actor_id: actor.to_string(),
            actor_numeric_id: None,
            created_at: created,
            started_at: created,
            finished_at: created + chrono::Duration::seconds(tag_seconds as i64),
        }
    }

    #[test]
    fn test_sorts_by_created_at() {
        let timeline =
            EventTimeline::new("alice", vec![event("alice", 30, 1), event("alice", 10, 2)])
                .unwrap();
        let minutes: Vec<_> = timeline
            .events()
            .iter()
            .map(|e| e.created_at.format("%M").to_string())
            .collect();
        assert_eq!(minutes, vec!["10", "30"]);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let timeline = EventTimeline::new(
            "alice",
            vec![event("alice", 5, 3), event("alice", 5, 1), event("alice", 5, 2)],
        )
        .unwrap();
        let lengths: Vec<_> = timeline
            .events()
            .iter()
            .map(|e| e.class_length().num_seconds())
            .collect();
        assert_eq!(lengths, vec![3, 1, 2]);
    }

    #[test]
    fn test_empty_timeline_is_invariant_violation() {
        let result = EventTimeline::new("nobody", Vec::new());
        assert!(matches!(result, Err(SessionError::InvariantViolation(_))));
    }

    #[test]
    fn test_foreign_event_is_invariant_violation() {
        let result = EventTimeline::new("alice", vec![event("bob", 1, 1)]);
        assert!(matches!(result, Err(SessionError::InvariantViolation(_))));
    }

    #[test]
    fn test_group_by_actor() {
        let timelines = group_by_actor(vec![
            event("bob", 3, 1),
            event("alice", 2, 1),
            event("bob", 1, 1),
        ])
        .unwrap();

        assert_eq!(timelines.len(), 2);
        assert_eq!(timelines[0].actor_id(), "alice");
        assert_eq!(timelines[0].len(), 1);
        assert_eq!(timelines[1].actor_id(), "bob");
        assert_eq!(timelines[1].len(), 2);
        assert!(timelines[1].events()[0].created_at < timelines[1].events()[1].created_at);
    }

    #[test]
    fn test_numeric_id_from_earliest_event() {
        let mut late = event("carol", 50, 1);
        late.actor_numeric_id = Some(99);
        let mut early = event("carol", 10, 1);
        early.actor_numeric_id = Some(42);

        let timeline = EventTimeline::new("carol", vec![late, early]).unwrap();
        assert_eq!(timeline.actor_numeric_id(), Some(42));
    }
}
