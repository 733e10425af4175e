//! Core data types for session analysis
//!
//! These types flow through the pipeline: classification events are grouped
//! into per-actor timelines, segmented into sessions, summarized per session,
//! rolled up into one row per actor, and finally into a corpus summary.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One recorded classification by one actor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationEvent {
    /// Opaque actor identifier (registered user name or `not-logged-in-<hash>`)
    pub actor_id: String,
    /// Numeric account id; `None` for anonymous actors
    pub actor_numeric_id: Option<u64>,
    /// When the classification was recorded (ordering key)
    pub created_at: DateTime<Utc>,
    /// Client-reported start of the classification
    pub started_at: DateTime<Utc>,
    /// Client-reported end of the classification
    pub finished_at: DateTime<Utc>,
}

impl ClassificationEvent {
    /// Active time spent on this classification as reported by the client.
    ///
    /// May be negative when upstream data is inconsistent.
    pub fn class_length(&self) -> Duration {
        self.finished_at - self.started_at
    }

    /// UTC calendar date the event was recorded on
    pub fn created_day(&self) -> NaiveDate {
        self.created_at.date_naive()
    }
}

/// One actor's events, ascending by `created_at` (ties keep input order)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventTimeline {
    pub(crate) actor_id: String,
    pub(crate) actor_numeric_id: Option<u64>,
    pub(crate) events: Vec<ClassificationEvent>,
}

impl EventTimeline {
    pub fn actor_id(&self) -> &str {
        &self.actor_id
    }

    pub fn actor_numeric_id(&self) -> Option<u64> {
        self.actor_numeric_id
    }

    pub fn events(&self) -> &[ClassificationEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// A maximal run of events with no idle gap at or above the session break
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// 1-based position in the actor's timeline
    pub ordinal: usize,
    pub events: Vec<ClassificationEvent>,
}

/// Metrics for a single session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub ordinal: usize,
    pub class_count: usize,
    /// Sum of class lengths in minutes
    pub class_length_total: f64,
    /// Median class length in minutes
    pub class_length_median: f64,
    /// Individual class lengths in minutes, in timeline order
    pub class_lengths: Vec<f64>,
    /// `created_at` of the first event
    pub start: DateTime<Utc>,
    /// `created_at` of the last event
    pub end: DateTime<Utc>,
}

/// Per-actor summary row.
///
/// Field order is the output column order. Durations are minutes except
/// `tdiff_firstlast_hours`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummaryRow {
    #[serde(rename = "user_name")]
    pub actor_id: String,
    #[serde(rename = "user_id")]
    pub actor_numeric_id: Option<u64>,
    pub n_class: usize,
    pub n_sessions: usize,
    pub n_days: usize,
    pub first_day: NaiveDate,
    pub last_day: NaiveDate,
    pub tdiff_firstlast_hours: f64,
    pub time_spent_classifying_total_minutes: f64,
    pub class_per_session_min: usize,
    pub class_per_session_max: usize,
    pub class_per_session_med: f64,
    pub class_per_session_mean: f64,
    pub class_length_mean_overall: f64,
    pub class_length_median_overall: f64,
    pub session_length_mean: f64,
    pub session_length_median: f64,
    pub session_length_min: f64,
    pub session_length_max: f64,
    /// `None` when the actor has fewer than four sessions
    pub mean_session_length_first2: Option<f64>,
    pub mean_session_length_last2: Option<f64>,
    pub mean_class_length_first2: Option<f64>,
    pub mean_class_length_last2: Option<f64>,
    pub class_count_session_list: Vec<usize>,
}

impl UserSummaryRow {
    /// Whether the actor has a numeric account id
    pub fn is_registered(&self) -> bool {
        self.actor_numeric_id.is_some()
    }
}

/// One leaderboard position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub actor_id: String,
    pub n_class: usize,
}

/// Population-level statistics over all actors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusSummary {
    pub total_classifications: usize,
    pub total_subjects: usize,
    pub total_actors: usize,
    pub registered_actors: usize,
    pub unregistered_actors: usize,
    pub median_classifications_per_actor: f64,
    pub mean_classifications_per_actor: f64,
    /// Top actors by classification count, descending
    pub leaderboard: Vec<LeaderboardEntry>,
    pub gini_coefficient: f64,
}
