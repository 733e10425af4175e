//! Engine configuration
//!
//! All tunables are carried in an explicit [`SessionConfig`] handed to the
//! processor at construction time.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// Default idle gap (minutes) that starts a new session
pub const DEFAULT_SESSION_BREAK_MINUTES: f64 = 60.0;

/// Default number of actors kept in the corpus leaderboard
pub const DEFAULT_LEADERBOARD_SIZE: usize = 10;

/// What to do with an event whose `finished_at` precedes its `started_at`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NegativeLengthPolicy {
    /// Fail the run with [`SessionError::NegativeClassLength`]
    #[default]
    Reject,
    /// Treat the class length as zero and log a warning
    Clamp,
}

/// Configuration for session segmentation and statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Minimum idle gap (minutes) between consecutive events that starts a new session
    pub session_break_minutes: f64,
    /// Number of actors in the corpus leaderboard
    pub leaderboard_size: usize,
    /// Handling of `finished_at < started_at`
    pub negative_length_policy: NegativeLengthPolicy,
    /// Worker threads for the per-actor stage (1 = run on the calling thread)
    pub workers: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_break_minutes: DEFAULT_SESSION_BREAK_MINUTES,
            leaderboard_size: DEFAULT_LEADERBOARD_SIZE,
            negative_length_policy: NegativeLengthPolicy::Reject,
            workers: 1,
        }
    }
}

impl SessionConfig {
    pub fn with_session_break(mut self, minutes: f64) -> Self {
        self.session_break_minutes = minutes;
        self
    }

    pub fn with_leaderboard_size(mut self, size: usize) -> Self {
        self.leaderboard_size = size;
        self
    }

    pub fn with_negative_length_policy(mut self, policy: NegativeLengthPolicy) -> Self {
        self.negative_length_policy = policy;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Parse a configuration from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, SessionError> {
        let config: SessionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every tunable is in range
    pub fn validate(&self) -> Result<(), SessionError> {
        if !self.session_break_minutes.is_finite() || self.session_break_minutes <= 0.0 {
            return Err(SessionError::InvalidConfig(format!(
                "session_break_minutes must be a positive number, got {}",
                self.session_break_minutes
            )));
        }
        if self.session_break_millis() < 1.0 {
            return Err(SessionError::InvalidConfig(format!(
                "session_break_minutes must be at least one millisecond, got {}",
                self.session_break_minutes
            )));
        }
        if self.leaderboard_size == 0 {
            return Err(SessionError::InvalidConfig(
                "leaderboard_size must be at least 1".to_string(),
            ));
        }
        if self.workers == 0 {
            return Err(SessionError::InvalidConfig(
                "workers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// The session break as an exact duration, rounded to the nearest millisecond
    pub fn session_break(&self) -> Duration {
        Duration::milliseconds(self.session_break_millis() as i64)
    }

    fn session_break_millis(&self) -> f64 {
        (self.session_break_minutes * 60_000.0).round()
    }
}
