//! Error types for classifier session analysis

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during ingestion or computation
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Malformed classification event: {0}")]
    MalformedEvent(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Negative class length for actor {actor_id} at {created_at}: finished_at precedes started_at")]
    NegativeClassLength {
        actor_id: String,
        created_at: DateTime<Utc>,
    },

    #[error("No actors to summarize")]
    NoActors,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to parse classification export: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Date parse error: {0}")]
    DateParseError(String),
}
