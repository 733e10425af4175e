//! Classifier Sessions - session segmentation and engagement statistics
//!
//! Takes per-classifier activity logs (e.g. Zooniverse classification
//! exports) and runs a deterministic pipeline: ingestion → per-actor
//! timelines → gap-based session segmentation → per-session statistics →
//! one summary row per actor → corpus statistics (leaderboard, Gini).
//!
//! ## Modules
//!
//! - **Engine**: `timeline`, `segmenter`, `session_stats`, `user_stats`, `corpus`, `pipeline`
//! - **Ingestion**: `schema` reads export records and parses their timestamps
//! - **Output**: `encoder` renders CSV rows and the corpus report

pub mod config;
pub mod corpus;
pub mod encoder;
pub mod error;
pub mod pipeline;
pub mod schema;
pub mod segmenter;
pub mod session_stats;
pub mod stats;
pub mod timeline;
pub mod types;
pub mod user_stats;

pub use config::{NegativeLengthPolicy, SessionConfig};
pub use corpus::{gini_coefficient, CorpusStatsCalculator};
pub use encoder::{CorpusReport, TrendPlaceholder};
pub use error::SessionError;
pub use pipeline::{SessionProcessor, SessionReport};
pub use schema::{ClassificationAdapter, ClassificationRecord, TimestampParser};
pub use segmenter::SessionSegmenter;
pub use session_stats::SessionStatsCalculator;
pub use types::{
    ClassificationEvent, CorpusSummary, EventTimeline, LeaderboardEntry, Session, SessionStats,
    UserSummaryRow,
};
pub use user_stats::UserStatsAggregator;

/// Crate version embedded in corpus reports
pub const SESSIONS_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for corpus reports
pub const PRODUCER_NAME: &str = "classifier-sessions";
