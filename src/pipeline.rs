//! Session pipeline orchestration
//!
//! Events → per-actor timelines → sessions → summary rows → corpus summary.
//! The per-actor stage touches no shared state and can run on several
//! threads; the corpus stage joins on the complete set of rows.

use std::thread;

use serde::{Deserialize, Serialize};

use crate::config::SessionConfig;
use crate::corpus::CorpusStatsCalculator;
use crate::error::SessionError;
use crate::segmenter::SessionSegmenter;
use crate::session_stats::SessionStatsCalculator;
use crate::timeline::group_by_actor;
use crate::types::{ClassificationEvent, CorpusSummary, EventTimeline, UserSummaryRow};
use crate::user_stats::UserStatsAggregator;

/// Output of a full run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    /// One row per actor, ordered by actor id
    pub rows: Vec<UserSummaryRow>,
    pub corpus: CorpusSummary,
}

/// Runs the whole session analysis with a fixed configuration
#[derive(Debug, Clone)]
pub struct SessionProcessor {
    config: SessionConfig,
    segmenter: SessionSegmenter,
    aggregator: UserStatsAggregator,
    corpus: CorpusStatsCalculator,
}

impl SessionProcessor {
    /// Create a processor; fails if the configuration is out of range
    pub fn new(config: SessionConfig) -> Result<Self, SessionError> {
        config.validate()?;
        Ok(Self {
            segmenter: SessionSegmenter::new(config.session_break()),
            aggregator: UserStatsAggregator::new(SessionStatsCalculator::new(
                config.negative_length_policy,
            )),
            corpus: CorpusStatsCalculator::new(config.leaderboard_size),
            config,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Segment and summarize a single actor
    pub fn process_actor(&self, timeline: EventTimeline) -> Result<UserSummaryRow, SessionError> {
        let actor_id = timeline.actor_id().to_string();
        let actor_numeric_id = timeline.actor_numeric_id();
        let n_events = timeline.len();

        let sessions = self.segmenter.segment(timeline)?;
        tracing::debug!(
            actor_id = %actor_id,
            events = n_events,
            sessions = sessions.len(),
            "segmented actor timeline"
        );

        self.aggregator
            .aggregate(&actor_id, actor_numeric_id, &sessions)
    }

    /// One summary row per actor, ordered by actor id.
    ///
    /// The result does not depend on the number of workers.
    pub fn summarize_actors(
        &self,
        events: Vec<ClassificationEvent>,
    ) -> Result<Vec<UserSummaryRow>, SessionError> {
        let timelines = group_by_actor(events)?;
        let workers = self.config.workers.min(timelines.len()).max(1);

        if workers == 1 {
            return timelines
                .into_iter()
                .map(|t| self.process_actor(t))
                .collect();
        }

        let chunk_size = timelines.len().div_ceil(workers);
        let mut chunks: Vec<Vec<EventTimeline>> = Vec::with_capacity(workers);
        let mut remaining = timelines.into_iter().peekable();
        while remaining.peek().is_some() {
            chunks.push(remaining.by_ref().take(chunk_size).collect());
        }

        thread::scope(|scope| {
            let handles: Vec<_> = chunks
                .into_iter()
                .map(|chunk| {
                    scope.spawn(move || {
                        chunk
                            .into_iter()
                            .map(|t| self.process_actor(t))
                            .collect::<Result<Vec<_>, _>>()
                    })
                })
                .collect();

            let mut rows = Vec::new();
            for handle in handles {
                let chunk_rows = handle.join().map_err(|_| {
                    SessionError::InvariantViolation("actor worker thread panicked".to_string())
                })??;
                rows.extend(chunk_rows);
            }
            Ok(rows)
        })
    }

    /// Run the full analysis.
    ///
    /// `total_subjects` is passed through to the corpus summary.
    pub fn process(
        &self,
        events: Vec<ClassificationEvent>,
        total_subjects: usize,
    ) -> Result<SessionReport, SessionError> {
        if events.is_empty() {
            return Err(SessionError::NoActors);
        }
        let n_events = events.len();

        let rows = self.summarize_actors(events)?;
        let corpus = self.corpus.compute(&rows, total_subjects)?;

        tracing::info!(
            events = n_events,
            actors = corpus.total_actors,
            session_break_minutes = self.config.session_break_minutes,
            gini = corpus.gini_coefficient,
            "computed session statistics"
        );

        Ok(SessionReport { rows, corpus })
    }
}
