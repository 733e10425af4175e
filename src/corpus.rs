//! Corpus-level statistics
//!
//! Runs once, after every actor's summary row exists: counts, the
//! registered/unregistered split, a leaderboard, and the Gini coefficient
//! of classifications per actor.

use crate::error::SessionError;
use crate::stats;
use crate::types::{CorpusSummary, LeaderboardEntry, UserSummaryRow};

/// Computes a [`CorpusSummary`] over all actors
#[derive(Debug, Clone, Copy)]
pub struct CorpusStatsCalculator {
    leaderboard_size: usize,
}

impl CorpusStatsCalculator {
    pub fn new(leaderboard_size: usize) -> Self {
        Self { leaderboard_size }
    }

    /// Summarize all actors.
    ///
    /// `total_subjects` is the distinct subject count of the input, which the
    /// rows themselves do not carry.
    pub fn compute(
        &self,
        rows: &[UserSummaryRow],
        total_subjects: usize,
    ) -> Result<CorpusSummary, SessionError> {
        if rows.is_empty() {
            return Err(SessionError::NoActors);
        }

        let counts: Vec<usize> = rows.iter().map(|r| r.n_class).collect();
        let count_values = stats::as_f64(&counts);
        let registered_actors = rows.iter().filter(|r| r.is_registered()).count();

        Ok(CorpusSummary {
            total_classifications: counts.iter().sum(),
            total_subjects,
            total_actors: rows.len(),
            registered_actors,
            unregistered_actors: rows.len() - registered_actors,
            median_classifications_per_actor: stats::median(&count_values).unwrap_or(0.0),
            mean_classifications_per_actor: stats::mean(&count_values).unwrap_or(0.0),
            leaderboard: self.leaderboard(rows),
            gini_coefficient: gini_coefficient(&counts),
        })
    }

    /// Top actors by classification count; ties go to the smaller actor id
    pub fn leaderboard(&self, rows: &[UserSummaryRow]) -> Vec<LeaderboardEntry> {
        let mut ranked: Vec<&UserSummaryRow> = rows.iter().collect();
        ranked.sort_by(|a, b| {
            b.n_class
                .cmp(&a.n_class)
                .then_with(|| a.actor_id.cmp(&b.actor_id))
        });
        ranked
            .into_iter()
            .take(self.leaderboard_size)
            .map(|r| LeaderboardEntry {
                actor_id: r.actor_id.clone(),
                n_class: r.n_class,
            })
            .collect()
    }
}

/// Gini coefficient of a count distribution.
///
/// Integrates the Lorenz curve with the trapezoidal rule over the counts in
/// ascending order and compares it against the line of perfect equality:
/// `(fair_area - area) / fair_area` with `fair_area = sum * n / 2`.
/// Returns 0 for empty or all-zero input.
pub fn gini_coefficient(counts: &[usize]) -> f64 {
    let mut sorted = counts.to_vec();
    sorted.sort_unstable();

    let mut height = 0.0;
    let mut area = 0.0;
    for &value in &sorted {
        let value = value as f64;
        height += value;
        area += height - value / 2.0;
    }

    let fair_area = height * sorted.len() as f64 / 2.0;
    if fair_area <= 0.0 {
        return 0.0;
    }
    (fair_area - area) / fair_area
}
