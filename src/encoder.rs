//! Output encoding
//!
//! Writes per-actor summary rows as CSV in a fixed column order, derives the
//! default output file name, and wraps the corpus summary in a JSON report.

use std::fmt::Write as _;
use std::io;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::types::{ClassificationEvent, CorpusSummary, UserSummaryRow};
use crate::{PRODUCER_NAME, SESSIONS_VERSION};

/// Default output path stem; the date range and `.csv` are appended
pub const DEFAULT_OUTPUT_STEM: &str = "data_out/session_stats";

/// Column order of the per-actor CSV
pub const CSV_COLUMNS: [&str; 24] = [
    "user_name",
    "user_id",
    "n_class",
    "n_sessions",
    "n_days",
    "first_day",
    "last_day",
    "tdiff_firstlast_hours",
    "time_spent_classifying_total_minutes",
    "class_per_session_min",
    "class_per_session_max",
    "class_per_session_med",
    "class_per_session_mean",
    "class_length_mean_overall",
    "class_length_median_overall",
    "session_length_mean",
    "session_length_median",
    "session_length_min",
    "session_length_max",
    "mean_session_length_first2",
    "mean_session_length_last2",
    "mean_class_length_first2",
    "mean_class_length_last2",
    "class_count_session_list",
];

/// How trend metrics are written when an actor has too few sessions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendPlaceholder {
    /// `NA`
    #[default]
    NotApplicable,
    /// `0`, for consumers that expect the legacy numeric placeholder
    Zero,
}

impl TrendPlaceholder {
    fn render(&self, value: Option<f64>) -> String {
        match (value, self) {
            (Some(v), _) => v.to_string(),
            (None, TrendPlaceholder::NotApplicable) => "NA".to_string(),
            (None, TrendPlaceholder::Zero) => "0".to_string(),
        }
    }
}

/// Header line (no trailing newline)
pub fn csv_header() -> String {
    CSV_COLUMNS.join(",")
}

fn row_fields(row: &UserSummaryRow, placeholder: TrendPlaceholder) -> [String; 24] {
    [
        row.actor_id.clone(),
        row.actor_numeric_id
            .map(|id| id.to_string())
            .unwrap_or_default(),
        row.n_class.to_string(),
        row.n_sessions.to_string(),
        row.n_days.to_string(),
        row.first_day.format("%Y-%m-%d").to_string(),
        row.last_day.format("%Y-%m-%d").to_string(),
        row.tdiff_firstlast_hours.to_string(),
        row.time_spent_classifying_total_minutes.to_string(),
        row.class_per_session_min.to_string(),
        row.class_per_session_max.to_string(),
        row.class_per_session_med.to_string(),
        row.class_per_session_mean.to_string(),
        row.class_length_mean_overall.to_string(),
        row.class_length_median_overall.to_string(),
        row.session_length_mean.to_string(),
        row.session_length_median.to_string(),
        row.session_length_min.to_string(),
        row.session_length_max.to_string(),
        placeholder.render(row.mean_session_length_first2),
        placeholder.render(row.mean_session_length_last2),
        placeholder.render(row.mean_class_length_first2),
        placeholder.render(row.mean_class_length_last2),
        render_count_list(&row.class_count_session_list),
    ]
}

fn csv_writer<W: io::Write>(out: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(out)
}

/// Write a header plus every row to `out`, newline-terminated
pub fn write_csv<W: io::Write>(
    out: W,
    rows: &[UserSummaryRow],
    placeholder: TrendPlaceholder,
) -> Result<(), SessionError> {
    let mut writer = csv_writer(out);
    writer.write_record(CSV_COLUMNS)?;
    for row in rows {
        writer.write_record(row_fields(row, placeholder))?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Render a header plus every row, newline-terminated
pub fn render_csv(
    rows: &[UserSummaryRow],
    placeholder: TrendPlaceholder,
) -> Result<String, SessionError> {
    let mut buf = Vec::new();
    write_csv(&mut buf, rows, placeholder)?;
    utf8(buf)
}

/// Render one summary row (no trailing newline)
pub fn render_row(
    row: &UserSummaryRow,
    placeholder: TrendPlaceholder,
) -> Result<String, SessionError> {
    let mut writer = csv_writer(Vec::new());
    writer.write_record(row_fields(row, placeholder))?;
    let buf = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    let line = utf8(buf)?;
    Ok(line.strip_suffix('\n').unwrap_or(&line).to_string())
}

fn utf8(buf: Vec<u8>) -> Result<String, SessionError> {
    String::from_utf8(buf)
        .map_err(|e| SessionError::InvariantViolation(format!("CSV output is not UTF-8: {e}")))
}

/// Per-session counts as `[3; 1; 2]`; commas are reserved for the row delimiter
pub fn render_count_list(counts: &[usize]) -> String {
    let items: Vec<String> = counts.iter().map(|c| c.to_string()).collect();
    format!("[{}]", items.join("; "))
}

/// Earliest and latest `created_at` dates in a batch
pub fn day_range(events: &[ClassificationEvent]) -> Option<(NaiveDate, NaiveDate)> {
    let first = events.iter().map(|e| e.created_day()).min()?;
    let last = events.iter().map(|e| e.created_day()).max()?;
    Some((first, last))
}

/// `<stem>_<first>_to_<last>.csv`
pub fn default_output_path(stem: &str, first_day: NaiveDate, last_day: NaiveDate) -> PathBuf {
    PathBuf::from(format!(
        "{stem}_{}_to_{}.csv",
        first_day.format("%Y-%m-%d"),
        last_day.format("%Y-%m-%d")
    ))
}

/// Corpus summary with producer metadata, for the reporting side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusReport {
    pub producer: String,
    pub version: String,
    pub session_break_minutes: f64,
    pub summary: CorpusSummary,
}

impl CorpusReport {
    pub fn new(summary: CorpusSummary, session_break_minutes: f64) -> Self {
        Self {
            producer: PRODUCER_NAME.to_string(),
            version: SESSIONS_VERSION.to_string(),
            session_break_minutes,
            summary,
        }
    }

    pub fn to_json(&self) -> Result<String, SessionError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Plain-text corpus summary for terminals
pub fn render_corpus_summary(summary: &CorpusSummary) -> String {
    let mut out = String::new();
    // writing to a String cannot fail
    let _ = writeln!(out, "Total classifications: {}", summary.total_classifications);
    let _ = writeln!(out, "Total subjects:        {}", summary.total_subjects);
    let _ = writeln!(
        out,
        "Total classifiers:     {} ({} registered, {} unregistered)",
        summary.total_actors, summary.registered_actors, summary.unregistered_actors
    );
    let _ = writeln!(
        out,
        "Classifications/user:  median {}, mean {:.2}",
        summary.median_classifications_per_actor, summary.mean_classifications_per_actor
    );
    let _ = writeln!(out, "Gini coefficient:      {:.4}", summary.gini_coefficient);
    let _ = writeln!(out, "\nTop classifiers:");
    for (rank, entry) in summary.leaderboard.iter().enumerate() {
        let _ = writeln!(out, "  {:>3}. {} ({})", rank + 1, entry.actor_id, entry.n_class);
    }
    out
}
