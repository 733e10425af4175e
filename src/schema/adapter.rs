//! Adapter from classification export records to engine events
//!
//! Parses CSV, NDJSON or JSON-array exports, pulls `started_at` / `finished_at`
//! out of the client metadata, parses every timestamp, and turns the
//! account id into an explicit optional value.

use std::collections::BTreeSet;

use crate::error::SessionError;
use crate::schema::record::{ClassificationRecord, CsvExportRow, FlexibleId};
use crate::schema::timestamp::TimestampParser;
use crate::types::ClassificationEvent;

/// Converts export records into [`ClassificationEvent`]s
#[derive(Debug, Clone, Default)]
pub struct ClassificationAdapter {
    parser: TimestampParser,
}

/// A record that failed conversion
#[derive(Debug)]
pub struct RecordIssue {
    pub index: usize,
    pub user_name: String,
    pub error: SessionError,
}

impl ClassificationAdapter {
    pub fn new(parser: TimestampParser) -> Self {
        Self { parser }
    }

    /// Parse a JSON string containing an array of records
    pub fn parse_array(json: &str) -> Result<Vec<ClassificationRecord>, SessionError> {
        let records: Vec<ClassificationRecord> = serde_json::from_str(json)?;
        Ok(records)
    }

    /// Parse NDJSON (one record per line, blank lines skipped)
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<ClassificationRecord>, SessionError> {
        let mut records = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<ClassificationRecord>(trimmed) {
                Ok(record) => records.push(record),
                Err(e) => {
                    return Err(SessionError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(records)
    }

    /// Parse a comma-separated export with a header row; unknown columns are ignored
    pub fn parse_csv(data: &str) -> Result<Vec<ClassificationRecord>, SessionError> {
        let mut reader = csv::ReaderBuilder::new().from_reader(data.as_bytes());
        let mut records = Vec::new();
        for row in reader.deserialize::<CsvExportRow>() {
            match row {
                Ok(row) => records.push(ClassificationRecord::from(row)),
                Err(e) => {
                    let line = e.position().map(|p| p.line()).unwrap_or_default();
                    return Err(SessionError::ParseError(format!(
                        "Failed to parse CSV line {}: {}",
                        line, e
                    )));
                }
            }
        }
        Ok(records)
    }

    /// Convert all records, failing on the first malformed one
    pub fn to_events(
        &self,
        records: &[ClassificationRecord],
    ) -> Result<Vec<ClassificationEvent>, SessionError> {
        records
            .iter()
            .enumerate()
            .map(|(index, record)| self.to_event(index, record))
            .collect()
    }

    /// Convert one record; `index` is only used in error messages
    pub fn to_event(
        &self,
        index: usize,
        record: &ClassificationRecord,
    ) -> Result<ClassificationEvent, SessionError> {
        let malformed =
            |what: String| SessionError::MalformedEvent(format!("record {index}: {what}"));

        if record.user_name.trim().is_empty() {
            return Err(malformed("user_name is blank".to_string()));
        }

        let created_at = self
            .parser
            .parse(&record.created_at)
            .map_err(|e| malformed(format!("created_at: {e}")))?;

        let metadata = extract_metadata(record.metadata.as_ref()).map_err(malformed)?;
        let started_raw = metadata_field(&metadata, "started_at").map_err(malformed)?;
        let finished_raw = metadata_field(&metadata, "finished_at").map_err(malformed)?;

        let started_at = self
            .parser
            .parse(&started_raw)
            .map_err(|e| malformed(format!("started_at: {e}")))?;
        let finished_at = self
            .parser
            .parse(&finished_raw)
            .map_err(|e| malformed(format!("finished_at: {e}")))?;

        let actor_numeric_id = numeric_user_id(record.user_id.as_ref()).map_err(malformed)?;

        Ok(ClassificationEvent {
            actor_id: record.user_name.clone(),
            actor_numeric_id,
            created_at,
            started_at,
            finished_at,
        })
    }

    /// Records that would fail conversion, in input order.
    ///
    /// Also flags anonymous user names that carry an account id, since the id
    /// alone decides whether an actor counts as registered.
    pub fn validate_records(&self, records: &[ClassificationRecord]) -> Vec<RecordIssue> {
        records
            .iter()
            .enumerate()
            .filter_map(|(index, record)| {
                let error = match self.to_event(index, record) {
                    Err(error) => error,
                    Ok(event) if record.is_anonymous() => {
                        let id = event.actor_numeric_id?;
                        SessionError::MalformedEvent(format!(
                            "record {index}: anonymous user_name '{}' carries user_id {id}",
                            record.user_name
                        ))
                    }
                    Ok(_) => return None,
                };
                Some(RecordIssue {
                    index,
                    user_name: record.user_name.clone(),
                    error,
                })
            })
            .collect()
    }
}

/// Number of distinct subjects referenced by the records
pub fn distinct_subjects(records: &[ClassificationRecord]) -> usize {
    records
        .iter()
        .filter_map(|r| r.subject_ids.as_ref())
        .flat_map(|ids| ids.canonical())
        .collect::<BTreeSet<_>>()
        .len()
}

fn extract_metadata(
    metadata: Option<&serde_json::Value>,
) -> Result<serde_json::Map<String, serde_json::Value>, String> {
    match metadata {
        None | Some(serde_json::Value::Null) => Err("metadata is missing".to_string()),
        Some(serde_json::Value::Object(map)) => Ok(map.clone()),
        Some(serde_json::Value::String(text)) => {
            match serde_json::from_str::<serde_json::Value>(text) {
                Ok(serde_json::Value::Object(map)) => Ok(map),
                Ok(_) => Err("metadata is not a JSON object".to_string()),
                Err(e) => Err(format!("metadata is not valid JSON: {e}")),
            }
        }
        Some(_) => Err("metadata is not a JSON object".to_string()),
    }
}

fn metadata_field(
    metadata: &serde_json::Map<String, serde_json::Value>,
    field: &str,
) -> Result<String, String> {
    match metadata.get(field) {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        Some(serde_json::Value::String(_)) | Some(serde_json::Value::Null) | None => {
            Err(format!("metadata.{field} is missing"))
        }
        Some(other) => Err(format!("metadata.{field} is not a string: {other}")),
    }
}

/// Blank or absent ids are anonymous; anything else must be plain digits
fn numeric_user_id(user_id: Option<&FlexibleId>) -> Result<Option<u64>, String> {
    let text = match user_id {
        None => return Ok(None),
        Some(FlexibleId::Number(n)) => return Ok(Some(*n)),
        Some(FlexibleId::Text(text)) => text.trim(),
    };
    if text.is_empty() {
        return Ok(None);
    }
    let not_numeric = || format!("user_id '{text}' is not a numeric id");

    // exports that went through a float column write "1234.0"
    let digits = match text.split_once('.') {
        None => text,
        Some((whole, zeros)) if !zeros.is_empty() && zeros.bytes().all(|b| b == b'0') => whole,
        Some(_) => return Err(not_numeric()),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(not_numeric());
    }
    digits.parse::<u64>().map(Some).map_err(|_| not_numeric())
}
