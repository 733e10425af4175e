//! Classification export record
//!
//! One row of a Panoptes classification export, carried as JSON or as a CSV
//! line. Only the fields session analysis needs are modeled; anything else in
//! the row is ignored on deserialization.

use serde::{Deserialize, Serialize};

/// Prefix Panoptes gives the `user_name` of anonymous classifiers
pub const ANONYMOUS_PREFIX: &str = "not-logged-in";

/// An identifier that exports write either as a number or as a string
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlexibleId {
    Number(u64),
    Text(String),
}

impl FlexibleId {
    /// Canonical textual form, used to compare ids across representations
    pub fn canonical(&self) -> String {
        match self {
            FlexibleId::Number(n) => n.to_string(),
            FlexibleId::Text(s) => s.trim().to_string(),
        }
    }
}

/// Subject ids: a single id or a list of ids
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubjectIds {
    One(FlexibleId),
    Many(Vec<FlexibleId>),
}

impl SubjectIds {
    /// Non-blank ids in canonical form
    pub fn canonical(&self) -> Vec<String> {
        let ids: Vec<&FlexibleId> = match self {
            SubjectIds::One(id) => vec![id],
            SubjectIds::Many(ids) => ids.iter().collect(),
        };
        ids.into_iter()
            .map(FlexibleId::canonical)
            .filter(|id| !id.is_empty())
            .collect()
    }
}

/// One exported classification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification_id: Option<FlexibleId>,
    /// Registered login, or `not-logged-in-<hashed ip>`
    pub user_name: String,
    /// Numeric account id; blank or null for anonymous classifiers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<FlexibleId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<FlexibleId>,
    /// Server-side record time
    pub created_at: String,
    /// Client metadata: a JSON object, or a string holding one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_ids: Option<SubjectIds>,
}

impl ClassificationRecord {
    pub fn is_anonymous(&self) -> bool {
        self.user_name.starts_with(ANONYMOUS_PREFIX)
    }
}

/// A row of the comma-separated export, where every cell is text and
/// `metadata` holds a JSON document
#[derive(Debug, Clone, Deserialize)]
pub struct CsvExportRow {
    #[serde(default)]
    pub classification_id: String,
    pub user_name: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub workflow_id: String,
    pub created_at: String,
    #[serde(default)]
    pub metadata: String,
    #[serde(default)]
    pub subject_ids: String,
}

fn non_blank(cell: String) -> Option<String> {
    if cell.trim().is_empty() {
        None
    } else {
        Some(cell)
    }
}

impl From<CsvExportRow> for ClassificationRecord {
    fn from(row: CsvExportRow) -> Self {
        Self {
            classification_id: non_blank(row.classification_id).map(FlexibleId::Text),
            user_name: row.user_name,
            user_id: non_blank(row.user_id).map(FlexibleId::Text),
            workflow_id: non_blank(row.workflow_id).map(FlexibleId::Text),
            created_at: row.created_at,
            metadata: non_blank(row.metadata).map(serde_json::Value::String),
            subject_ids: non_blank(row.subject_ids).map(|id| SubjectIds::One(FlexibleId::Text(id))),
        }
    }
}
