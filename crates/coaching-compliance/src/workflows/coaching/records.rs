use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io::Read;

use super::domain::WorkerId;

pub(crate) const FIELD_WORKER: &str = "Worker";
pub(crate) const FIELD_DIRECTOR: &str = "Brand Director";
pub(crate) const FIELD_MANAGER: &str = "Manager";
pub(crate) const FIELD_EMAIL: &str = "Work Email Address copy";
pub(crate) const FIELD_COACH: &str = "Coach";
pub(crate) const FIELD_TRAINEE: &str = "Trainee";

/// A record exactly as the data source returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub id: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl RawRecord {
    pub fn new(id: impl Into<String>, fields: Value) -> Self {
        let fields = match fields {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            id: id.into(),
            fields,
        }
    }

    /// First linked record id; linked fields arrive as arrays of ids.
    pub fn linked_id(&self, field: &str) -> Option<WorkerId> {
        first_text(self.fields.get(field)?).map(WorkerId)
    }

    /// Plain text value; lookup fields arrive as single-element arrays.
    pub fn text(&self, field: &str) -> Option<String> {
        first_text(self.fields.get(field)?)
    }
}

fn first_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(text) => Some(text.as_str()),
        Value::Array(items) => items.iter().find_map(Value::as_str),
        _ => None,
    }?;

    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Worker directory row with its reporting lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerRecord {
    pub id: WorkerId,
    pub name: Option<String>,
    pub email: Option<String>,
    pub manager_id: Option<WorkerId>,
    pub director_id: Option<WorkerId>,
}

impl From<&RawRecord> for WorkerRecord {
    fn from(record: &RawRecord) -> Self {
        Self {
            id: WorkerId(record.id.clone()),
            name: record.text(FIELD_WORKER),
            email: record.text(FIELD_EMAIL),
            manager_id: record.linked_id(FIELD_MANAGER),
            director_id: record.linked_id(FIELD_DIRECTOR),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoachingSessionRecord {
    pub coach_id: Option<WorkerId>,
    pub trainee_id: Option<WorkerId>,
}

impl From<&RawRecord> for CoachingSessionRecord {
    fn from(record: &RawRecord) -> Self {
        Self {
            coach_id: record.linked_id(FIELD_COACH),
            trainee_id: record.linked_id(FIELD_TRAINEE),
        }
    }
}

pub fn worker_records(records: &[RawRecord]) -> Vec<WorkerRecord> {
    records.iter().map(WorkerRecord::from).collect()
}

pub fn coaching_records(records: &[RawRecord]) -> Vec<CoachingSessionRecord> {
    records.iter().map(CoachingSessionRecord::from).collect()
}

#[derive(Debug, thiserror::Error)]
pub enum RecordExportError {
    #[error("failed to read record export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid record export: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RecordExport {
    Page { records: Vec<RawRecord> },
    Bare(Vec<RawRecord>),
}

impl RecordExport {
    fn into_records(self) -> Vec<RawRecord> {
        match self {
            RecordExport::Page { records } => records,
            RecordExport::Bare(records) => records,
        }
    }
}

/// Reads a saved export, either a `{"records": [...]}` page or a bare array.
pub fn read_export<R: Read>(reader: R) -> Result<Vec<RawRecord>, RecordExportError> {
    let export: RecordExport = serde_json::from_reader(reader)?;
    Ok(export.into_records())
}

/// Same as [`read_export`] for an already-parsed JSON document.
pub fn export_from_value(value: Value) -> Result<Vec<RawRecord>, RecordExportError> {
    let export: RecordExport = serde_json::from_value(value)?;
    Ok(export.into_records())
}
