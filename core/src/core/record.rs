// sluice/src/core/record.rs

//! The data threaded through a pipeline run: `PipelineRecord`, its
//! stage-specific `Payload`, and the store-facing item shapes.

use crate::error::ErrorKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One extracted row: header name to a JSON number or string.
pub type ExtractedRow = serde_json::Map<String, serde_json::Value>;

/// One store-ready item: field name to a typed attribute.
pub type StoreItem = BTreeMap<String, AttributeValue>;

/// Identity of the file that triggered a run.
///
/// Fields are private so the location cannot change once a record is built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
  #[serde(rename = "sourceContainer")]
  container: String,
  #[serde(rename = "sourceKey")]
  key: String,
}

impl SourceLocation {
  pub fn new(container: impl Into<String>, key: impl Into<String>) -> Self {
    Self {
      container: container.into(),
      key: key.into(),
    }
  }

  pub fn container(&self) -> &str {
    &self.container
  }

  pub fn key(&self) -> &str {
    &self.key
  }
}

impl fmt::Display for SourceLocation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}", self.container, self.key)
  }
}

/// A typed attribute in the shape a key-value document store expects:
/// `{"S": "alice"}` or `{"N": "30"}`. Numbers travel as their decimal text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeValue {
  S(String),
  N(String),
}

impl AttributeValue {
  pub fn as_text(&self) -> &str {
    match self {
      AttributeValue::S(s) | AttributeValue::N(s) => s,
    }
  }
}

/// Stage-specific data carried by a record. Each stage replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "camelCase")]
pub enum Payload {
  /// Nothing but the source location; the file itself has not been read.
  Source,
  #[serde(rename_all = "camelCase")]
  Validated {
    content_length: u64,
    content_type: String,
  },
  Rows(Vec<ExtractedRow>),
  Items(Vec<StoreItem>),
  Persisted {
    keys: Vec<String>,
  },
  #[serde(rename_all = "camelCase")]
  Notified {
    message_id: String,
  },
}

impl Payload {
  pub fn kind(&self) -> PayloadKind {
    match self {
      Payload::Source => PayloadKind::Source,
      Payload::Validated { .. } => PayloadKind::Validated,
      Payload::Rows(_) => PayloadKind::Rows,
      Payload::Items(_) => PayloadKind::Items,
      Payload::Persisted { .. } => PayloadKind::Persisted,
      Payload::Notified { .. } => PayloadKind::Notified,
    }
  }
}

/// The schema tag a stage declares for its input and output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadKind {
  Source,
  Validated,
  Rows,
  Items,
  Persisted,
  Notified,
}

impl fmt::Display for PayloadKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      PayloadKind::Source => "source",
      PayloadKind::Validated => "validated",
      PayloadKind::Rows => "rows",
      PayloadKind::Items => "items",
      PayloadKind::Persisted => "persisted",
      PayloadKind::Notified => "notified",
    };
    f.write_str(name)
  }
}

/// The `(stage, kind, message)` triple attached to a record on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
  pub stage: String,
  pub kind: ErrorKind,
  pub message: String,
}

/// The unit threaded through the pipeline for one triggering event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RecordWire", into = "RecordWire")]
pub struct PipelineRecord {
  source: SourceLocation,
  payload: Payload,
  error_info: Option<ErrorInfo>,
}

// Spelled out instead of `#[serde(flatten)]`: flattened structs are buffered,
// and buffered numbers cannot be read back under `arbitrary_precision`.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordWire {
  source_container: String,
  source_key: String,
  payload: Payload,
  #[serde(skip_serializing_if = "Option::is_none", default)]
  error_info: Option<ErrorInfo>,
}

impl From<RecordWire> for PipelineRecord {
  fn from(wire: RecordWire) -> Self {
    Self {
      source: SourceLocation::new(wire.source_container, wire.source_key),
      payload: wire.payload,
      error_info: wire.error_info,
    }
  }
}

impl From<PipelineRecord> for RecordWire {
  fn from(record: PipelineRecord) -> Self {
    Self {
      source_container: record.source.container,
      source_key: record.source.key,
      payload: record.payload,
      error_info: record.error_info,
    }
  }
}

impl PipelineRecord {
  /// A fresh record for a newly arrived file.
  pub fn new(source: SourceLocation) -> Self {
    Self {
      source,
      payload: Payload::Source,
      error_info: None,
    }
  }

  pub fn source(&self) -> &SourceLocation {
    &self.source
  }

  pub fn payload(&self) -> &Payload {
    &self.payload
  }

  pub fn error_info(&self) -> Option<&ErrorInfo> {
    self.error_info.as_ref()
  }

  pub(crate) fn replace_payload(&mut self, payload: Payload) -> Payload {
    std::mem::replace(&mut self.payload, payload)
  }

  /// Records the failure. The first failure wins; later calls are ignored.
  pub(crate) fn attach_error(&mut self, info: ErrorInfo) {
    if self.error_info.is_none() {
      self.error_info = Some(info);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn record_wire_shape_inlines_source_location() {
    let mut record = PipelineRecord::new(SourceLocation::new("uploads", "2024/people.csv"));
    record.attach_error(ErrorInfo {
      stage: "Validate".to_string(),
      kind: ErrorKind::ValidationError,
      message: "too large".to_string(),
    });

    let value = serde_json::to_value(&record).unwrap();
    assert_eq!(
      value,
      json!({
        "sourceContainer": "uploads",
        "sourceKey": "2024/people.csv",
        "payload": { "kind": "source" },
        "errorInfo": { "stage": "Validate", "kind": "ValidationError", "message": "too large" }
      })
    );
  }

  #[test]
  fn rows_keep_number_text_through_a_round_trip() {
    let mut row = ExtractedRow::new();
    let big: serde_json::Number = "12345678901234567890123".parse().unwrap();
    row.insert("id".to_string(), serde_json::Value::Number(big));
    let mut record = PipelineRecord::new(SourceLocation::new("uploads", "ids.csv"));
    record.replace_payload(Payload::Rows(vec![row.clone()]));

    let text = serde_json::to_string(&record).unwrap();
    assert!(text.contains("12345678901234567890123"), "got: {}", text);
    let back: PipelineRecord = serde_json::from_str(&text).unwrap();
    assert_eq!(back, record);
    assert_eq!(back.payload(), &Payload::Rows(vec![row]));
  }

  #[test]
  fn error_info_is_never_overwritten() {
    let mut record = PipelineRecord::new(SourceLocation::new("b", "k"));
    record.attach_error(ErrorInfo {
      stage: "Extract".to_string(),
      kind: ErrorKind::ExtractionError,
      message: "first".to_string(),
    });
    record.attach_error(ErrorInfo {
      stage: "Transform".to_string(),
      kind: ErrorKind::TransformationError,
      message: "second".to_string(),
    });
    let info = record.error_info().unwrap();
    assert_eq!(info.stage, "Extract");
    assert_eq!(info.message, "first");
  }

  #[test]
  fn attribute_values_use_single_letter_tags() {
    let mut item = StoreItem::new();
    item.insert("name".to_string(), AttributeValue::S("alice".to_string()));
    item.insert("age".to_string(), AttributeValue::N("30".to_string()));
    let value = serde_json::to_value(&item).unwrap();
    assert_eq!(value, json!({ "age": { "N": "30" }, "name": { "S": "alice" } }));
  }
}
