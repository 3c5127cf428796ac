// sluice/src/stages/transform.rs

use crate::config::PipelineConfig;
use crate::core::control::StageResult;
use crate::core::record::{AttributeValue, ExtractedRow, Payload, PayloadKind, PipelineRecord, SourceLocation, StoreItem};
use crate::core::stage::Stage;
use crate::error::StageError;
use async_trait::async_trait;
use serde_json::Value;

pub const TRANSFORM_STAGE: &str = "Transform";

/// Formats extracted rows into typed store items.
///
/// Numbers become `N` attributes carrying their source text, strings become
/// lower-cased `S` attributes. The key attribute is never lower-cased: rows
/// whose keys differ only in case stay distinct items. Each item gets a key
/// derived from the file's identity and the row's position, unless the row
/// already carries one.
pub struct TransformStage {
  key_field: String,
}

impl TransformStage {
  pub fn new(config: &PipelineConfig) -> Self {
    Self {
      key_field: config.key_field.clone(),
    }
  }

  fn transform(&self, record: &PipelineRecord) -> Result<Payload, StageError> {
    let rows = match record.payload() {
      Payload::Rows(rows) => rows,
      other => {
        return Err(StageError::Transformation(format!(
          "expected extracted rows, got {} payload",
          other.kind()
        )))
      }
    };

    let items = rows
      .iter()
      .enumerate()
      .map(|(row_idx, row)| self.transform_row(record.source(), row_idx, row))
      .collect::<Result<Vec<_>, _>>()?;
    Ok(Payload::Items(items))
  }

  fn transform_row(&self, source: &SourceLocation, row_idx: usize, row: &ExtractedRow) -> Result<StoreItem, StageError> {
    let mut item = StoreItem::new();
    for (field, value) in row {
      let attribute = match value {
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) if *field == self.key_field => AttributeValue::S(s.clone()),
        Value::String(s) => AttributeValue::S(s.to_lowercase()),
        other => {
          return Err(StageError::Transformation(format!(
            "row {} field '{}' is neither a number nor a string: {}",
            row_idx, field, other
          )))
        }
      };
      item.insert(field.clone(), attribute);
    }
    item
      .entry(self.key_field.clone())
      .or_insert_with(|| AttributeValue::S(row_key(source, row_idx)));
    Ok(item)
  }
}

/// Store key for the `row_idx`-th row of a file. Stable across redeliveries of
/// the same file, so rewriting it overwrites rather than duplicates.
pub fn row_key(source: &SourceLocation, row_idx: usize) -> String {
  format!("{}/{}#{}", source.container(), source.key(), row_idx)
}

#[async_trait]
impl Stage for TransformStage {
  fn name(&self) -> &str {
    TRANSFORM_STAGE
  }

  fn input_kind(&self) -> PayloadKind {
    PayloadKind::Rows
  }

  fn output_kind(&self) -> PayloadKind {
    PayloadKind::Items
  }

  async fn execute(&self, record: &PipelineRecord) -> StageResult {
    self.transform(record).into()
  }
}
