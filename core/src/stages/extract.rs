// sluice/src/stages/extract.rs

use crate::adapters::ObjectSource;
use crate::config::PipelineConfig;
use crate::core::control::StageResult;
use crate::core::record::{ExtractedRow, Payload, PayloadKind, PipelineRecord};
use crate::core::stage::Stage;
use crate::error::{ErrorKind, StageError};
use async_trait::async_trait;
use serde_json::{Number, Value};
use std::sync::Arc;
use tracing::{event, Level};

pub const EXTRACT_STAGE: &str = "Extract";

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Reads the source file as delimited text with a header line and turns each
/// data line into a field-keyed row.
pub struct ExtractStage {
  objects: Arc<dyn ObjectSource>,
  delimiter: u8,
}

impl ExtractStage {
  /// `config` should have passed `PipelineConfig::validate`; a non-ASCII
  /// delimiter falls back to a comma.
  pub fn new(objects: Arc<dyn ObjectSource>, config: &PipelineConfig) -> Self {
    let delimiter = u8::try_from(config.delimiter).ok().filter(u8::is_ascii).unwrap_or(b',');
    Self { objects, delimiter }
  }

  async fn extract(&self, record: &PipelineRecord) -> Result<Payload, StageError> {
    let body = self
      .objects
      .get(record.source())
      .await
      .map_err(|e| StageError::from_adapter(ErrorKind::ExtractionError, "could not read file", e))?;

    let rows = parse_rows(&body, self.delimiter)?;
    event!(Level::DEBUG, bytes = body.len(), rows = rows.len(), "File parsed.");
    Ok(Payload::Rows(rows))
  }
}

#[async_trait]
impl Stage for ExtractStage {
  fn name(&self) -> &str {
    EXTRACT_STAGE
  }

  fn input_kind(&self) -> PayloadKind {
    PayloadKind::Validated
  }

  fn output_kind(&self) -> PayloadKind {
    PayloadKind::Rows
  }

  async fn execute(&self, record: &PipelineRecord) -> StageResult {
    self.extract(record).await.into()
  }
}

/// Parses `body` into rows keyed by the header line.
///
/// The row iterator is consumed to the end before returning, so a parse error
/// on any line fails the whole file.
pub fn parse_rows(body: &[u8], delimiter: u8) -> Result<Vec<ExtractedRow>, StageError> {
  let mut reader = csv::ReaderBuilder::new()
    .delimiter(delimiter)
    .has_headers(true)
    .flexible(false)
    .from_reader(body);

  let headers: Vec<String> = reader
    .headers()
    .map_err(|e| StageError::Extraction(format!("could not parse header line: {}", e)))?
    .iter()
    .enumerate()
    .map(|(idx, h)| {
      if idx == 0 {
        h.trim_start_matches(BYTE_ORDER_MARK).to_string()
      } else {
        h.to_string()
      }
    })
    .collect();

  let mut rows = Vec::new();
  for (line_idx, result) in reader.records().enumerate() {
    let fields = result.map_err(|e| StageError::Extraction(format!("could not parse data row {}: {}", line_idx + 1, e)))?;
    let row: ExtractedRow = headers
      .iter()
      .zip(fields.iter())
      .map(|(header, raw)| (header.clone(), convert_field(raw)))
      .collect();
    rows.push(row);
  }
  Ok(rows)
}

/// A field becomes a JSON number only if the whole string is a JSON number
/// literal; anything else stays a string, untouched. The number keeps its
/// source text, so `12345678901234567890123` and `1e3` reach the store as written.
pub fn convert_field(raw: &str) -> Value {
  parse_number(raw).map(Value::Number).unwrap_or_else(|| Value::String(raw.to_string()))
}

// JSON grammar: no leading '+', no leading zeros, no bare '.', no inf or NaN.
fn parse_number(raw: &str) -> Option<Number> {
  raw.parse::<Number>().ok()
}
