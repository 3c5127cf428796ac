// sluice/src/stages/validate.rs

use crate::adapters::ObjectSource;
use crate::config::{media_type_essence, PipelineConfig};
use crate::core::control::StageResult;
use crate::core::record::{Payload, PayloadKind, PipelineRecord};
use crate::core::stage::Stage;
use crate::error::{ErrorKind, StageError};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{event, Level};

pub const VALIDATE_STAGE: &str = "Validate";

/// Checks the source file's size and declared content type before anything reads it.
pub struct ValidateStage {
  objects: Arc<dyn ObjectSource>,
  config: PipelineConfig,
}

impl ValidateStage {
  pub fn new(objects: Arc<dyn ObjectSource>, config: &PipelineConfig) -> Self {
    Self {
      objects,
      config: config.clone(),
    }
  }

  async fn validate(&self, record: &PipelineRecord) -> Result<Payload, StageError> {
    let location = record.source();
    let metadata = self
      .objects
      .head(location)
      .await
      .map_err(|e| StageError::from_adapter(ErrorKind::ValidationError, "could not read file metadata", e))?;

    if metadata.content_length > self.config.max_file_size_bytes {
      return Err(StageError::Validation(format!(
        "File is too large: {} bytes exceeds the limit of {} bytes",
        metadata.content_length, self.config.max_file_size_bytes
      )));
    }

    let content_type = match metadata.content_type.as_deref().map(str::trim) {
      Some(ct) if !media_type_essence(ct).is_empty() => ct.to_string(),
      _ => return Err(StageError::Validation("File type could not be determined".to_string())),
    };

    if !self.config.allows_content_type(&content_type) {
      return Err(StageError::Validation(format!("Invalid file type: {}", content_type)));
    }

    event!(Level::DEBUG, content_length = metadata.content_length, %content_type, "File accepted.");
    Ok(Payload::Validated {
      content_length: metadata.content_length,
      content_type,
    })
  }
}

#[async_trait]
impl Stage for ValidateStage {
  fn name(&self) -> &str {
    VALIDATE_STAGE
  }

  fn input_kind(&self) -> PayloadKind {
    PayloadKind::Source
  }

  fn output_kind(&self) -> PayloadKind {
    PayloadKind::Validated
  }

  async fn execute(&self, record: &PipelineRecord) -> StageResult {
    self.validate(record).await.into()
  }
}
