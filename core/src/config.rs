// sluice/src/config.rs

//! Settings shared by the standard stages.

use crate::error::{SluiceError, SluiceResult};
use serde::Deserialize;

pub const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
pub const DEFAULT_KEY_FIELD: &str = "fileId";
pub const DEFAULT_COMPLETION_MESSAGE: &str = "File processing completed successfully.";

fn default_allowed_content_types() -> Vec<String> {
  vec!["text/csv".to_string(), "application/csv".to_string(), "text/plain".to_string()]
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PipelineConfig {
  /// Files larger than this fail validation.
  pub max_file_size_bytes: u64,
  /// Media types (without parameters) accepted by validation. Compared case-insensitively.
  pub allowed_content_types: Vec<String>,
  /// Field separator for the extract stage. Must be a single ASCII byte.
  pub delimiter: char,
  /// Attribute holding the store key of each item.
  pub key_field: String,
  /// Message published by the notify stage.
  pub completion_message: String,
}

impl Default for PipelineConfig {
  fn default() -> Self {
    Self {
      max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
      allowed_content_types: default_allowed_content_types(),
      delimiter: ',',
      key_field: DEFAULT_KEY_FIELD.to_string(),
      completion_message: DEFAULT_COMPLETION_MESSAGE.to_string(),
    }
  }
}

impl PipelineConfig {
  pub fn with_max_file_size_bytes(mut self, max: u64) -> Self {
    self.max_file_size_bytes = max;
    self
  }

  pub fn with_allowed_content_types<I, S>(mut self, types: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.allowed_content_types = types.into_iter().map(Into::into).collect();
    self
  }

  pub fn with_delimiter(mut self, delimiter: char) -> Self {
    self.delimiter = delimiter;
    self
  }

  pub fn with_key_field(mut self, key_field: impl Into<String>) -> Self {
    self.key_field = key_field.into();
    self
  }

  pub fn with_completion_message(mut self, message: impl Into<String>) -> Self {
    self.completion_message = message.into();
    self
  }

  /// Checks the settings are usable before any stage is built from them.
  pub fn validate(&self) -> SluiceResult<()> {
    if self.max_file_size_bytes == 0 {
      return Err(SluiceError::configuration("max_file_size_bytes must be greater than zero"));
    }
    if self.allowed_content_types.iter().all(|t| t.trim().is_empty()) {
      return Err(SluiceError::configuration("allowed_content_types must name at least one media type"));
    }
    if !self.delimiter.is_ascii() || self.delimiter == '"' || self.delimiter == '\n' || self.delimiter == '\r' {
      return Err(SluiceError::configuration(format!(
        "delimiter {:?} must be a single ASCII byte other than a quote or line break",
        self.delimiter
      )));
    }
    if self.key_field.is_empty() {
      return Err(SluiceError::configuration("key_field must not be empty"));
    }
    if self.completion_message.is_empty() {
      return Err(SluiceError::configuration("completion_message must not be empty"));
    }
    Ok(())
  }

  /// True if `content_type` (parameters ignored) is on the allow-list.
  pub fn allows_content_type(&self, content_type: &str) -> bool {
    let essence = media_type_essence(content_type);
    !essence.is_empty()
      && self
        .allowed_content_types
        .iter()
        .any(|allowed| media_type_essence(allowed) == essence)
  }
}

/// `"Text/CSV; charset=utf-8"` -> `"text/csv"`.
pub(crate) fn media_type_essence(content_type: &str) -> String {
  content_type
    .split(';')
    .next()
    .unwrap_or_default()
    .trim()
    .to_ascii_lowercase()
}
