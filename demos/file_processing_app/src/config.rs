// file_processing_app/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use sluice::PipelineConfig;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppConfig {
  /// Root of the local object source; each sub-directory is a container.
  pub data_dir: PathBuf,
  /// JSON-lines file the durable store appends to.
  pub store_path: PathBuf,
  /// Emit logs as JSON instead of human-readable lines.
  pub log_json: bool,
  pub pipeline: PipelineConfig,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present

    let get_env = |var_name: &str| {
      env::var(var_name).map_err(|e| AppError::Config(format!("Missing environment variable '{}': {}", var_name, e)))
    };

    let data_dir = PathBuf::from(get_env("SLUICE_DATA_DIR").unwrap_or_else(|_| "./data".to_string()));
    let store_path = get_env("SLUICE_STORE_PATH")
      .map(PathBuf::from)
      .unwrap_or_else(|_| data_dir.join("store.jsonl"));
    let log_json = get_env("SLUICE_LOG_JSON")
      .unwrap_or_else(|_| "false".to_string())
      .parse::<bool>()
      .map_err(|e| AppError::Config(format!("Invalid SLUICE_LOG_JSON value: {}", e)))?;

    let mut pipeline = PipelineConfig::default();
    if let Ok(raw) = get_env("SLUICE_MAX_FILE_SIZE") {
      let max = raw
        .parse::<u64>()
        .map_err(|e| AppError::Config(format!("Invalid SLUICE_MAX_FILE_SIZE: {}", e)))?;
      pipeline = pipeline.with_max_file_size_bytes(max);
    }
    if let Ok(raw) = get_env("SLUICE_ALLOWED_TYPES") {
      pipeline = pipeline.with_allowed_content_types(raw.split(',').map(str::trim).filter(|t| !t.is_empty()));
    }
    if let Ok(raw) = get_env("SLUICE_DELIMITER") {
      let mut chars = raw.chars();
      let delimiter = match (chars.next(), chars.next()) {
        (Some(c), None) => c,
        _ => return Err(AppError::Config(format!("SLUICE_DELIMITER must be one character, got '{}'", raw))),
      };
      pipeline = pipeline.with_delimiter(delimiter);
    }
    if let Ok(key_field) = get_env("SLUICE_KEY_FIELD") {
      pipeline = pipeline.with_key_field(key_field);
    }
    if let Ok(message) = get_env("SLUICE_COMPLETION_MESSAGE") {
      pipeline = pipeline.with_completion_message(message);
    }
    pipeline.validate()?;

    Ok(Self {
      data_dir,
      store_path,
      log_json,
      pipeline,
    })
  }
}
