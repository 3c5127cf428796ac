// file_processing_app/src/errors.rs

use sluice::SluiceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("I/O Error: {0}")]
  Io(#[from] std::io::Error),

  #[error("JSON Error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("Sluice Workflow Error: {source}")]
  Workflow {
    #[from] // Allows conversion from sluice::SluiceError
    source: SluiceError,
  },

  #[error("Internal Error: {0}")]
  Internal(String),
}

impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<std::io::Error>() {
      Ok(io) => AppError::Io(io),
      Err(other) => AppError::Internal(format!("{:#}", other)),
    }
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
