// sluice/src/error.rs
use anyhow::Error as AnyhowError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Framework-level errors: problems with how a pipeline is assembled or
/// triggered, never the failure of a stage's own work.
#[derive(Debug, Error)]
pub enum SluiceError {
  #[error("Stage not found: {stage_name}")]
  StageNotFound { stage_name: String },

  #[error("Stage '{stage_name}' is already registered")]
  DuplicateStage { stage_name: String },

  #[error("Configuration error: {message}")]
  Configuration { message: String },

  #[error("Invalid trigger: {message}")]
  InvalidTrigger { message: String },

  #[error("Error in adapter or external operation. Source: {source}")]
  External {
    #[source]
    source: AnyhowError,
  },
}

impl SluiceError {
  pub fn configuration(message: impl Into<String>) -> Self {
    SluiceError::Configuration { message: message.into() }
  }

  pub fn invalid_trigger(message: impl Into<String>) -> Self {
    SluiceError::InvalidTrigger { message: message.into() }
  }
}

impl From<AnyhowError> for SluiceError {
  fn from(err: AnyhowError) -> Self {
    SluiceError::External { source: err }
  }
}

pub type SluiceResult<T, E = SluiceError> = std::result::Result<T, E>;

/// The fixed taxonomy every stage failure is reported with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
  ValidationError,
  ExtractionError,
  TransformationError,
  PersistenceError,
  NotificationError,
  UnknownStageError,
}

impl ErrorKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      ErrorKind::ValidationError => "ValidationError",
      ErrorKind::ExtractionError => "ExtractionError",
      ErrorKind::TransformationError => "TransformationError",
      ErrorKind::PersistenceError => "PersistenceError",
      ErrorKind::NotificationError => "NotificationError",
      ErrorKind::UnknownStageError => "UnknownStageError",
    }
  }
}

impl fmt::Display for ErrorKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Error produced inside a stage. Converted into `StageResult::Failure` at the
/// `Stage::execute` boundary; it never escapes to the orchestrator as a fault.
#[derive(Debug, Error)]
pub enum StageError {
  #[error("{0}")]
  Validation(String),

  #[error("{0}")]
  Extraction(String),

  #[error("{0}")]
  Transformation(String),

  #[error("{0}")]
  Persistence(String),

  #[error("{0}")]
  Notification(String),

  #[error("{0}")]
  Unknown(String),
}

impl StageError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      StageError::Validation(_) => ErrorKind::ValidationError,
      StageError::Extraction(_) => ErrorKind::ExtractionError,
      StageError::Transformation(_) => ErrorKind::TransformationError,
      StageError::Persistence(_) => ErrorKind::PersistenceError,
      StageError::Notification(_) => ErrorKind::NotificationError,
      StageError::Unknown(_) => ErrorKind::UnknownStageError,
    }
  }

  /// Wraps an adapter error, keeping its context chain in the message.
  pub fn from_adapter(kind: ErrorKind, context: &str, err: AnyhowError) -> Self {
    let message = format!("{}: {:#}", context, err);
    match kind {
      ErrorKind::ValidationError => StageError::Validation(message),
      ErrorKind::ExtractionError => StageError::Extraction(message),
      ErrorKind::TransformationError => StageError::Transformation(message),
      ErrorKind::PersistenceError => StageError::Persistence(message),
      ErrorKind::NotificationError => StageError::Notification(message),
      ErrorKind::UnknownStageError => StageError::Unknown(message),
    }
  }
}
