// sluice/src/core/control.rs

//! Defines the result of a single stage, the orchestrator's run states, and the
//! outcome of a full pipeline run.

use crate::core::record::{ErrorInfo, Payload, PipelineRecord};
use crate::error::{ErrorKind, StageError};
use serde::Serialize;

/// What a stage hands back to the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum StageResult {
  /// The payload that replaces the record's current one.
  Success(Payload),
  /// The stage could not do its work. The run halts here.
  Failure { kind: ErrorKind, message: String },
}

impl StageResult {
  pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
    StageResult::Failure {
      kind,
      message: message.into(),
    }
  }

  pub fn is_success(&self) -> bool {
    matches!(self, StageResult::Success(_))
  }
}

impl From<Result<Payload, StageError>> for StageResult {
  fn from(result: Result<Payload, StageError>) -> Self {
    match result {
      Ok(payload) => StageResult::Success(payload),
      Err(err) => StageResult::Failure {
        kind: err.kind(),
        message: err.to_string(),
      },
    }
  }
}

/// States of the orchestrator's per-run state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
  Pending,
  /// Executing the stage at this index.
  Running(usize),
  Succeeded,
  Failed,
  /// Stopped before dispatching the next stage.
  Cancelled,
}

impl RunState {
  pub fn is_terminal(&self) -> bool {
    matches!(self, RunState::Succeeded | RunState::Failed | RunState::Cancelled)
  }
}

/// Final state of a run, handed back to whoever triggered it.
///
/// Serializes with an `outcome` tag: `completed`, `failed` or `cancelled`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum PipelineOutcome {
  /// Every stage succeeded.
  Completed { record: PipelineRecord },
  /// A stage failed; no later stage ran. `error` is the triple reported by that stage.
  Failed {
    stage: String,
    error: ErrorInfo,
    record: PipelineRecord,
  },
  /// Cancelled before `next_stage` was dispatched.
  Cancelled {
    #[serde(rename = "nextStage")]
    next_stage: String,
    record: PipelineRecord,
  },
}

impl PipelineOutcome {
  pub fn is_completed(&self) -> bool {
    matches!(self, PipelineOutcome::Completed { .. })
  }

  pub fn record(&self) -> &PipelineRecord {
    match self {
      PipelineOutcome::Completed { record }
      | PipelineOutcome::Failed { record, .. }
      | PipelineOutcome::Cancelled { record, .. } => record,
    }
  }

  pub fn error(&self) -> Option<&ErrorInfo> {
    match self {
      PipelineOutcome::Failed { error, .. } => Some(error),
      _ => None,
    }
  }

  /// The terminal `RunState` this outcome corresponds to.
  pub fn state(&self) -> RunState {
    match self {
      PipelineOutcome::Completed { .. } => RunState::Succeeded,
      PipelineOutcome::Failed { .. } => RunState::Failed,
      PipelineOutcome::Cancelled { .. } => RunState::Cancelled,
    }
  }
}
