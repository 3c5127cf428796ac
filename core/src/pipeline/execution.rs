// sluice/src/pipeline/execution.rs

//! Contains the `Orchestrator`, which drives one record through the ordered
//! stages of a `StageRegistry` and stops at the first failure.

use crate::core::control::{PipelineOutcome, RunState, StageResult};
use crate::core::record::{ErrorInfo, PipelineRecord, SourceLocation};
use crate::core::stage::SharedStage;
use crate::error::{ErrorKind, SluiceResult};
use crate::pipeline::definition::StageRegistry;
use crate::pipeline::hooks::{Hooks, StageEntered, StageExited};
use futures_util::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{event, instrument, span, Instrument, Level};

/// Runs pipelines over a fixed, ordered set of stages.
///
/// Each run walks `Pending → Running(0) → … → Running(n-1) → Succeeded`, or
/// ends in `Failed` at the first stage that reports a failure. The
/// orchestrator never retries a stage and never undoes the side effects of
/// stages that already succeeded: if Persist fails after writing some items,
/// those items stay written, and a Notify failure leaves persisted data alone.
///
/// An `Orchestrator` holds no per-run state, so one instance can be shared
/// behind an `Arc` and run concurrently for independent files.
pub struct Orchestrator {
  registry: StageRegistry,
  pub(crate) hooks: Hooks,
}

impl Orchestrator {
  /// Fails if `registry` is empty or has duplicate stage names.
  pub fn new(registry: StageRegistry) -> SluiceResult<Self> {
    registry.check_runnable()?;
    Ok(Self {
      registry,
      hooks: Hooks::default(),
    })
  }

  pub fn registry(&self) -> &StageRegistry {
    &self.registry
  }

  /// Runs the pipeline for one newly arrived file.
  pub async fn run(&self, source: impl Into<SourceLocation>) -> PipelineOutcome {
    self.execute_run(source.into(), None).await
  }

  /// Like [`run`](Self::run), but checks `cancel` before dispatching each stage.
  ///
  /// A stage that has already been dispatched runs to completion; the run then
  /// stops with `PipelineOutcome::Cancelled` naming the stage that did not start.
  pub async fn run_until_cancelled(&self, source: impl Into<SourceLocation>, cancel: &CancellationToken) -> PipelineOutcome {
    self.execute_run(source.into(), Some(cancel)).await
  }

  #[instrument(
    name = "pipeline_run",
    skip_all,
    fields(
      source_container = %source.container(),
      source_key = %source.key(),
      num_stages = self.registry.len(),
    )
  )]
  async fn execute_run(&self, source: SourceLocation, cancel: Option<&CancellationToken>) -> PipelineOutcome {
    let mut record = PipelineRecord::new(source);
    self.fire_transition(record.source(), RunState::Pending);
    event!(Level::DEBUG, "Pipeline run starting.");

    for (stage_idx, stage) in self.registry.stages.iter().enumerate() {
      if cancel.map_or(false, CancellationToken::is_cancelled) {
        event!(Level::INFO, next_stage = stage.name(), "Run cancelled before dispatch.");
        self.fire_transition(record.source(), RunState::Cancelled);
        return PipelineOutcome::Cancelled {
          next_stage: stage.name().to_string(),
          record,
        };
      }

      self.fire_transition(record.source(), RunState::Running(stage_idx));
      let stage_span = span!(
        Level::INFO,
        "pipeline_stage",
        stage_name = stage.name(),
        stage_index = stage_idx
      );
      let result = self.dispatch(stage_idx, stage, &record).instrument(stage_span).await;

      match result {
        StageResult::Success(payload) => {
          record.replace_payload(payload);
        }
        StageResult::Failure { kind, message } => {
          event!(Level::ERROR, stage = stage.name(), %kind, %message, "Stage failed; halting run.");
          let error = ErrorInfo {
            stage: stage.name().to_string(),
            kind,
            message,
          };
          record.attach_error(error.clone());
          self.fire_transition(record.source(), RunState::Failed);
          return PipelineOutcome::Failed {
            stage: stage.name().to_string(),
            error,
            record,
          };
        }
      }
    }

    self.fire_transition(record.source(), RunState::Succeeded);
    event!(Level::INFO, "Pipeline run completed.");
    PipelineOutcome::Completed { record }
  }

  /// Executes one stage with its boundary checks and hooks. Never panics
  /// because of the stage: an unwind out of `execute` becomes a failure.
  async fn dispatch(&self, stage_idx: usize, stage: &SharedStage, record: &PipelineRecord) -> StageResult {
    self.fire_enter(&StageEntered {
      stage_name: stage.name(),
      stage_index: stage_idx,
      record,
    });
    event!(Level::DEBUG, "Dispatching stage.");
    let started = Instant::now();

    let actual_input = record.payload().kind();
    let result = if actual_input != stage.input_kind() {
      StageResult::failure(
        ErrorKind::UnknownStageError,
        format!(
          "stage expects a {} payload but received {}",
          stage.input_kind(),
          actual_input
        ),
      )
    } else {
      match AssertUnwindSafe(stage.execute(record)).catch_unwind().await {
        Ok(StageResult::Success(payload)) if payload.kind() != stage.output_kind() => StageResult::failure(
          ErrorKind::UnknownStageError,
          format!(
            "stage declared a {} payload but produced {}",
            stage.output_kind(),
            payload.kind()
          ),
        ),
        Ok(result) => result,
        Err(panic) => StageResult::failure(
          ErrorKind::UnknownStageError,
          format!("stage panicked: {}", panic_message(panic.as_ref())),
        ),
      }
    };

    let elapsed = started.elapsed();
    event!(Level::DEBUG, success = result.is_success(), elapsed_ms = elapsed.as_millis() as u64, "Stage returned.");
    self.fire_exit(&StageExited {
      stage_name: stage.name(),
      stage_index: stage_idx,
      result: &result,
      elapsed,
    });
    result
  }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
  if let Some(s) = panic.downcast_ref::<&str>() {
    (*s).to_string()
  } else if let Some(s) = panic.downcast_ref::<String>() {
    s.clone()
  } else {
    "non-string panic payload".to_string()
  }
}
