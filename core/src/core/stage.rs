// sluice/src/core/stage.rs

//! Defines the `Stage` contract every pipeline step implements.

use crate::core::control::StageResult;
use crate::core::record::{PayloadKind, PipelineRecord};
use async_trait::async_trait;
use std::sync::Arc;

/// A single unit of work in a pipeline.
///
/// A stage reads the incoming record (its `payload` and `source`) and returns
/// either the payload that replaces it or a failure from the fixed
/// [`ErrorKind`](crate::ErrorKind) taxonomy. It may talk to its own external
/// collaborator (object storage, a store, a notifier) but never mutates the
/// record or any other pipeline state; the orchestrator applies the result.
///
/// Implementations must be idempotent: the same input record yields the same
/// `StageResult` as long as the collaborators hold the same data. Retries and
/// redelivered triggers depend on this.
#[async_trait]
pub trait Stage: Send + Sync {
  /// Name used in logs, hooks and `ErrorInfo::stage`. Unique within a registry.
  fn name(&self) -> &str;

  /// Payload kind this stage accepts. Checked by the orchestrator before dispatch.
  fn input_kind(&self) -> PayloadKind;

  /// Payload kind this stage produces on success. Checked after it returns.
  fn output_kind(&self) -> PayloadKind;

  async fn execute(&self, record: &PipelineRecord) -> StageResult;
}

/// Stages are shared between a registry and concurrent runs.
pub type SharedStage = Arc<dyn Stage>;

impl std::fmt::Debug for dyn Stage {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Stage")
      .field("name", &self.name())
      .field("input_kind", &self.input_kind())
      .field("output_kind", &self.output_kind())
      .finish()
  }
}
