// file_processing_app/src/pipelines.rs

use crate::config::AppConfig;
use crate::errors::Result;
use sluice::{standard_stages, Adapters, Orchestrator, Sluice, StageResult, TriggerAdapter};
use std::sync::Arc;
use tracing::{debug, warn};

/// The standard pipeline behind a trigger adapter that accepts every container.
pub fn build_trigger_adapter(config: &AppConfig, adapters: &Adapters) -> Result<TriggerAdapter> {
  let registry = standard_stages(&config.pipeline, adapters)?;
  let mut orchestrator = Orchestrator::new(registry)?;

  orchestrator
    .on_stage_exit(|exit| match exit.result {
      StageResult::Success(payload) => debug!(
        stage = %exit.stage_name,
        payload = %payload.kind(),
        elapsed_ms = exit.elapsed.as_millis() as u64,
        "Stage finished."
      ),
      StageResult::Failure { kind, message } => warn!(
        stage = %exit.stage_name,
        %kind,
        elapsed_ms = exit.elapsed.as_millis() as u64,
        "Stage failed: {}",
        message
      ),
    })
    .on_transition(|t| debug!(source = %t.source, state = ?t.state, "Run state changed."));

  let sluice = Sluice::new();
  sluice.register_default(Arc::new(orchestrator));
  Ok(TriggerAdapter::new(Arc::new(sluice)))
}
