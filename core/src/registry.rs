// sluice/src/registry.rs

//! Defines `Sluice`, a container-keyed registry that routes each arriving file
//! to the orchestrator responsible for it.

use crate::core::control::PipelineOutcome;
use crate::core::record::SourceLocation;
use crate::error::{SluiceError, SluiceResult};
use crate::pipeline::execution::Orchestrator;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{event, instrument, Level};

/// The Sluice registry.
///
/// Pipelines are registered per source container, with an optional default
/// for containers nobody claimed. Runs for different files are independent;
/// the registry lock is released before a run starts.
#[derive(Default)]
pub struct Sluice {
  by_container: Mutex<HashMap<String, Arc<Orchestrator>>>,
  default: Mutex<Option<Arc<Orchestrator>>>,
}

impl Sluice {
  /// Creates a new, empty Sluice registry.
  pub fn new() -> Self {
    Self::default()
  }

  /// Routes files from `container` to `orchestrator`, replacing any earlier registration.
  pub fn register_pipeline(&self, container: impl Into<String>, orchestrator: Arc<Orchestrator>) {
    let container = container.into();
    event!(Level::DEBUG, %container, stages = ?orchestrator.registry().names(), "Registering pipeline.");
    self.by_container.lock().insert(container, orchestrator);
  }

  /// Routes files from any unregistered container to `orchestrator`.
  pub fn register_default(&self, orchestrator: Arc<Orchestrator>) {
    event!(Level::DEBUG, stages = ?orchestrator.registry().names(), "Registering default pipeline.");
    *self.default.lock() = Some(orchestrator);
  }

  /// The orchestrator responsible for `container`.
  pub fn resolve(&self, container: &str) -> SluiceResult<Arc<Orchestrator>> {
    if let Some(orchestrator) = self.by_container.lock().get(container).cloned() {
      return Ok(orchestrator);
    }
    self.default.lock().clone().ok_or_else(|| {
      event!(Level::ERROR, %container, "No pipeline registered for container.");
      SluiceError::configuration(format!("No pipeline registered for container '{}'", container))
    })
  }

  /// Runs the pipeline registered for the file's container.
  #[instrument(
    name = "Sluice::dispatch",
    skip_all,
    fields(source_container = %source.container(), source_key = %source.key()),
    err(Display)
  )]
  pub async fn dispatch(&self, source: SourceLocation) -> SluiceResult<PipelineOutcome> {
    let orchestrator = self.resolve(source.container())?;
    Ok(orchestrator.run(source).await)
  }
}
