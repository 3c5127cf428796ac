// sluice/src/stages/mod.rs

//! The five standard stages of the file-processing workflow.

pub mod extract;
pub mod notify;
pub mod persist;
pub mod transform;
pub mod validate;

pub use extract::{ExtractStage, EXTRACT_STAGE};
pub use notify::{NotifyStage, NOTIFY_STAGE};
pub use persist::{PersistStage, PERSIST_STAGE};
pub use transform::{row_key, TransformStage, TRANSFORM_STAGE};
pub use validate::{ValidateStage, VALIDATE_STAGE};

use crate::adapters::Adapters;
use crate::config::PipelineConfig;
use crate::error::SluiceResult;
use crate::pipeline::definition::StageRegistry;
use std::sync::Arc;

/// Validate → Extract → Transform → Persist → Notify, wired to `adapters`.
pub fn standard_stages(config: &PipelineConfig, adapters: &Adapters) -> SluiceResult<StageRegistry> {
  config.validate()?;
  let mut registry = StageRegistry::new();
  registry.push(Arc::new(ValidateStage::new(adapters.objects.clone(), config)))?;
  registry.push(Arc::new(ExtractStage::new(adapters.objects.clone(), config)))?;
  registry.push(Arc::new(TransformStage::new(config)))?;
  registry.push(Arc::new(PersistStage::new(adapters.store.clone(), config)))?;
  registry.push(Arc::new(NotifyStage::new(adapters.notifier.clone(), config)))?;
  Ok(registry)
}
