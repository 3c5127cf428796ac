// sluice/src/pipeline/definition.rs

//! Contains the `StageRegistry`, the ordered list of stages a pipeline runs,
//! and methods for its construction and structural modification.

use crate::core::stage::SharedStage;
use crate::error::{SluiceError, SluiceResult};

/// Ordered stages of a pipeline. Names are unique.
#[derive(Default, Clone, Debug)]
pub struct StageRegistry {
  pub(crate) stages: Vec<SharedStage>,
}

impl StageRegistry {
  pub fn new() -> Self {
    Self { stages: Vec::new() }
  }

  pub fn len(&self) -> usize {
    self.stages.len()
  }

  pub fn is_empty(&self) -> bool {
    self.stages.is_empty()
  }

  /// Stage names in execution order.
  pub fn names(&self) -> Vec<String> {
    self.stages.iter().map(|s| s.name().to_string()).collect()
  }

  pub fn get(&self, stage_name: &str) -> Option<&SharedStage> {
    self.stages.iter().find(|s| s.name() == stage_name)
  }

  fn position(&self, stage_name: &str) -> SluiceResult<usize> {
    self
      .stages
      .iter()
      .position(|s| s.name() == stage_name)
      .ok_or_else(|| SluiceError::StageNotFound {
        stage_name: stage_name.to_string(),
      })
  }

  fn ensure_stage_not_exists(&self, stage_name: &str) -> SluiceResult<()> {
    if self.stages.iter().any(|s| s.name() == stage_name) {
      return Err(SluiceError::DuplicateStage {
        stage_name: stage_name.to_string(),
      });
    }
    Ok(())
  }

  // --- Basic Stage Manipulation Methods ---

  /// Appends `stage` at the end.
  pub fn push(&mut self, stage: SharedStage) -> SluiceResult<()> {
    self.ensure_stage_not_exists(stage.name())?;
    self.stages.push(stage);
    Ok(())
  }

  pub fn insert_before_stage(&mut self, existing_stage_name: &str, stage: SharedStage) -> SluiceResult<()> {
    let idx = self.position(existing_stage_name)?;
    self.ensure_stage_not_exists(stage.name())?;
    self.stages.insert(idx, stage);
    Ok(())
  }

  pub fn insert_after_stage(&mut self, existing_stage_name: &str, stage: SharedStage) -> SluiceResult<()> {
    let idx = self.position(existing_stage_name)?;
    self.ensure_stage_not_exists(stage.name())?;
    self.stages.insert(idx + 1, stage);
    Ok(())
  }

  /// Removes and returns the named stage.
  pub fn remove_stage(&mut self, stage_name: &str) -> SluiceResult<SharedStage> {
    let idx = self.position(stage_name)?;
    Ok(self.stages.remove(idx))
  }

  /// Swaps the named stage for `stage`, keeping its position.
  pub fn replace_stage(&mut self, stage_name: &str, stage: SharedStage) -> SluiceResult<SharedStage> {
    let idx = self.position(stage_name)?;
    if stage.name() != stage_name {
      self.ensure_stage_not_exists(stage.name())?;
    }
    Ok(std::mem::replace(&mut self.stages[idx], stage))
  }

  /// Rejects registries an orchestrator cannot run.
  pub(crate) fn check_runnable(&self) -> SluiceResult<()> {
    if self.stages.is_empty() {
      return Err(SluiceError::configuration("a pipeline needs at least one stage"));
    }
    for (idx, stage) in self.stages.iter().enumerate() {
      if self.stages[..idx].iter().any(|s| s.name() == stage.name()) {
        return Err(SluiceError::DuplicateStage {
          stage_name: stage.name().to_string(),
        });
      }
    }
    Ok(())
  }
}
