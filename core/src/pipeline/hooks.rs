// sluice/src/pipeline/hooks.rs

//! Observation points on an `Orchestrator`: stage entry, stage exit and run
//! state transitions. Hooks see borrowed views of the run and cannot change
//! its course.

use crate::core::control::{RunState, StageResult};
use crate::core::record::{PipelineRecord, SourceLocation};
use crate::pipeline::execution::Orchestrator;
use std::time::Duration;
use tracing::{event, Level};

/// Fired just before a stage is dispatched.
#[derive(Debug)]
pub struct StageEntered<'a> {
  pub stage_name: &'a str,
  pub stage_index: usize,
  pub record: &'a PipelineRecord,
}

/// Fired once a stage has returned, before its result is applied to the record.
#[derive(Debug)]
pub struct StageExited<'a> {
  pub stage_name: &'a str,
  pub stage_index: usize,
  pub result: &'a StageResult,
  pub elapsed: Duration,
}

/// Fired on every state change of a run, `Pending` included.
#[derive(Debug)]
pub struct Transition<'a> {
  pub source: &'a SourceLocation,
  pub state: RunState,
}

pub type EnterHook = Box<dyn Fn(&StageEntered<'_>) + Send + Sync>;
pub type ExitHook = Box<dyn Fn(&StageExited<'_>) + Send + Sync>;
pub type TransitionHook = Box<dyn Fn(&Transition<'_>) + Send + Sync>;

#[derive(Default)]
pub(crate) struct Hooks {
  pub(crate) enter: Vec<EnterHook>,
  pub(crate) exit: Vec<ExitHook>,
  pub(crate) transition: Vec<TransitionHook>,
}

impl Orchestrator {
  /// Registers a hook called before each stage is dispatched.
  pub fn on_stage_enter(&mut self, hook: impl Fn(&StageEntered<'_>) + Send + Sync + 'static) -> &mut Self {
    self.hooks.enter.push(Box::new(hook));
    event!(Level::DEBUG, count = self.hooks.enter.len(), "Stage-enter hook registered.");
    self
  }

  /// Registers a hook called after each stage returns.
  pub fn on_stage_exit(&mut self, hook: impl Fn(&StageExited<'_>) + Send + Sync + 'static) -> &mut Self {
    self.hooks.exit.push(Box::new(hook));
    event!(Level::DEBUG, count = self.hooks.exit.len(), "Stage-exit hook registered.");
    self
  }

  /// Registers a hook called on every run state transition.
  pub fn on_transition(&mut self, hook: impl Fn(&Transition<'_>) + Send + Sync + 'static) -> &mut Self {
    self.hooks.transition.push(Box::new(hook));
    event!(Level::DEBUG, count = self.hooks.transition.len(), "Transition hook registered.");
    self
  }

  pub(crate) fn fire_enter(&self, entered: &StageEntered<'_>) {
    for hook in &self.hooks.enter {
      hook(entered);
    }
  }

  pub(crate) fn fire_exit(&self, exited: &StageExited<'_>) {
    for hook in &self.hooks.exit {
      hook(exited);
    }
  }

  pub(crate) fn fire_transition(&self, source: &SourceLocation, state: RunState) {
    if state.is_terminal() {
      event!(Level::DEBUG, ?state, "Run reached a terminal state.");
    } else {
      event!(Level::TRACE, ?state, "Run state transition.");
    }
    let transition = Transition { source, state };
    for hook in &self.hooks.transition {
      hook(&transition);
    }
  }
}
