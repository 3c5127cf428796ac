// sluice/src/pipeline/mod.rs

//! Defines the `StageRegistry`, the `Orchestrator` that executes it, and the
//! orchestrator's observation hooks.

pub mod definition;
pub mod execution;
pub mod hooks;

pub use definition::StageRegistry;
pub use execution::Orchestrator;
pub use hooks::{StageEntered, StageExited, Transition};
