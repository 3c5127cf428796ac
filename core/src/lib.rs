// src/lib.rs

//! Sluice: an ASYNC, event-triggered file-processing pipeline for Rust.
//!
//! A newly uploaded file starts one run that moves a `PipelineRecord` through
//! ordered stages, each of which either replaces the record's payload or
//! fails with a kind from a fixed taxonomy:
//!  - Validate: size limit and content-type allow-list.
//!  - Extract: delimited text with a header line into field-keyed rows.
//!  - Transform: rows into typed, keyed store items.
//!  - Persist: one durable-store write per item.
//!  - Notify: one completion message.
//!
//! The first failure halts the run and is reported unchanged to the caller.
//! Nothing is retried or rolled back by the library.

pub mod adapters;
pub mod config;
pub mod core;
pub mod error;
pub mod pipeline;
pub mod registry;
pub mod stages;
pub mod trigger;

// --- Re-exports for the Public API ---

pub use crate::core::control::{PipelineOutcome, RunState, StageResult};
pub use crate::core::record::{
  AttributeValue, ErrorInfo, ExtractedRow, Payload, PayloadKind, PipelineRecord, SourceLocation, StoreItem,
};
pub use crate::core::stage::{SharedStage, Stage};

pub use crate::pipeline::definition::StageRegistry;
pub use crate::pipeline::execution::Orchestrator;
pub use crate::pipeline::hooks::{StageEntered, StageExited, Transition};

pub use crate::adapters::{Adapters, DurableStore, Notifier, ObjectMetadata, ObjectSource};
pub use crate::config::PipelineConfig;
pub use crate::error::{ErrorKind, SluiceError, SluiceResult, StageError};
pub use crate::registry::Sluice;
pub use crate::stages::standard_stages;
pub use crate::trigger::{parse_trigger, TriggerAdapter, TriggerEvent};

/*
    Core Workflow:
    1. Build process-wide `Adapters` once (object source, durable store, notifier).
    2. `standard_stages(&config, &adapters)` gives the five-stage `StageRegistry`;
       insert, replace or remove stages as needed.
    3. `Orchestrator::new(registry)`, optionally adding `on_stage_enter`,
       `on_stage_exit` or `on_transition` hooks.
    4. Register it with a `Sluice` per container (or as the default) and wrap
       that in a `TriggerAdapter`.
    5. Feed notifications to `TriggerAdapter::handle_notification`; each file
       yields one `PipelineOutcome`.
*/
