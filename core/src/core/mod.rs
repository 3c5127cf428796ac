pub mod control;
pub mod record;
pub mod stage;

// Re-export key types for easier access from other Sluice modules (and lib.rs)
pub use control::{PipelineOutcome, RunState, StageResult};
pub use record::{AttributeValue, ErrorInfo, ExtractedRow, Payload, PayloadKind, PipelineRecord, SourceLocation, StoreItem};
pub use stage::{SharedStage, Stage};
