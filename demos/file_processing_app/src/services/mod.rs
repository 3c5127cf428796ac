// file_processing_app/src/services/mod.rs
pub mod jsonl_store;
pub mod local_objects;
pub mod log_notifier;

pub use jsonl_store::JsonLinesStore;
pub use local_objects::LocalObjectSource;
pub use log_notifier::LogNotifier;
