// sluice/src/adapters/mod.rs

//! Contracts for the external collaborators the stages talk to: where source
//! files live, where items are persisted, and where completion is announced.
//!
//! Adapters report failure and never retry internally. Their errors are plain
//! `anyhow::Error`s; the stage that called them decides the `ErrorKind`.

pub mod memory;

use crate::core::record::{SourceLocation, StoreItem};
use async_trait::async_trait;
use std::sync::Arc;

/// Metadata of a source object, as returned by a `head` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMetadata {
  pub content_length: u64,
  /// `None` when the storage layer could not tell.
  pub content_type: Option<String>,
}

/// Read access to uploaded files.
#[async_trait]
pub trait ObjectSource: Send + Sync {
  async fn head(&self, location: &SourceLocation) -> anyhow::Result<ObjectMetadata>;

  async fn get(&self, location: &SourceLocation) -> anyhow::Result<Vec<u8>>;
}

/// A durable keyed store. One call writes one item.
#[async_trait]
pub trait DurableStore: Send + Sync {
  /// Writes `item` under `key`, replacing any previous value for that key.
  async fn put(&self, key: &str, item: StoreItem) -> anyhow::Result<()>;
}

/// A notification channel.
#[async_trait]
pub trait Notifier: Send + Sync {
  /// Publishes `message` and returns the channel's id for it.
  async fn publish(&self, message: &str) -> anyhow::Result<String>;
}

/// The process-wide client handles the standard stages are built from.
///
/// Construct once at start-up and share; every stage holds a clone of the
/// `Arc` it needs rather than opening its own client per call.
#[derive(Clone)]
pub struct Adapters {
  pub objects: Arc<dyn ObjectSource>,
  pub store: Arc<dyn DurableStore>,
  pub notifier: Arc<dyn Notifier>,
}

impl Adapters {
  pub fn new(objects: Arc<dyn ObjectSource>, store: Arc<dyn DurableStore>, notifier: Arc<dyn Notifier>) -> Self {
    Self {
      objects,
      store,
      notifier,
    }
  }
}

impl std::fmt::Debug for Adapters {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Adapters").finish_non_exhaustive()
  }
}
