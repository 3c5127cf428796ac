// sluice/src/adapters/memory.rs

//! In-process adapters backed by `parking_lot` locks. Used by tests,
//! benchmarks and local runs; each supports failure injection.

use super::{DurableStore, Notifier, ObjectMetadata, ObjectSource};
use crate::core::record::{SourceLocation, StoreItem};
use anyhow::{anyhow, bail};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap};
use tracing::{event, Level};

#[derive(Debug, Clone)]
struct StoredObject {
  body: Vec<u8>,
  content_type: Option<String>,
}

/// Objects keyed by `(container, key)`.
#[derive(Debug, Default)]
pub struct InMemoryObjectSource {
  objects: RwLock<HashMap<SourceLocation, StoredObject>>,
}

impl InMemoryObjectSource {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&self, location: SourceLocation, body: impl Into<Vec<u8>>, content_type: Option<&str>) {
    self.objects.write().insert(
      location,
      StoredObject {
        body: body.into(),
        content_type: content_type.map(str::to_string),
      },
    );
  }

  pub fn remove(&self, location: &SourceLocation) {
    self.objects.write().remove(location);
  }
}

#[async_trait]
impl ObjectSource for InMemoryObjectSource {
  async fn head(&self, location: &SourceLocation) -> anyhow::Result<ObjectMetadata> {
    let guard = self.objects.read();
    let object = guard
      .get(location)
      .ok_or_else(|| anyhow!("object {} does not exist", location))?;
    Ok(ObjectMetadata {
      content_length: object.body.len() as u64,
      content_type: object.content_type.clone(),
    })
  }

  async fn get(&self, location: &SourceLocation) -> anyhow::Result<Vec<u8>> {
    let guard = self.objects.read();
    guard
      .get(location)
      .map(|object| object.body.clone())
      .ok_or_else(|| anyhow!("object {} does not exist", location))
  }
}

/// A keyed store that remembers every successful write.
#[derive(Debug, Default)]
pub struct InMemoryStore {
  items: RwLock<BTreeMap<String, StoreItem>>,
  puts: Mutex<usize>,
  fail_on_put: Mutex<Option<usize>>,
}

impl InMemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Makes the `nth` put from now on (1-based) fail. Earlier and later puts succeed.
  pub fn fail_on_put(&self, nth: usize) {
    *self.puts.lock() = 0;
    *self.fail_on_put.lock() = Some(nth);
  }

  pub fn get(&self, key: &str) -> Option<StoreItem> {
    self.items.read().get(key).cloned()
  }

  pub fn len(&self) -> usize {
    self.items.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.read().is_empty()
  }

  /// Copy of the whole store, ordered by key.
  pub fn snapshot(&self) -> BTreeMap<String, StoreItem> {
    self.items.read().clone()
  }

  /// Number of put calls made, including failed ones.
  pub fn put_count(&self) -> usize {
    *self.puts.lock()
  }
}

#[async_trait]
impl DurableStore for InMemoryStore {
  async fn put(&self, key: &str, item: StoreItem) -> anyhow::Result<()> {
    let attempt = {
      let mut puts = self.puts.lock();
      *puts += 1;
      *puts
    };
    if *self.fail_on_put.lock() == Some(attempt) {
      event!(Level::DEBUG, %key, attempt, "Injected store failure.");
      bail!("injected failure on put #{} (key {})", attempt, key);
    }
    self.items.write().insert(key.to_string(), item);
    Ok(())
  }
}

/// Collects published messages.
#[derive(Debug, Default)]
pub struct InMemoryNotifier {
  messages: Mutex<Vec<(String, String)>>,
  failing: Mutex<bool>,
}

impl InMemoryNotifier {
  pub fn new() -> Self {
    Self::default()
  }

  /// While set, every publish fails.
  pub fn set_failing(&self, failing: bool) {
    *self.failing.lock() = failing;
  }

  /// Published messages in order.
  pub fn messages(&self) -> Vec<String> {
    self.messages.lock().iter().map(|(_, message)| message.clone()).collect()
  }
}

#[async_trait]
impl Notifier for InMemoryNotifier {
  async fn publish(&self, message: &str) -> anyhow::Result<String> {
    if *self.failing.lock() {
      bail!("notification channel unavailable");
    }
    let id = uuid::Uuid::new_v4().to_string();
    self.messages.lock().push((id.clone(), message.to_string()));
    Ok(id)
  }
}
