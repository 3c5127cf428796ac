// file_processing_app/src/services/jsonl_store.rs

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sluice::{DurableStore, StoreItem};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug, Serialize, Deserialize)]
struct StoreLine {
  key: String,
  item: StoreItem,
}

/// An append-only JSON-lines file standing in for a key-value table.
///
/// Each `put` appends `{"key": .., "item": ..}`. Readers fold the lines with
/// the last write for a key winning, so a replayed run leaves the same table.
#[derive(Debug)]
pub struct JsonLinesStore {
  path: PathBuf,
  file: Mutex<File>,
}

impl JsonLinesStore {
  pub async fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
    let path = path.into();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
      tokio::fs::create_dir_all(parent)
        .await
        .with_context(|| format!("could not create {}", parent.display()))?;
    }
    let file = OpenOptions::new()
      .create(true)
      .append(true)
      .open(&path)
      .await
      .with_context(|| format!("could not open store file {}", path.display()))?;
    Ok(Self {
      path,
      file: Mutex::new(file),
    })
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// The table as of the last completed write.
  pub async fn load(path: impl AsRef<Path>) -> anyhow::Result<BTreeMap<String, StoreItem>> {
    let path = path.as_ref();
    let text = tokio::fs::read_to_string(path)
      .await
      .with_context(|| format!("could not read store file {}", path.display()))?;
    let mut table = BTreeMap::new();
    for (idx, line) in text.lines().enumerate().filter(|(_, l)| !l.trim().is_empty()) {
      let entry: StoreLine =
        serde_json::from_str(line).with_context(|| format!("store line {} is not valid", idx + 1))?;
      table.insert(entry.key, entry.item);
    }
    Ok(table)
  }
}

#[async_trait]
impl DurableStore for JsonLinesStore {
  async fn put(&self, key: &str, item: StoreItem) -> anyhow::Result<()> {
    let mut line = serde_json::to_vec(&StoreLine {
      key: key.to_string(),
      item,
    })?;
    line.push(b'\n');

    let mut file = self.file.lock().await;
    file
      .write_all(&line)
      .await
      .with_context(|| format!("could not append to {}", self.path.display()))?;
    file.flush().await?;
    debug!(%key, path = %self.path.display(), "Item appended to store.");
    Ok(())
  }
}
