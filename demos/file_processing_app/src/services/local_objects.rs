// file_processing_app/src/services/local_objects.rs

use anyhow::{bail, Context};
use async_trait::async_trait;
use sluice::{ObjectMetadata, ObjectSource, SourceLocation};
use std::path::{Component, Path, PathBuf};
use tokio::io::AsyncReadExt;
use tracing::debug;

/// Serves files from a local directory tree: `<root>/<container>/<key>`.
///
/// The content type is inferred from the file extension, as object stores do
/// for uploads without an explicit type.
///
/// `head` and `get` look at the file at different moments, so a file that
/// grows after Validate would otherwise be read in full. With a read limit set,
/// `get` fails instead of returning more bytes than the limit.
#[derive(Debug, Clone)]
pub struct LocalObjectSource {
  root: PathBuf,
  read_limit: Option<u64>,
}

impl LocalObjectSource {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into(), read_limit: None }
  }

  pub fn with_read_limit(mut self, max_bytes: u64) -> Self {
    self.read_limit = Some(max_bytes);
    self
  }

  fn resolve(&self, location: &SourceLocation) -> anyhow::Result<PathBuf> {
    for part in [location.container(), location.key()] {
      let escapes = Path::new(part)
        .components()
        .any(|c| !matches!(c, Component::Normal(_)));
      if escapes {
        bail!("location {} escapes the data directory", location);
      }
    }
    Ok(self.root.join(location.container()).join(location.key()))
  }
}

pub fn content_type_for(path: &Path) -> Option<&'static str> {
  let extension = path.extension()?.to_str()?.to_ascii_lowercase();
  match extension.as_str() {
    "csv" => Some("text/csv"),
    "tsv" => Some("text/tab-separated-values"),
    "txt" => Some("text/plain"),
    "json" => Some("application/json"),
    "png" => Some("image/png"),
    "jpg" | "jpeg" => Some("image/jpeg"),
    _ => None,
  }
}

#[async_trait]
impl ObjectSource for LocalObjectSource {
  async fn head(&self, location: &SourceLocation) -> anyhow::Result<ObjectMetadata> {
    let path = self.resolve(location)?;
    let metadata = tokio::fs::metadata(&path)
      .await
      .with_context(|| format!("object {} does not exist", location))?;
    if !metadata.is_file() {
      bail!("object {} is not a regular file", location);
    }
    debug!(path = %path.display(), bytes = metadata.len(), "Local object metadata read.");
    Ok(ObjectMetadata {
      content_length: metadata.len(),
      content_type: content_type_for(&path).map(str::to_string),
    })
  }

  async fn get(&self, location: &SourceLocation) -> anyhow::Result<Vec<u8>> {
    let path = self.resolve(location)?;
    let Some(limit) = self.read_limit else {
      return tokio::fs::read(&path)
        .await
        .with_context(|| format!("could not read {}", path.display()));
    };
    let file = tokio::fs::File::open(&path)
      .await
      .with_context(|| format!("could not read {}", path.display()))?;
    let mut body = Vec::new();
    file
      .take(limit.saturating_add(1))
      .read_to_end(&mut body)
      .await
      .with_context(|| format!("could not read {}", path.display()))?;
    if body.len() as u64 > limit {
      bail!("object {} grew past {} bytes after validation", location, limit);
    }
    Ok(body)
  }
}
