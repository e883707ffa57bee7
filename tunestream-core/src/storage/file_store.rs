//! Backing store over a directory of uploaded files.

use std::io::SeekFrom;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::debug;

use super::{BackingStore, RangeReader, StoreError, ensure_length};
use crate::media::BackingRef;
use crate::streaming::ByteRange;

/// Serves bytes from files under a single root directory.
///
/// References are relative paths. Anything that would escape the root
/// (absolute paths, `..`, drive prefixes) is rejected.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Creates a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a reference to a path inside the root directory.
    ///
    /// # Errors
    ///
    /// - `StoreError::InvalidReference` - If the reference is empty or escapes the root
    pub fn resolve(&self, reference: &BackingRef) -> Result<PathBuf, StoreError> {
        let relative = Path::new(reference.as_str());
        let mut resolved = self.root.clone();
        let mut depth = 0;

        for component in relative.components() {
            match component {
                Component::Normal(part) => {
                    resolved.push(part);
                    depth += 1;
                }
                Component::CurDir => {}
                _ => {
                    return Err(StoreError::InvalidReference {
                        reference: reference.clone(),
                    });
                }
            }
        }

        if depth == 0 {
            return Err(StoreError::InvalidReference {
                reference: reference.clone(),
            });
        }

        Ok(resolved)
    }
}

#[async_trait]
impl BackingStore for FileStore {
    async fn contains(&self, reference: &BackingRef) -> bool {
        let Ok(path) = self.resolve(reference) else {
            return false;
        };

        match tokio::fs::metadata(&path).await {
            Ok(metadata) => metadata.is_file(),
            Err(_) => false,
        }
    }

    async fn open(
        &self,
        reference: &BackingRef,
        range: ByteRange,
    ) -> Result<RangeReader, StoreError> {
        let path = self.resolve(reference)?;

        let mut file = match tokio::fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound {
                    reference: reference.clone(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        let actual = file.metadata().await?.len();
        ensure_length(reference, range, actual)?;

        file.seek(SeekFrom::Start(range.start())).await?;

        debug!(
            "FileStore: opened {} at {} for {} bytes",
            path.display(),
            range.start(),
            range.length()
        );

        Ok(Box::pin(file.take(range.length())))
    }

    fn store_type(&self) -> &'static str {
        "file_store"
    }
}
