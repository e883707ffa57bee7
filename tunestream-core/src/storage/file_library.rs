//! Catalog built by scanning a library directory for uploaded MP3 files

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::catalog::MediaCatalog;
use crate::media::{BackingRef, MediaResource, ResourceId};

/// Catalog for a directory of uploaded audio.
///
/// Each `.mp3` file becomes a resource whose id is the file stem and whose
/// backing reference is the path relative to the library root, so it pairs
/// with a [`super::FileStore`] rooted at the same directory.
#[derive(Debug, Clone)]
pub struct LibraryCatalog {
    root: PathBuf,
    resources: Arc<RwLock<HashMap<ResourceId, MediaResource>>>,
}

impl LibraryCatalog {
    /// Create an empty catalog for `root`; call [`Self::scan`] to populate it
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            resources: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create a catalog and scan it once
    ///
    /// # Errors
    /// - `std::io::Error` - Failed to read the library root
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, std::io::Error> {
        let catalog = Self::new(root);
        catalog.scan().await?;
        Ok(catalog)
    }

    /// Root directory of the library
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Rescan the library, replacing previous entries.
    ///
    /// Returns the number of resources found. Unreadable subdirectories are
    /// skipped with a warning; the root itself must be readable.
    ///
    /// # Errors
    /// - `std::io::Error` - Failed to read the library root
    pub async fn scan(&self) -> Result<usize, std::io::Error> {
        let mut found = HashMap::new();
        let mut pending = vec![self.root.clone()];
        let mut is_root = true;

        while let Some(dir) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if !is_root => {
                    warn!("Skipping unreadable directory {}: {}", dir.display(), e);
                    continue;
                }
                Err(e) => return Err(e),
            };
            is_root = false;

            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                let file_type = entry.file_type().await?;

                if file_type.is_dir() {
                    pending.push(path);
                } else if file_type.is_file() && is_mp3(&path) {
                    let metadata = entry.metadata().await?;
                    if let Some(resource) = self.resource_from_path(&path, metadata.len()) {
                        if found.contains_key(&resource.id) {
                            warn!(
                                "Duplicate resource id {} at {}, keeping first",
                                resource.id,
                                path.display()
                            );
                            continue;
                        }
                        found.insert(resource.id.clone(), resource);
                    }
                }
            }
        }

        let count = found.len();
        *self.resources.write().await = found;
        debug!("Scanned {} resources under {}", count, self.root.display());
        Ok(count)
    }

    fn resource_from_path(&self, path: &Path, size: u64) -> Option<MediaResource> {
        let stem = path.file_stem()?.to_str()?;
        let id = match ResourceId::new(stem) {
            Ok(id) => id,
            Err(e) => {
                warn!("Ignoring {}: {}", path.display(), e);
                return None;
            }
        };

        let relative = path.strip_prefix(&self.root).ok()?;
        let reference = relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        Some(MediaResource::new(id, BackingRef::new(reference), size))
    }
}

fn is_mp3(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("mp3"))
}

#[async_trait]
impl MediaCatalog for LibraryCatalog {
    async fn lookup_resource(&self, id: &ResourceId) -> Option<MediaResource> {
        self.resources.read().await.get(id).cloned()
    }

    async fn list_resources(&self) -> Vec<MediaResource> {
        let mut resources: Vec<_> = self.resources.read().await.values().cloned().collect();
        resources.sort_by(|a, b| a.id.cmp(&b.id));
        resources
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::storage::{BackingStore, FileStore};

    async fn create_library() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        tokio::fs::write(root.join("first.mp3"), vec![1u8; 1000])
            .await
            .unwrap();
        tokio::fs::write(root.join("cover.jpg"), vec![0u8; 10])
            .await
            .unwrap();
        tokio::fs::create_dir(root.join("albums")).await.unwrap();
        tokio::fs::write(root.join("albums").join("Second.MP3"), vec![2u8; 42])
            .await
            .unwrap();

        temp_dir
    }

    #[tokio::test]
    async fn test_scan_finds_mp3_files_recursively() {
        let temp_dir = create_library().await;
        let catalog = LibraryCatalog::open(temp_dir.path()).await.unwrap();

        let resources = catalog.list_resources().await;
        let ids: Vec<_> = resources.iter().map(|r| r.id.to_string()).collect();
        assert_eq!(ids, vec!["Second", "first"]);

        let first = catalog
            .lookup_resource(&ResourceId::new("first").unwrap())
            .await
            .unwrap();
        assert_eq!(first.total_length, 1000);
        assert_eq!(first.backing.as_str(), "first.mp3");

        let second = catalog
            .lookup_resource(&ResourceId::new("Second").unwrap())
            .await
            .unwrap();
        assert_eq!(second.backing.as_str(), "albums/Second.MP3");
    }

    #[tokio::test]
    async fn test_backing_refs_resolve_in_file_store() {
        let temp_dir = create_library().await;
        let catalog = LibraryCatalog::open(temp_dir.path()).await.unwrap();
        let store = FileStore::new(temp_dir.path());

        for resource in catalog.list_resources().await {
            assert!(store.contains(&resource.backing).await);
        }
    }

    #[tokio::test]
    async fn test_rescan_drops_deleted_files() {
        let temp_dir = create_library().await;
        let catalog = LibraryCatalog::open(temp_dir.path()).await.unwrap();

        tokio::fs::remove_file(temp_dir.path().join("first.mp3"))
            .await
            .unwrap();
        assert_eq!(catalog.scan().await.unwrap(), 1);
        assert!(
            catalog
                .lookup_resource(&ResourceId::new("first").unwrap())
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_scan_missing_root_fails() {
        let temp_dir = TempDir::new().unwrap();
        let catalog = LibraryCatalog::new(temp_dir.path().join("nope"));
        assert!(catalog.scan().await.is_err());
    }
}
