//! Song catalog collaborator.
//!
//! The catalog owns song metadata (title, uploader, likes) elsewhere; the
//! streaming core only needs to resolve an id to its bytes and length.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::media::{MediaResource, ResourceId};

/// Lookup of streamable resources by id.
#[async_trait]
pub trait MediaCatalog: Send + Sync {
    /// Resolves a resource id, returning `None` when no such song exists.
    async fn lookup_resource(&self, id: &ResourceId) -> Option<MediaResource>;

    /// Returns every known resource ordered by id.
    async fn list_resources(&self) -> Vec<MediaResource>;
}

/// Catalog backed by an in-memory map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    resources: Arc<RwLock<HashMap<ResourceId, MediaResource>>>,
}

impl InMemoryCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a resource.
    pub async fn insert(&self, resource: MediaResource) {
        self.resources
            .write()
            .await
            .insert(resource.id.clone(), resource);
    }

    /// Removes a resource, returning it if it was present.
    pub async fn remove(&self, id: &ResourceId) -> Option<MediaResource> {
        self.resources.write().await.remove(id)
    }
}

#[async_trait]
impl MediaCatalog for InMemoryCatalog {
    async fn lookup_resource(&self, id: &ResourceId) -> Option<MediaResource> {
        self.resources.read().await.get(id).cloned()
    }

    async fn list_resources(&self) -> Vec<MediaResource> {
        let mut resources: Vec<_> = self.resources.read().await.values().cloned().collect();
        resources.sort_by(|a, b| a.id.cmp(&b.id));
        resources
    }
}
