//! Media resource identity and metadata as seen by the streaming core.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Content type of every resource served by TuneStream.
pub const AUDIO_MPEG: &str = "audio/mpeg";

/// Identifier of a song in the catalog.
///
/// Identifiers travel in URL paths and are used to derive storage keys, so
/// they must be non-empty and free of path separators.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    /// Creates a resource id after validating it.
    ///
    /// # Errors
    ///
    /// - `ResourceIdError::Empty` - If the id is empty
    /// - `ResourceIdError::InvalidCharacter` - If the id contains a path separator,
    ///   a NUL byte, or is a relative path component
    pub fn new(id: impl Into<String>) -> Result<Self, ResourceIdError> {
        let id = id.into();
        if id.is_empty() {
            return Err(ResourceIdError::Empty);
        }
        if id == "." || id == ".." || id.contains(['/', '\\', '\0']) {
            return Err(ResourceIdError::InvalidCharacter { id });
        }
        Ok(Self(id))
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ResourceId {
    type Err = ResourceIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Errors produced when parsing a [`ResourceId`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResourceIdError {
    /// The identifier was empty.
    #[error("resource id is empty")]
    Empty,

    /// The identifier contained characters that are not allowed.
    #[error("resource id contains invalid characters: {id:?}")]
    InvalidCharacter {
        /// The rejected identifier
        id: String,
    },
}

/// Opaque handle to the bytes of a resource inside a backing store.
///
/// For [`crate::storage::FileStore`] this is a path relative to the library
/// root; other stores treat it as a plain key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct BackingRef(String);

impl BackingRef {
    /// Creates a backing reference from a key or relative path.
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// Returns the reference as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BackingRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A streamable song as resolved by the catalog.
///
/// `total_length` is authoritative: the handler never streams more bytes than
/// it declares, and a store holding fewer bytes is treated as an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaResource {
    pub id: ResourceId,
    pub backing: BackingRef,
    pub total_length: u64,
    pub content_type: &'static str,
}

impl MediaResource {
    /// Creates an `audio/mpeg` resource.
    pub fn new(id: ResourceId, backing: BackingRef, total_length: u64) -> Self {
        Self {
            id,
            backing,
            total_length,
            content_type: AUDIO_MPEG,
        }
    }

    /// Last addressable byte offset, or `None` for an empty resource.
    pub fn last_byte(&self) -> Option<u64> {
        self.total_length.checked_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_id_accepts_plain_ids() {
        let id = ResourceId::new("64f1c2a9e4b0").unwrap();
        assert_eq!(id.as_str(), "64f1c2a9e4b0");
        assert_eq!(id.to_string(), "64f1c2a9e4b0");
    }

    #[test]
    fn test_resource_id_rejects_traversal() {
        assert_eq!(ResourceId::new(""), Err(ResourceIdError::Empty));
        assert!(matches!(
            "..".parse::<ResourceId>(),
            Err(ResourceIdError::InvalidCharacter { .. })
        ));
        assert!(matches!(
            ResourceId::new("a/b"),
            Err(ResourceIdError::InvalidCharacter { .. })
        ));
        assert!(matches!(
            ResourceId::new("a\\b"),
            Err(ResourceIdError::InvalidCharacter { .. })
        ));
    }

    #[test]
    fn test_media_resource_defaults_to_mpeg() {
        let resource = MediaResource::new(
            ResourceId::new("song").unwrap(),
            BackingRef::new("song.mp3"),
            1000,
        );
        assert_eq!(resource.content_type, AUDIO_MPEG);
        assert_eq!(resource.last_byte(), Some(999));

        let empty = MediaResource::new(
            ResourceId::new("empty").unwrap(),
            BackingRef::new("empty.mp3"),
            0,
        );
        assert_eq!(empty.last_byte(), None);
    }
}
