//! Object store interface for boxcat.
//!
//! The catalog core talks to storage through the [`ObjectStore`] trait and
//! nothing else: listing candidate box keys, reading descriptive metadata
//! without a body, fetching and persisting the manifest, and resolving the
//! externally reachable URL of a key. Two backends are provided: a
//! filesystem store for working against a locally mirrored bucket, and an
//! in-memory store used as the test collaborator.
//!
//! All calls are blocking; the reconciliation run is sequential by design
//! and the store is expected to enforce its own request timeouts.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod fs;
pub mod memory;

pub use fs::FsStore;
pub use memory::MemoryStore;

/// Object metadata key carrying the box content checksum.
pub const META_CHECKSUM: &str = "x-amz-meta-sha256";

/// Object metadata key carrying the release version identifier.
pub const META_VERSION: &str = "x-amz-meta-box-version";

/// Object metadata key carrying the provider name.
pub const META_PROVIDER: &str = "x-amz-meta-provider";

/// Content type of the persisted catalog manifest.
pub const MANIFEST_CONTENT_TYPE: &str = "application/json";

/// Errors from object store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("unreadable metadata for '{key}': {reason}")]
    Metadata { key: String, reason: String },
}

/// Visibility of a stored object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Visibility {
    /// Readable by anyone holding the object's URL.
    PublicRead,
    /// Readable only through the store itself.
    #[default]
    Private,
}

/// Options applied to a store write.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Content type recorded with the object.
    pub content_type: String,

    /// Access level of the written object.
    pub visibility: Visibility,

    /// Descriptive metadata persisted with the object and returned by
    /// [`ObjectStore::headers`].
    pub metadata: BTreeMap<String, String>,
}

impl WriteOptions {
    /// Options with the given content type and visibility, no metadata.
    pub fn new(content_type: &str, visibility: Visibility) -> Self {
        Self {
            content_type: content_type.to_string(),
            visibility,
            metadata: BTreeMap::new(),
        }
    }

    /// Add one metadata entry.
    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }
}

/// Blocking interface to the object store holding boxes and the manifest.
///
/// Implementations must report a missing object as [`StoreError::NotFound`];
/// the persistence layer relies on that to bootstrap an empty catalog on a
/// never-before-published manifest key.
pub trait ObjectStore {
    /// Enumerate object keys under `prefix`, in a deterministic order.
    fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError>;

    /// Fetch an object's descriptive metadata without downloading its body.
    fn headers(&self, key: &str) -> Result<BTreeMap<String, String>, StoreError>;

    /// Fetch an object's full body.
    fn read(&self, key: &str) -> Result<Vec<u8>, StoreError>;

    /// Persist an object.
    fn write(&self, key: &str, body: &[u8], options: &WriteOptions) -> Result<(), StoreError>;

    /// Externally reachable URL for an object key.
    fn url(&self, key: &str) -> String;
}
