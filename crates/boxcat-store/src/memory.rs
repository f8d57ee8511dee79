//! In-memory object store.
//!
//! Test collaborator for the reconciliation core: objects are seeded
//! directly, listing order is deterministic (key order), and individual
//! operations can be made to fail to exercise transient-I/O paths.

use std::collections::{BTreeMap, HashSet};
use std::io;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::{ObjectStore, StoreError, Visibility, WriteOptions};

/// A stored object with its descriptive state.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub content_type: String,
    pub visibility: Visibility,
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
struct Inner {
    objects: BTreeMap<String, StoredObject>,
    fail_headers: HashSet<String>,
    fail_writes: bool,
}

/// In-memory object store with failure injection.
#[derive(Debug)]
pub struct MemoryStore {
    bucket: String,
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// New empty store; `bucket` only shapes resolved URLs.
    pub fn new(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Seed an object directly, bypassing `write`.
    pub fn put_object(&self, key: &str, body: &[u8], metadata: BTreeMap<String, String>) {
        self.write_inner().objects.insert(
            key.to_string(),
            StoredObject {
                body: body.to_vec(),
                content_type: "application/octet-stream".to_string(),
                visibility: Visibility::Private,
                metadata,
            },
        );
    }

    /// Snapshot of a stored object, for assertions.
    pub fn get(&self, key: &str) -> Option<StoredObject> {
        self.read_inner().objects.get(key).cloned()
    }

    /// Make `headers(key)` fail with an I/O error.
    pub fn fail_headers_for(&self, key: &str) {
        self.write_inner().fail_headers.insert(key.to_string());
    }

    /// Make every `write` fail with an I/O error.
    pub fn set_fail_writes(&self, enabled: bool) {
        self.write_inner().fail_writes = enabled;
    }

    fn read_inner(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_inner(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ObjectStore for MemoryStore {
    fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .read_inner()
            .objects
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn headers(&self, key: &str) -> Result<BTreeMap<String, String>, StoreError> {
        let inner = self.read_inner();
        if inner.fail_headers.contains(key) {
            return Err(StoreError::Io(io::Error::other(format!(
                "injected headers failure for '{key}'"
            ))));
        }
        inner
            .objects
            .get(key)
            .map(|object| object.metadata.clone())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    fn read(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        self.read_inner()
            .objects
            .get(key)
            .map(|object| object.body.clone())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    fn write(&self, key: &str, body: &[u8], options: &WriteOptions) -> Result<(), StoreError> {
        let mut inner = self.write_inner();
        if inner.fail_writes {
            return Err(StoreError::Io(io::Error::other(format!(
                "injected write failure for '{key}'"
            ))));
        }
        inner.objects.insert(
            key.to_string(),
            StoredObject {
                body: body.to_vec(),
                content_type: options.content_type.clone(),
                visibility: options.visibility,
                metadata: options.metadata.clone(),
            },
        );
        Ok(())
    }

    fn url(&self, key: &str) -> String {
        format!("https://{}.test/{}", self.bucket, key)
    }
}
