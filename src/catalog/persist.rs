//! Catalog persistence against the object store.
//!
//! The manifest lives at a well-known key. Loading tolerates a missing key
//! (the bootstrap path for a never-before-published catalog); saving happens
//! exactly once, at the end of a successful run, with no retry at this
//! layer.

use boxcat_store::{ObjectStore, StoreError, Visibility, WriteOptions, MANIFEST_CONTENT_TYPE};
use thiserror::Error;

use super::{Catalog, CatalogError};

/// Errors from loading or saving the catalog.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("persisted catalog at '{key}' failed to parse: {source}")]
    Malformed {
        key: String,
        #[source]
        source: CatalogError,
    },

    #[error("failed to serialize catalog: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Load the catalog at `key`, or bootstrap an empty catalog named `name`
/// when no manifest has been published yet.
///
/// A manifest that exists but fails to parse aborts the run; merging onto
/// an unparseable base would risk silent data loss.
pub fn load_or_bootstrap<S: ObjectStore>(
    store: &S,
    key: &str,
    name: &str,
) -> Result<Catalog, PersistError> {
    match store.read(key) {
        Ok(bytes) => Catalog::from_json(&bytes).map_err(|source| PersistError::Malformed {
            key: key.to_string(),
            source,
        }),
        Err(StoreError::NotFound(_)) => Ok(Catalog::new(name)),
        Err(err) => Err(err.into()),
    }
}

/// Serialize and publish the catalog at `key` with the manifest content
/// type and public-read visibility.
pub fn save<S: ObjectStore>(store: &S, catalog: &Catalog, key: &str) -> Result<(), PersistError> {
    let body = catalog.to_json()?;
    let options = WriteOptions::new(MANIFEST_CONTENT_TYPE, Visibility::PublicRead);
    store.write(key, &body, &options)?;
    Ok(())
}
