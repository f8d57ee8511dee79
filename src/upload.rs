//! Box upload with stamped metadata.
//!
//! The reconciler only admits a box whose object carries checksum, version,
//! and provider metadata; this is the producer side that stamps them at
//! upload time. Uploading never touches the manifest itself; a subsequent
//! sync run admits the box.

use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use boxcat_store::{
    ObjectStore, StoreError, Visibility, WriteOptions, META_CHECKSUM, META_PROVIDER, META_VERSION,
};

/// Content type for uploaded box images.
pub const BOX_CONTENT_TYPE: &str = "application/octet-stream";

/// Errors from a box upload.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("not a box file: {0}")]
    NotAFile(String),
}

/// Record of a completed upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedBox {
    /// Storage key the box was written under.
    pub key: String,

    /// Resolved public URL of the box.
    pub url: String,

    /// SHA-256 of the uploaded bytes, as stamped on the object.
    pub checksum: String,

    /// Size of the uploaded box in bytes.
    pub size: u64,
}

/// Upload the box at `path` under `prefix`, stamping the metadata the
/// catalog requires for admission.
pub fn upload_box<S: ObjectStore>(
    store: &S,
    prefix: &str,
    path: &Path,
    version: &str,
    provider: &str,
) -> Result<UploadedBox, UploadError> {
    if !path.is_file() {
        return Err(UploadError::NotAFile(path.display().to_string()));
    }
    let file_name = match path.file_name().and_then(|name| name.to_str()) {
        Some(name) => name,
        None => return Err(UploadError::NotAFile(path.display().to_string())),
    };

    let body = std::fs::read(path)?;
    let checksum = {
        let mut hasher = Sha256::new();
        hasher.update(&body);
        hex::encode(hasher.finalize())
    };

    let key = if prefix.is_empty() || prefix.ends_with('/') {
        format!("{prefix}{file_name}")
    } else {
        format!("{prefix}/{file_name}")
    };

    let options = WriteOptions::new(BOX_CONTENT_TYPE, Visibility::PublicRead)
        .with_metadata(META_CHECKSUM, &checksum)
        .with_metadata(META_VERSION, version)
        .with_metadata(META_PROVIDER, provider);
    store.write(&key, &body, &options)?;

    Ok(UploadedBox {
        url: store.url(&key),
        key,
        checksum,
        size: body.len() as u64,
    })
}
