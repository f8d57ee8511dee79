//! Filesystem-backed object store.
//!
//! Maps object keys to paths under a store root, so the tool can run against
//! a locally mirrored bucket without network credentials. Descriptive
//! metadata lives in a JSON sidecar next to each object
//! (`<key>.meta.json`); writes go to a temp file first and are renamed into
//! place. Listing walks the root and returns keys in lexicographic order,
//! skipping sidecars and dot-files.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::{ObjectStore, StoreError, Visibility, WriteOptions};

/// Suffix of metadata sidecar files.
pub const SIDECAR_SUFFIX: &str = ".meta.json";

/// Sidecar contents persisted next to each object.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Sidecar {
    content_type: String,
    visibility: Visibility,
    #[serde(default)]
    metadata: BTreeMap<String, String>,
}

/// Object store rooted at a local directory.
#[derive(Debug)]
pub struct FsStore {
    root: PathBuf,
    base_url: String,
    temp_seq: AtomicU64,
}

impl FsStore {
    /// Open a store at `root`, creating the directory if needed.
    ///
    /// `base_url` is the prefix of resolved object URLs; when absent, a
    /// `file://<root>` form is used.
    pub fn new(root: impl AsRef<Path>, base_url: Option<String>) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;

        let base_url = base_url.unwrap_or_else(|| format!("file://{}", root.display()));
        Ok(Self {
            root,
            base_url: base_url.trim_end_matches('/').to_string(),
            temp_seq: AtomicU64::new(0),
        })
    }

    fn object_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    fn sidecar_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}{SIDECAR_SUFFIX}"))
    }

    fn temp_dir(&self) -> PathBuf {
        self.root.join(".tmp")
    }

    /// Write `body` to a unique temp file, then rename it to `target`.
    fn write_atomic(&self, target: &Path, body: &[u8]) -> Result<(), StoreError> {
        let temp_dir = self.temp_dir();
        fs::create_dir_all(&temp_dir)?;

        let temp_name = format!(
            ".tmp.{}.{}",
            std::process::id(),
            self.temp_seq.fetch_add(1, Ordering::Relaxed)
        );
        let temp_path = temp_dir.join(temp_name);

        let result = (|| -> io::Result<()> {
            let mut file = File::create(&temp_path)?;
            file.write_all(body)?;
            file.flush()?;
            Ok(())
        })();
        if let Err(err) = result {
            let _ = fs::remove_file(&temp_path);
            return Err(err.into());
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        if let Err(err) = fs::rename(&temp_path, target) {
            let _ = fs::remove_file(&temp_path);
            return Err(err.into());
        }
        Ok(())
    }
}

impl ObjectStore for FsStore {
    fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let mut keys = Vec::new();

        for entry in WalkDir::new(&self.root).follow_links(false) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let rel = match entry.path().strip_prefix(&self.root) {
                Ok(rel) => rel,
                Err(_) => continue,
            };

            // Skip anything under a dot-directory (including .tmp) and
            // dot-files themselves.
            if rel
                .components()
                .any(|c| c.as_os_str().to_string_lossy().starts_with('.'))
            {
                continue;
            }

            let key = rel.to_string_lossy().to_string();
            if key.ends_with(SIDECAR_SUFFIX) {
                continue;
            }
            if key.starts_with(prefix) {
                keys.push(key);
            }
        }

        keys.sort();
        Ok(keys)
    }

    fn headers(&self, key: &str) -> Result<BTreeMap<String, String>, StoreError> {
        if !self.object_path(key).is_file() {
            return Err(StoreError::NotFound(key.to_string()));
        }

        match fs::read_to_string(self.sidecar_path(key)) {
            Ok(raw) => {
                let sidecar: Sidecar =
                    serde_json::from_str(&raw).map_err(|err| StoreError::Metadata {
                        key: key.to_string(),
                        reason: err.to_string(),
                    })?;
                Ok(sidecar.metadata)
            }
            // An object written out-of-band carries no metadata.
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err.into()),
        }
    }

    fn read(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        match fs::read(self.object_path(key)) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(key.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn write(&self, key: &str, body: &[u8], options: &WriteOptions) -> Result<(), StoreError> {
        self.write_atomic(&self.object_path(key), body)?;

        let sidecar = Sidecar {
            content_type: options.content_type.clone(),
            visibility: options.visibility,
            metadata: options.metadata.clone(),
        };
        let raw = serde_json::to_vec_pretty(&sidecar).map_err(|err| StoreError::Metadata {
            key: key.to_string(),
            reason: err.to_string(),
        })?;
        self.write_atomic(&self.sidecar_path(key), &raw)
    }

    fn url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{META_CHECKSUM, META_PROVIDER, META_VERSION};

    fn store() -> (tempfile::TempDir, FsStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path(), Some("https://releases.test".to_string())).unwrap();
        (dir, store)
    }

    #[test]
    fn test_write_then_read_roundtrip() {
        let (_dir, store) = store();

        let options = WriteOptions::new("application/octet-stream", Visibility::PublicRead);
        store.write("boxes/demo.box", b"box bytes", &options).unwrap();

        assert_eq!(store.read("boxes/demo.box").unwrap(), b"box bytes");
    }

    #[test]
    fn test_headers_come_from_sidecar() {
        let (_dir, store) = store();

        let options = WriteOptions::new("application/octet-stream", Visibility::PublicRead)
            .with_metadata(META_CHECKSUM, "abc123")
            .with_metadata(META_VERSION, "1.0.0")
            .with_metadata(META_PROVIDER, "virtualbox");
        store.write("boxes/demo.box", b"box bytes", &options).unwrap();

        let headers = store.headers("boxes/demo.box").unwrap();
        assert_eq!(headers.get(META_CHECKSUM).map(String::as_str), Some("abc123"));
        assert_eq!(headers.get(META_VERSION).map(String::as_str), Some("1.0.0"));
        assert_eq!(headers.get(META_PROVIDER).map(String::as_str), Some("virtualbox"));
    }

    #[test]
    fn test_headers_empty_for_out_of_band_object() {
        let (dir, store) = store();

        fs::create_dir_all(dir.path().join("boxes")).unwrap();
        fs::write(dir.path().join("boxes/manual.box"), b"bytes").unwrap();

        assert!(store.headers("boxes/manual.box").unwrap().is_empty());
    }

    #[test]
    fn test_headers_missing_object_is_not_found() {
        let (_dir, store) = store();
        assert!(matches!(
            store.headers("boxes/absent.box"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_read_missing_object_is_not_found() {
        let (_dir, store) = store();
        assert!(matches!(
            store.read("boxes/absent.box"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_list_is_sorted_and_skips_sidecars() {
        let (_dir, store) = store();

        let options = WriteOptions::new("application/octet-stream", Visibility::Private);
        store.write("boxes/b.box", b"b", &options).unwrap();
        store.write("boxes/a.box", b"a", &options).unwrap();
        store.write("other/c.box", b"c", &options).unwrap();

        let keys = store.list("boxes/").unwrap();
        assert_eq!(keys, vec!["boxes/a.box", "boxes/b.box"]);
    }

    #[test]
    fn test_list_skips_temp_files() {
        let (dir, store) = store();

        let options = WriteOptions::new("application/octet-stream", Visibility::Private);
        store.write("boxes/a.box", b"a", &options).unwrap();
        fs::create_dir_all(dir.path().join(".tmp")).unwrap();
        fs::write(dir.path().join(".tmp/.tmp.1.body"), b"partial").unwrap();

        let keys = store.list("").unwrap();
        assert_eq!(keys, vec!["boxes/a.box"]);
    }

    #[test]
    fn test_url_resolution() {
        let (_dir, store) = store();
        assert_eq!(
            store.url("boxes/demo.box"),
            "https://releases.test/boxes/demo.box"
        );
    }

    #[test]
    fn test_default_base_url_is_file_scheme() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path(), None).unwrap();
        assert!(store.url("boxes/demo.box").starts_with("file://"));
    }
}
