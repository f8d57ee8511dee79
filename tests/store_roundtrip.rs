//! End-to-end tests against the filesystem store.
//!
//! Covers the producer-to-catalog path: upload a box with stamped metadata,
//! reconcile, and read the published manifest back from disk.

use std::fs;
use std::path::Path;

use boxcat::catalog::Catalog;
use boxcat::reconcile::{self, ReconcileError};
use boxcat::upload_box;
use boxcat_store::{FsStore, ObjectStore};
use sha2::{Digest, Sha256};
use tempfile::TempDir;

const MANIFEST_KEY: &str = "boxes.json";

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

fn open_store(root: &Path) -> FsStore {
    FsStore::new(root, Some("https://releases.test".to_string())).unwrap()
}

fn write_box_file(dir: &Path, name: &str, contents: &[u8]) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_upload_then_sync_admits_box() {
    let store_dir = TempDir::new().unwrap();
    let build_dir = TempDir::new().unwrap();
    let store = open_store(store_dir.path());

    let box_path = write_box_file(build_dir.path(), "demo_1.0.0_virtualbox.box", b"box bytes");
    let uploaded = upload_box(&store, "boxes/", &box_path, "1.0.0", "virtualbox").unwrap();
    assert_eq!(uploaded.checksum, sha256_hex(b"box bytes"));

    let summary = reconcile::run(&store, "boxes", "boxes/", MANIFEST_KEY).unwrap();
    assert_eq!(summary.added, 1);

    let catalog = Catalog::from_json(&store.read(MANIFEST_KEY).unwrap()).unwrap();
    let version = catalog.version("1.0.0").unwrap();
    assert_eq!(version.providers.len(), 1);
    assert_eq!(version.providers[0].name, "virtualbox");
    assert_eq!(version.providers[0].checksum, uploaded.checksum);
    assert_eq!(
        version.providers[0].url,
        "https://releases.test/boxes/demo_1.0.0_virtualbox.box"
    );
}

#[test]
fn test_fs_sync_is_idempotent() {
    let store_dir = TempDir::new().unwrap();
    let build_dir = TempDir::new().unwrap();
    let store = open_store(store_dir.path());

    let vb = write_box_file(build_dir.path(), "demo-vb.box", b"virtualbox bytes");
    let vmw = write_box_file(build_dir.path(), "demo-vmw.box", b"vmware bytes");
    upload_box(&store, "boxes/", &vb, "1.0.0", "virtualbox").unwrap();
    upload_box(&store, "boxes/", &vmw, "1.0.0", "vmware").unwrap();

    reconcile::run(&store, "boxes", "boxes/", MANIFEST_KEY).unwrap();
    let first = store.read(MANIFEST_KEY).unwrap();

    let summary = reconcile::run(&store, "boxes", "boxes/", MANIFEST_KEY).unwrap();
    let second = store.read(MANIFEST_KEY).unwrap();

    assert_eq!(first, second);
    assert_eq!(summary.added, 0);
    assert_eq!(summary.skipped, 2);
}

#[test]
fn test_listing_sees_only_box_objects() {
    let store_dir = TempDir::new().unwrap();
    let build_dir = TempDir::new().unwrap();
    let store = open_store(store_dir.path());

    let box_path = write_box_file(build_dir.path(), "demo.box", b"box bytes");
    upload_box(&store, "boxes/", &box_path, "1.0.0", "virtualbox").unwrap();
    reconcile::run(&store, "boxes", "boxes/", MANIFEST_KEY).unwrap();

    // Neither the metadata sidecars nor the manifest itself show up as
    // candidates.
    let keys = store.list("boxes/").unwrap();
    assert_eq!(keys, vec!["boxes/demo.box"]);
}

#[test]
fn test_out_of_band_box_without_metadata_fails_sync() {
    let store_dir = TempDir::new().unwrap();
    let store = open_store(store_dir.path());

    // A box dropped into the bucket without going through upload carries no
    // stamped metadata and must fail the run rather than be published
    // without a checksum.
    fs::create_dir_all(store_dir.path().join("boxes")).unwrap();
    fs::write(store_dir.path().join("boxes/rogue.box"), b"bytes").unwrap();

    let err = reconcile::run(&store, "boxes", "boxes/", MANIFEST_KEY).unwrap_err();
    assert!(matches!(
        err,
        ReconcileError::MissingMetadata { ref key, field: "checksum" } if key == "boxes/rogue.box"
    ));
    assert!(!store_dir.path().join(MANIFEST_KEY).exists());
}

#[test]
fn test_manifest_lands_at_configured_key_with_sidecar() {
    let store_dir = TempDir::new().unwrap();
    let store = open_store(store_dir.path());

    reconcile::run(&store, "boxes", "boxes/", MANIFEST_KEY).unwrap();

    let manifest_path = store_dir.path().join(MANIFEST_KEY);
    assert!(manifest_path.is_file());
    let raw = fs::read(&manifest_path).unwrap();
    assert_eq!(raw, br#"{"name":"boxes","versions":[]}"#);

    let sidecar: serde_json::Value =
        serde_json::from_slice(&fs::read(store_dir.path().join("boxes.json.meta.json")).unwrap())
            .unwrap();
    assert_eq!(sidecar["content_type"], "application/json");
    assert_eq!(sidecar["visibility"], "public-read");
}

#[test]
fn test_no_temp_files_left_behind() {
    let store_dir = TempDir::new().unwrap();
    let build_dir = TempDir::new().unwrap();
    let store = open_store(store_dir.path());

    let box_path = write_box_file(build_dir.path(), "demo.box", b"box bytes");
    upload_box(&store, "boxes/", &box_path, "1.0.0", "virtualbox").unwrap();
    reconcile::run(&store, "boxes", "boxes/", MANIFEST_KEY).unwrap();

    let temp_dir = store_dir.path().join(".tmp");
    if temp_dir.exists() {
        assert_eq!(fs::read_dir(&temp_dir).unwrap().count(), 0);
    }
}
