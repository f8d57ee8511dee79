//! boxcat - box catalog maintenance for object-store releases.
//!
//! boxcat keeps a published box manifest in sync with the boxes actually
//! present in an object store: it loads the manifest, lists the boxes under
//! a key prefix, admits any box not yet cataloged after validating its
//! stamped metadata, and publishes the updated manifest. Runs are
//! idempotent and fail-fast; a failed run writes nothing and leaves the
//! previously published manifest authoritative.
//!
//! Reconciliation is sequential and synchronous. Concurrent invocations
//! against the same manifest key race at the persistence layer (last writer
//! wins); runs are expected to be operator-triggered and serialized
//! externally.

pub mod catalog;
pub mod config;
pub mod reconcile;
pub mod upload;

pub use catalog::{BoxProvider, BoxVersion, Catalog, CatalogError, PersistError, CHECKSUM_TYPE};
pub use config::{Config, ConfigError, Overrides};
pub use reconcile::{AddedBox, ReconcileError, ReconcileSummary, Reconciler};
pub use upload::{upload_box, UploadError, UploadedBox};
