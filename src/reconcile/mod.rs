//! Catalog reconciliation.
//!
//! Drives the update of the published catalog from the set of boxes actually
//! present in storage. Each candidate key is processed independently, in the
//! order the listing returned it: candidates whose resolved URL is already
//! cataloged are skipped, anything else must carry checksum, version, and
//! provider metadata to be admitted. A run that gets through every candidate
//! persists the catalog exactly once; any failure aborts with nothing
//! written, leaving the previously published manifest authoritative.
//!
//! Running twice against an unchanged listing is a no-op the second time.

mod summary;

pub use summary::{AddedBox, ReconcileSummary};

use std::collections::BTreeMap;

use boxcat_store::{ObjectStore, StoreError, META_CHECKSUM, META_PROVIDER, META_VERSION};
use thiserror::Error;

use crate::catalog::{self, BoxProvider, Catalog, CatalogError, PersistError, CHECKSUM_TYPE};

/// Errors that abort a reconciliation run.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Persist(#[from] PersistError),

    /// A candidate lacks one of the required metadata fields. A catalog
    /// entry without a checksum is unsafe to publish, so the run aborts
    /// rather than silently dropping the candidate.
    #[error("missing {field} metadata for '{key}'")]
    MissingMetadata { key: String, field: &'static str },

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Reconciles candidate box keys into a catalog.
pub struct Reconciler<'a, S: ObjectStore> {
    store: &'a S,
}

impl<'a, S: ObjectStore> Reconciler<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Merge every candidate not already cataloged.
    ///
    /// Mutates only the in-memory catalog; persisting the result is the
    /// caller's decision. The first missing-metadata field or duplicate
    /// `(version, provider)` pair fails the whole run.
    pub fn reconcile(
        &self,
        catalog: &mut Catalog,
        keys: &[String],
    ) -> Result<ReconcileSummary, ReconcileError> {
        let mut added = Vec::new();
        let mut skipped = 0;

        for key in keys {
            let url = self.store.url(key);
            if catalog.contains_url(&url) {
                skipped += 1;
                continue;
            }

            let (version, provider) = self.fetch_provider(key, &url)?;
            let provider_name = provider.name.clone();
            catalog.merge(&version, provider)?;
            added.push(AddedBox {
                key: key.clone(),
                version,
                provider: provider_name,
            });
        }

        Ok(ReconcileSummary::new(&catalog.name, keys.len(), skipped, added))
    }

    /// Fetch and validate a candidate's metadata, producing the provider
    /// entry to merge and the version to merge it under.
    fn fetch_provider(
        &self,
        key: &str,
        url: &str,
    ) -> Result<(String, BoxProvider), ReconcileError> {
        let headers = self.store.headers(key)?;

        let checksum = required(&headers, META_CHECKSUM, key, "checksum")?;
        let version = required(&headers, META_VERSION, key, "version")?;
        let name = required(&headers, META_PROVIDER, key, "provider")?;

        let provider = BoxProvider {
            name,
            url: url.to_string(),
            checksum_type: CHECKSUM_TYPE.to_string(),
            checksum,
        };
        Ok((version, provider))
    }
}

fn required(
    headers: &BTreeMap<String, String>,
    meta_key: &str,
    key: &str,
    field: &'static str,
) -> Result<String, ReconcileError> {
    match headers.get(meta_key) {
        Some(value) if !value.is_empty() => Ok(value.clone()),
        _ => Err(ReconcileError::MissingMetadata {
            key: key.to_string(),
            field,
        }),
    }
}

/// One full reconciliation run: load the catalog, list the boxes under
/// `prefix`, merge, and publish the result at `manifest_key`.
///
/// Progress is reported on stderr; the returned summary is the caller's to
/// render. The catalog is persisted exactly once, after every candidate has
/// been merged.
pub fn run<S: ObjectStore>(
    store: &S,
    catalog_name: &str,
    prefix: &str,
    manifest_key: &str,
) -> Result<ReconcileSummary, ReconcileError> {
    eprintln!("fetching catalog '{catalog_name}' from {manifest_key}");
    let mut catalog = catalog::load_or_bootstrap(store, manifest_key, catalog_name)?;

    eprintln!("listing boxes under {prefix}");
    let keys = store.list(prefix)?;
    for key in &keys {
        eprintln!("found box: {key}");
    }

    let summary = Reconciler::new(store).reconcile(&mut catalog, &keys)?;
    for added in &summary.added_boxes {
        eprintln!("added box to catalog: {}", added.key);
    }

    eprintln!("saving catalog");
    catalog::save(store, &catalog, manifest_key)?;

    Ok(summary)
}
