//! Box catalog model.
//!
//! The catalog is the published index consumers query to discover which box
//! variants exist for a release: a named collection of versions, each
//! holding the providers available for that release. Field names are part of
//! the published wire contract and must round-trip byte-for-byte with any
//! manifest already in the store, so serialization preserves in-memory
//! insertion order and never re-sorts.
//!
//! Version identifiers are opaque strings at this layer; no semantic-version
//! parsing or ordering is applied.

mod persist;

pub use persist::{load_or_bootstrap, save, PersistError};

use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Hash algorithm identifier recorded on every catalog entry.
pub const CHECKSUM_TYPE: &str = "sha256";

/// Errors from catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("malformed catalog: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("'{provider}' box already exists in catalog for version {version}")]
    DuplicateProvider { version: String, provider: String },
}

/// One box variant (platform/format) within a version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoxProvider {
    /// Variant identifier (e.g. "virtualbox").
    pub name: String,

    /// Resolved public URL of the box in the store.
    pub url: String,

    /// Hash algorithm identifier; always [`CHECKSUM_TYPE`].
    pub checksum_type: String,

    /// Content hash of the box.
    pub checksum: String,
}

/// One release's grouping of box variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoxVersion {
    /// Release version identifier, opaque to this layer.
    pub version: String,

    /// Providers belonging to this version, in discovery order.
    pub providers: Vec<BoxProvider>,
}

/// The published index of boxes for one named release line.
///
/// Owned exclusively by one reconciliation run: loaded fresh at the start,
/// mutated in memory through [`Catalog::merge`] only, and persisted once at
/// the end of a successful run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    /// Catalog identifier; immutable once created.
    pub name: String,

    /// Versions in discovery order.
    ///
    /// Some published manifests render an empty list as `null`; both forms
    /// deserialize to an empty sequence.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub versions: Vec<BoxVersion>,

    /// Set of every cataloged provider URL, built on first membership query.
    /// `merge` is the only sanctioned mutation path and keeps it current.
    #[serde(skip)]
    url_index: Option<HashSet<String>>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<BoxVersion>, D::Error>
where
    D: Deserializer<'de>,
{
    let versions = Option::<Vec<BoxVersion>>::deserialize(deserializer)?;
    Ok(versions.unwrap_or_default())
}

impl Catalog {
    /// Empty catalog, the bootstrap value for a never-published manifest.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            versions: Vec::new(),
            url_index: None,
        }
    }

    /// Deserialize a persisted manifest.
    pub fn from_json(bytes: &[u8]) -> Result<Self, CatalogError> {
        serde_json::from_slice(bytes).map_err(CatalogError::Malformed)
    }

    /// Render the manifest in its persisted form, preserving the current
    /// version/provider order.
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// True when a provider with this URL is already cataloged.
    pub fn contains_url(&mut self, url: &str) -> bool {
        if self.url_index.is_none() {
            let index = self
                .versions
                .iter()
                .flat_map(|version| version.providers.iter())
                .map(|provider| provider.url.clone())
                .collect();
            self.url_index = Some(index);
        }
        self.url_index
            .as_ref()
            .map(|index| index.contains(url))
            .unwrap_or(false)
    }

    /// Merge a provider under `version`.
    ///
    /// Appends to the existing version, or creates a new version holding
    /// exactly this provider. A provider with the same name already present
    /// under that version is a data error, not a retryable condition; the
    /// catalog is left unchanged and the run must abort.
    pub fn merge(&mut self, version: &str, provider: BoxProvider) -> Result<(), CatalogError> {
        let position = self.versions.iter().position(|v| v.version == version);

        if let Some(position) = position {
            if self.versions[position]
                .providers
                .iter()
                .any(|existing| existing.name == provider.name)
            {
                return Err(CatalogError::DuplicateProvider {
                    version: version.to_string(),
                    provider: provider.name,
                });
            }
            if let Some(index) = self.url_index.as_mut() {
                index.insert(provider.url.clone());
            }
            self.versions[position].providers.push(provider);
        } else {
            if let Some(index) = self.url_index.as_mut() {
                index.insert(provider.url.clone());
            }
            self.versions.push(BoxVersion {
                version: version.to_string(),
                providers: vec![provider],
            });
        }
        Ok(())
    }

    /// Look up a version by identifier.
    pub fn version(&self, version: &str) -> Option<&BoxVersion> {
        self.versions.iter().find(|v| v.version == version)
    }

    /// Total number of cataloged boxes across all versions.
    pub fn box_count(&self) -> usize {
        self.versions.iter().map(|v| v.providers.len()).sum()
    }

    /// True when no version has been cataloged yet.
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}
