//! Reconciliation run report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One box admitted to the catalog during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddedBox {
    /// Storage key of the box object.
    pub key: String,

    /// Release version it was cataloged under.
    pub version: String,

    /// Provider name it was cataloged as.
    pub provider: String,
}

/// Summary of one reconciliation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileSummary {
    /// Name of the reconciled catalog.
    pub catalog: String,

    /// When the merge phase completed.
    pub completed_at: DateTime<Utc>,

    /// Candidate keys considered.
    pub scanned: usize,

    /// Boxes newly admitted to the catalog.
    pub added: usize,

    /// Candidates already cataloged (skipped, not an error).
    pub skipped: usize,

    /// The admitted boxes, in processing order.
    pub added_boxes: Vec<AddedBox>,

    /// One-line human rendering of the counts.
    pub human_summary: String,
}

impl ReconcileSummary {
    /// Build a summary from the outcome of a merge phase.
    pub fn new(catalog: &str, scanned: usize, skipped: usize, added_boxes: Vec<AddedBox>) -> Self {
        let added = added_boxes.len();
        let human_summary = format!(
            "scanned {scanned} box{}: {added} added, {skipped} already cataloged",
            if scanned == 1 { "" } else { "es" }
        );
        Self {
            catalog: catalog.to_string(),
            completed_at: Utc::now(),
            scanned,
            added,
            skipped,
            added_boxes,
            human_summary,
        }
    }

    /// Serialize to pretty JSON for the CLI's `--json` mode.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Multi-line human rendering.
    pub fn to_human(&self) -> String {
        let mut out = format!("catalog '{}': {}", self.catalog, self.human_summary);
        for added in &self.added_boxes {
            out.push_str(&format!(
                "\n  added {} ({} / {})",
                added.key, added.version, added.provider
            ));
        }
        out
    }
}
