use anyhow::{Context, Result as AnyhowResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Debug;
use std::path::Path;

/// Pagination metadata returned with every catalog page.
#[derive(Debug, Clone, Deserialize)]
pub struct PageMeta {
    /// Number of the final page for this region.
    pub last_page: u32,
    /// Total number of records the server reports for this region.
    #[serde(default)]
    pub total: u64,
}

/// One page of the `/furniture` endpoint.
///
/// Records are kept as raw JSON so every field the API sends survives into the
/// region file untouched.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogPage {
    pub meta: PageMeta,
    #[serde(default)]
    pub data: Vec<Value>,
}

/// Completeness record written next to each region file.
///
/// A fetch that lost pages still produces a region file; this manifest is how
/// later stages find out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionManifest {
    pub region: String,
    pub hotel_id: u32,
    /// `last_page` as reported by the server on the first page.
    pub last_page: u32,
    /// `total` as reported by the server on the first page.
    pub reported_total: u64,
    pub pages_fetched: u32,
    pub skipped_pages: Vec<u32>,
    pub record_count: usize,
    pub complete: bool,
    /// SHA-256 of the region file as written.
    pub sha256: String,
    pub fetched_at: DateTime<Utc>,
}

impl RegionManifest {
    /// Loads the manifest at `path`, returning `Ok(None)` when no manifest exists.
    pub fn load(path: &Path) -> AnyhowResult<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest {}", path.display()))?;
        let manifest = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse manifest {}", path.display()))?;
        Ok(Some(manifest))
    }
}

/// Outcome of fetching one region.
#[derive(Debug, Clone)]
pub struct FetchReport {
    pub region: String,
    pub record_count: usize,
    pub pages_fetched: u32,
    pub skipped_pages: Vec<u32>,
    /// Path of the region file that was written.
    pub output_file: std::path::PathBuf,
}

impl FetchReport {
    /// Returns `true` when no page was dropped.
    pub fn is_complete(&self) -> bool {
        self.skipped_pages.is_empty()
    }
}
