//! # Fetching Regional Catalog Metadata
//!
//! This module pages through the catalog API (`GET /furniture`) for each selected
//! region, accumulates every record, and writes one JSON array file per region
//! (`<REGION>_furnis.json`) together with a completeness manifest.
//!
//! ## Usage
//!
//! The primary entry point is `fetch_regions`, which takes a `FetchConfig`, the regions
//! to fetch, and the raw-data directory.
//!
//! ## Submodules
//!
//! - **catalog**: The pagination loop against the catalog API.
//! - **types**: Page, manifest, and report types.

mod catalog;
mod types;

pub use catalog::{fetch_region, fetch_regions};
pub use types::{CatalogPage, FetchReport, PageMeta, RegionManifest};
