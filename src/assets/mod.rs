//! # Downloading Item Assets
//!
//! This module walks the per-item database tree produced by the merge step and fetches
//! the files each `data.json` references: the `.swf` animation resource and the icon
//! image. Files already present are never fetched again.
//!
//! ## Submodules
//!
//! - **downloader**: Directory walk and per-asset download.
//! - **types**: Asset kinds, outcomes, and counters.

mod downloader;
mod types;

pub use downloader::{asset_file_name, download_all_assets};
pub use types::{AssetCounters, AssetKind, AssetOutcome, AssetReport};
