//! # Merging Locales into the Per-Item Database
//!
//! This module reads the primary (`COM`) and secondary (`ES`) region files, folds the
//! secondary locale's `name` and `description` into each primary record as
//! `hotelData.name_es` and `hotelData.description_es`, and writes every record to its
//! own directory as `<sanitized classname>/data.json`.
//!
//! ## Usage
//!
//! `process_and_save` runs the whole step against the raw-data and database directories.
//! `merge_collections` is the in-memory merge on its own.
//!
//! ## Submodules
//!
//! - **materialize**: Lookup construction, merging, and writing the directory tree.
//! - **sanitize**: Classname to directory-name mapping.
//! - **types**: Merged items and run summaries.

mod materialize;
mod sanitize;
mod types;

pub use materialize::{build_locale_map, merge_collections, process_and_save, DOCUMENT_FILE_NAME};
pub use sanitize::sanitize_classname;
pub use types::{LocaleFields, MergeOutcome, MergeReport, MergedItem};
