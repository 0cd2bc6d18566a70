use serde_json::Value;
use std::fmt::Debug;
use std::time::Duration;

/// Secondary-locale display fields looked up by classname.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocaleFields {
    pub name: String,
    pub description: String,
}

/// A primary record after the secondary-locale fields have been folded in.
#[derive(Debug, Clone)]
pub struct MergedItem {
    /// The raw identifier, as found in the primary record.
    pub classname: String,
    /// Filesystem-safe form of `classname`; names the item's directory.
    pub dir_name: String,
    /// The full record with `hotelData.name_es` and `hotelData.description_es` set.
    pub document: Value,
    /// `false` when no secondary record shared this classname.
    pub matched: bool,
}

/// Result of merging two collections in memory.
#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    pub items: Vec<MergedItem>,
    /// Primary records with no match in the secondary collection.
    pub unmatched: usize,
    /// Primary records without a usable classname.
    pub skipped: usize,
    /// Primary records whose `hotelData` was present but not an object, or whose
    /// classname sanitizes to `.` or `..`.
    pub malformed: usize,
    /// Secondary records that replaced an earlier entry with the same classname.
    pub secondary_duplicates: usize,
}

/// Summary of a full merge-and-materialize run.
#[derive(Debug, Clone, Default)]
pub struct MergeReport {
    /// Records written to the database directory.
    pub processed: usize,
    pub unmatched: usize,
    pub skipped: usize,
    pub malformed: usize,
    pub secondary_duplicates: usize,
    /// Writes that landed in a directory already written earlier in the same run.
    pub directory_collisions: usize,
    /// Records whose directory or document could not be written.
    pub write_errors: usize,
    pub elapsed: Duration,
}
