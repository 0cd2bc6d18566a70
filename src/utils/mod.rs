//! # Utility Functions
//!
//! General helpers shared by the pipeline stages.
//!
//! ## Submodules
//!
//! - **digest**: SHA-256 digests of region files, recorded in region manifests.

mod digest;

pub use digest::{compute_file_digest, digest_file};
