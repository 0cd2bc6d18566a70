use anyhow::{Context, Result as AnyhowResult};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Computes a digest for a file using its raw content.
///
/// # Arguments
///
/// * `raw_content` - The raw bytes of the file content.
///
/// # Returns
///
/// A hexadecimal string representation of the SHA-256 digest.
pub fn compute_file_digest(raw_content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw_content);
    let result = hasher.finalize();
    hex::encode(result)
}

/// Reads a file from disk and computes its SHA-256 digest.
///
/// Region manifests record this digest so a later stage can tell whether the
/// region file was replaced after it was fetched.
pub fn digest_file(path: &Path) -> AnyhowResult<String> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read {} for digest", path.display()))?;
    Ok(compute_file_digest(&bytes))
}
