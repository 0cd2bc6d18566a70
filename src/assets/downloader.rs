use super::types::{AssetKind, AssetOutcome, AssetReport};
use crate::config::AssetOptions;
use crate::merge::DOCUMENT_FILE_NAME;
use anyhow::{bail, Context, Result as AnyhowResult};
use log::{error, info, warn};
use reqwest::{Client, Url};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Walks the database tree and downloads the assets each item's document references.
///
/// Item directories are visited in name order. For every enabled asset kind whose
/// descriptor has `exists = true` and a non-empty `url`, the file is saved next to
/// `data.json` under the URL's last path segment, unless a file of that name is already
/// there. A failed download is logged and counted; the run carries on.
///
/// # Arguments
///
/// * `database_dir` - Root of the per-item tree written by the merge step.
/// * `options` - Which asset kinds to fetch, plus pacing and timeout.
///
/// # Returns
///
/// * `Ok(AssetReport)` - Per-kind counters for the run.
/// * `Err(anyhow::Error)` - The database directory is missing or unreadable.
///
/// # Examples
///
/// ```rust,no_run
/// use furni_catalog::assets::download_all_assets;
/// use furni_catalog::config::AssetOptions;
/// use std::path::Path;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let options = AssetOptions::new(true, true);
///     let report = download_all_assets(Path::new("assets/furni_database"), &options).await?;
///     println!("{} SWFs downloaded", report.swf.downloaded);
///     Ok(())
/// }
/// ```
pub async fn download_all_assets(
    database_dir: &Path,
    options: &AssetOptions,
) -> AnyhowResult<AssetReport> {
    let is_dir = tokio::fs::metadata(database_dir)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false);
    if !is_dir {
        bail!(
            "The directory '{}' was not found. Please run the merge step first",
            database_dir.display()
        );
    }

    let item_dirs = list_item_dirs(database_dir).await?;
    let total = item_dirs.len();
    info!("Found {} furni folders to process", total);

    let client = Client::builder()
        .timeout(options.request_timeout)
        .build()
        .context("Failed to build HTTP client")?;

    let mut kinds = Vec::with_capacity(2);
    if options.download_swf {
        kinds.push(AssetKind::Swf);
    }
    if options.download_icons {
        kinds.push(AssetKind::Icon);
    }

    let mut report = AssetReport::default();
    for (i, item_dir) in item_dirs.iter().enumerate() {
        report.items += 1;
        let folder_name = item_dir.file_name().unwrap_or_default().to_string_lossy();
        info!("[{}/{}] Processing '{}'", i + 1, total, folder_name);

        let document_path = item_dir.join(DOCUMENT_FILE_NAME);
        if !matches!(tokio::fs::try_exists(&document_path).await, Ok(true)) {
            warn!("'{}' not found in '{}'. Skipping", DOCUMENT_FILE_NAME, folder_name);
            report.missing_documents += 1;
            continue;
        }

        let document = match load_document(&document_path).await {
            Ok(document) => document,
            Err(e) => {
                error!("Error processing '{}' in '{}': {:#}", DOCUMENT_FILE_NAME, folder_name, e);
                report.document_errors += 1;
                continue;
            }
        };

        for &kind in &kinds {
            let outcome = fetch_asset(&client, &document, kind, item_dir, options).await;
            report.counters_mut(kind).record(outcome);
        }
    }

    info!("Asset download complete");
    info!("Total SWFs downloaded: {}", report.swf.downloaded);
    info!("Total Icons downloaded: {}", report.icon.downloaded);
    info!(
        "Files already present (skipped): {}",
        report.swf.already_present + report.icon.already_present
    );
    if report.missing_documents > 0 {
        warn!("Folders without {}: {}", DOCUMENT_FILE_NAME, report.missing_documents);
    }
    info!("Errors encountered: {}", report.error_count());

    Ok(report)
}

/// Handles one asset kind for one item.
async fn fetch_asset(
    client: &Client,
    document: &Value,
    kind: AssetKind,
    item_dir: &Path,
    options: &AssetOptions,
) -> AssetOutcome {
    let Some(url) = asset_url(document, kind) else {
        return AssetOutcome::NotAvailable;
    };

    let file_name = match asset_file_name(url) {
        Ok(name) => name,
        Err(e) => {
            error!("Cannot derive a file name for {} {}: {:#}", kind, url, e);
            return AssetOutcome::Failed;
        }
    };

    let target = item_dir.join(&file_name);
    match tokio::fs::try_exists(&target).await {
        Ok(true) => {
            info!("{} already exists. Skipping", kind);
            return AssetOutcome::AlreadyPresent;
        }
        Ok(false) => {}
        Err(e) => {
            error!("Cannot check {}: {}", target.display(), e);
            return AssetOutcome::Failed;
        }
    }

    match download_to(client, url, &target).await {
        Ok(()) => {
            info!("Downloaded {}: {}", kind, file_name);
            tokio::time::sleep(options.delay).await;
            AssetOutcome::Downloaded
        }
        Err(e) => {
            error!("Error downloading {} {}: {:#}", kind, url, e);
            AssetOutcome::Failed
        }
    }
}

/// Returns the descriptor URL when the asset is reported to exist.
fn asset_url(document: &Value, kind: AssetKind) -> Option<&str> {
    let descriptor = document.get("hotelData")?.get(kind.descriptor_key())?;
    if descriptor.get("exists").and_then(Value::as_bool) != Some(true) {
        return None;
    }
    descriptor
        .get("url")
        .and_then(Value::as_str)
        .filter(|u| !u.is_empty())
}

/// Final path segment of `url`, used as the asset's file name.
///
/// # Examples
///
/// ```rust
/// use furni_catalog::assets::asset_file_name;
/// let name = asset_file_name("https://images.habbo.com/dcr/hof_furni/1/fireplace_armas.swf").unwrap();
/// assert_eq!(name, "fireplace_armas.swf");
/// ```
pub fn asset_file_name(url: &str) -> AnyhowResult<String> {
    let parsed = Url::parse(url).with_context(|| format!("Invalid URL: {}", url))?;
    let segment = parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .with_context(|| format!("URL has no file name: {}", url))?;
    Ok(segment.to_string())
}

/// Downloads `url` and writes the body to `target`.
///
/// The body goes to a `.part` file first and is renamed into place, so `target` only
/// ever exists once fully written.
async fn download_to(client: &Client, url: &str, target: &Path) -> AnyhowResult<()> {
    let bytes = client
        .get(url)
        .send()
        .await
        .context("Request failed")?
        .error_for_status()
        .context("Server returned an error status")?
        .bytes()
        .await
        .context("Failed to read response body")?;

    let partial = partial_path(target);
    if let Err(e) = tokio::fs::write(&partial, &bytes).await {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(e).with_context(|| format!("Failed to write {}", partial.display()));
    }
    tokio::fs::rename(&partial, target)
        .await
        .with_context(|| format!("Failed to move download into {}", target.display()))?;
    Ok(())
}

fn partial_path(target: &Path) -> PathBuf {
    let mut name = target.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    target.with_file_name(name)
}

async fn load_document(path: &Path) -> AnyhowResult<Value> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .context("Failed to read document")?;
    serde_json::from_str(&raw).context("Failed to parse document")
}

/// Lists item directories directly under `database_dir`, sorted by name.
async fn list_item_dirs(database_dir: &Path) -> AnyhowResult<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(database_dir)
        .await
        .with_context(|| format!("Failed to list {}", database_dir.display()))?;
    let mut dirs = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .context("Failed to read directory entry")?
    {
        let file_type = entry
            .file_type()
            .await
            .context("Failed to read directory entry type")?;
        if file_type.is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetCounters;
    use crate::test_support::{request_target, StubServer};
    use serde_json::json;
    use std::fs;
    use std::time::Duration;

    // Port 1 on loopback is closed, so any request to it fails immediately.
    const DEAD_HOST: &str = "http://127.0.0.1:1";

    fn options(swf: bool, icons: bool) -> AssetOptions {
        let mut options = AssetOptions::new(swf, icons);
        options.delay = Duration::ZERO;
        options.request_timeout = Duration::from_secs(2);
        options
    }

    fn write_item(db: &Path, dir_name: &str, document: &Value) -> PathBuf {
        let item_dir = db.join(dir_name);
        fs::create_dir_all(&item_dir).unwrap();
        fs::write(
            item_dir.join(DOCUMENT_FILE_NAME),
            serde_json::to_string_pretty(document).unwrap(),
        )
        .unwrap();
        item_dir
    }

    fn chair_document() -> Value {
        json!({
            "classname": "chair_basic",
            "hotelData": {
                "swf": {"exists": true, "url": format!("{}/dcr/hof_furni/1/chair_basic.swf", DEAD_HOST)},
                "icon": {"exists": true, "url": format!("{}/dcr/hof_furni/1/chair_basic_icon.png", DEAD_HOST)}
            }
        })
    }

    #[test]
    fn test_asset_file_name() {
        assert_eq!(
            asset_file_name("https://images.habbo.com/dcr/hof_furni/1/fireplace_armas.swf").unwrap(),
            "fireplace_armas.swf"
        );
        assert_eq!(
            asset_file_name("https://x.test/icons/lamp_icon.png?v=3").unwrap(),
            "lamp_icon.png"
        );
        assert!(asset_file_name("https://x.test/icons/").is_err());
        assert!(asset_file_name("not a url").is_err());
    }

    #[test]
    fn test_asset_url_requires_exists_and_url() {
        let doc = json!({"hotelData": {
            "swf": {"exists": false, "url": "https://x.test/a.swf"},
            "icon": {"exists": true, "url": ""}
        }});
        assert_eq!(asset_url(&doc, AssetKind::Swf), None);
        assert_eq!(asset_url(&doc, AssetKind::Icon), None);
        assert_eq!(asset_url(&json!({"classname": "x"}), AssetKind::Swf), None);

        let doc = json!({"hotelData": {"swf": {"exists": true, "url": "https://x.test/a.swf"}}});
        assert_eq!(asset_url(&doc, AssetKind::Swf), Some("https://x.test/a.swf"));
    }

    #[test]
    fn test_partial_path() {
        assert_eq!(
            partial_path(Path::new("/db/chair/chair.swf")),
            PathBuf::from("/db/chair/chair.swf.part")
        );
    }

    #[tokio::test]
    async fn test_existing_asset_is_skipped_without_network() {
        let db = tempfile::tempdir().unwrap();
        let item_dir = write_item(db.path(), "chair_basic", &chair_document());
        fs::write(item_dir.join("chair_basic.swf"), b"original bytes").unwrap();

        let report = download_all_assets(db.path(), &options(true, false)).await.unwrap();

        // The URL points at a closed port, so a network attempt would have failed.
        assert_eq!(
            report.swf,
            AssetCounters { downloaded: 0, already_present: 1, failed: 0 }
        );
        assert_eq!(fs::read(item_dir.join("chair_basic.swf")).unwrap(), b"original bytes");
    }

    #[tokio::test]
    async fn test_download_writes_bytes_and_second_run_skips_network() {
        const SWF_BYTES: &[u8] = &[0, 1, 66, 73, 78];
        const ICON_BYTES: &[u8] = b"\x89PNG\r\n";
        let server = StubServer::start(|head| match request_target(head) {
            "/dcr/hof_furni/1/chair_basic.swf" => (200, SWF_BYTES.to_vec()),
            "/dcr/hof_furni/1/chair_basic_icon.png" => (200, ICON_BYTES.to_vec()),
            _ => (404, Vec::new()),
        })
        .await;
        let db = tempfile::tempdir().unwrap();
        let document = json!({
            "classname": "chair_basic",
            "hotelData": {
                "swf": {"exists": true, "url": format!("{}/dcr/hof_furni/1/chair_basic.swf", server.base_url())},
                "icon": {"exists": true, "url": format!("{}/dcr/hof_furni/1/chair_basic_icon.png", server.base_url())}
            }
        });
        let item_dir = write_item(db.path(), "chair_basic", &document);

        let first = download_all_assets(db.path(), &options(true, true)).await.unwrap();

        assert_eq!(first.swf, AssetCounters { downloaded: 1, already_present: 0, failed: 0 });
        assert_eq!(first.icon, AssetCounters { downloaded: 1, already_present: 0, failed: 0 });
        assert_eq!(fs::read(item_dir.join("chair_basic.swf")).unwrap(), SWF_BYTES);
        assert_eq!(fs::read(item_dir.join("chair_basic_icon.png")).unwrap(), ICON_BYTES);
        assert!(!item_dir.join("chair_basic.swf.part").exists());
        assert!(!item_dir.join("chair_basic_icon.png.part").exists());
        assert_eq!(server.hits(), 2);

        let second = download_all_assets(db.path(), &options(true, true)).await.unwrap();

        assert_eq!(second.swf, AssetCounters { downloaded: 0, already_present: 1, failed: 0 });
        assert_eq!(second.icon, AssetCounters { downloaded: 0, already_present: 1, failed: 0 });
        assert_eq!(server.hits(), 2);
        assert_eq!(fs::read(item_dir.join("chair_basic.swf")).unwrap(), SWF_BYTES);
    }

    #[tokio::test]
    async fn test_error_status_is_counted_as_failure() {
        let server = StubServer::start(|_| (404, b"not found".to_vec())).await;
        let db = tempfile::tempdir().unwrap();
        let document = json!({"classname": "lamp", "hotelData": {
            "swf": {"exists": true, "url": format!("{}/lamp.swf", server.base_url())}
        }});
        let item_dir = write_item(db.path(), "lamp", &document);

        let report = download_all_assets(db.path(), &options(true, true)).await.unwrap();

        assert_eq!(report.swf.failed, 1);
        assert_eq!(report.icon, AssetCounters::default());
        assert!(!item_dir.join("lamp.swf").exists());
        assert!(!item_dir.join("lamp.swf.part").exists());
    }

    #[tokio::test]
    async fn test_failed_download_is_counted_and_leaves_no_file() {
        let db = tempfile::tempdir().unwrap();
        let item_dir = write_item(db.path(), "chair_basic", &chair_document());
        write_item(db.path(), "lamp", &json!({"classname": "lamp", "hotelData": {}}));

        let report = download_all_assets(db.path(), &options(true, true)).await.unwrap();

        assert_eq!(report.items, 2);
        assert_eq!(report.swf.failed, 1);
        assert_eq!(report.icon.failed, 1);
        assert_eq!(report.error_count(), 2);
        assert!(!item_dir.join("chair_basic.swf").exists());
        assert!(!item_dir.join("chair_basic.swf.part").exists());
        assert!(!item_dir.join("chair_basic_icon.png").exists());
    }

    #[tokio::test]
    async fn test_disabled_kind_is_not_touched() {
        let db = tempfile::tempdir().unwrap();
        let item_dir = write_item(db.path(), "chair_basic", &chair_document());
        fs::write(item_dir.join("chair_basic.swf"), b"swf").unwrap();

        let report = download_all_assets(db.path(), &options(true, false)).await.unwrap();

        assert_eq!(report.icon, AssetCounters::default());
        assert!(!item_dir.join("chair_basic_icon.png").exists());
    }

    #[tokio::test]
    async fn test_missing_and_broken_documents_are_counted() {
        let db = tempfile::tempdir().unwrap();
        fs::create_dir_all(db.path().join("empty_item")).unwrap();
        let broken = db.path().join("broken_item");
        fs::create_dir_all(&broken).unwrap();
        fs::write(broken.join(DOCUMENT_FILE_NAME), "{ nope").unwrap();
        fs::write(db.path().join("stray_file.txt"), "ignored").unwrap();

        let report = download_all_assets(db.path(), &options(true, true)).await.unwrap();

        assert_eq!(report.items, 2);
        assert_eq!(report.missing_documents, 1);
        assert_eq!(report.document_errors, 1);
        assert_eq!(report.error_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_database_dir_is_fatal() {
        let root = tempfile::tempdir().unwrap();
        let result = download_all_assets(&root.path().join("nope"), &options(true, true)).await;
        assert!(result.is_err());
    }
}
