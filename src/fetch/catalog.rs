use super::types::{CatalogPage, FetchReport, RegionManifest};
use crate::config::{FetchConfig, Region};
use crate::utils::compute_file_digest;
use anyhow::{Context, Result as AnyhowResult};
use chrono::Utc;
use log::{error, info, warn};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::Client;
use serde_json::Value;
use std::path::Path;

/// Fetches every page of the catalog for each region, in order.
///
/// Regions are processed one after another. The first region whose initial page
/// cannot be fetched aborts the whole call; regions already written stay on disk.
///
/// # Arguments
///
/// * `config` - API credential, base URL and pacing.
/// * `regions` - Regions to fetch.
/// * `output_dir` - Directory receiving `<REGION>_furnis.json` and its manifest.
///
/// # Returns
///
/// * `Ok(Vec<FetchReport>)` - One report per region.
/// * `Err(anyhow::Error)` - A region could not be started or its file could not be written.
///
/// # Examples
///
/// ```rust,no_run
/// use furni_catalog::config::{FetchConfig, Region};
/// use furni_catalog::fetch::fetch_regions;
/// use std::path::Path;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = FetchConfig::new("my-token");
///     let com = Region::by_short_name("COM").unwrap();
///     let reports = fetch_regions(&config, &[com], Path::new("assets/metadata_raw")).await?;
///     println!("Fetched {} records", reports[0].record_count);
///     Ok(())
/// }
/// ```
pub async fn fetch_regions(
    config: &FetchConfig,
    regions: &[&Region],
    output_dir: &Path,
) -> AnyhowResult<Vec<FetchReport>> {
    tokio::fs::create_dir_all(output_dir)
        .await
        .with_context(|| format!("Failed to create raw data directory {}", output_dir.display()))?;

    let client = build_client(config)?;
    let mut reports = Vec::with_capacity(regions.len());
    for region in regions {
        let report = fetch_region_with(&client, config, region, output_dir)
            .await
            .with_context(|| format!("Failed to fetch region {}", region.short_name))?;
        reports.push(report);
    }
    Ok(reports)
}

/// Fetches all pages for a single region and writes its region file and manifest.
///
/// A failure on page 1 aborts without writing anything. A failure on any later page is
/// logged, recorded in the manifest's `skipped_pages`, and fetching continues.
pub async fn fetch_region(
    config: &FetchConfig,
    region: &Region,
    output_dir: &Path,
) -> AnyhowResult<FetchReport> {
    let client = build_client(config)?;
    fetch_region_with(&client, config, region, output_dir).await
}

async fn fetch_region_with(
    client: &Client,
    config: &FetchConfig,
    region: &Region,
    output_dir: &Path,
) -> AnyhowResult<FetchReport> {
    let url = furniture_url(&config.base_url);
    info!(
        "Starting download for region {} ({}, id {})",
        region.short_name, region.name, region.id
    );

    let first = fetch_page(client, &url, region, config.per_page, 1)
        .await
        .context("Initial page request failed")?;
    let last_page = first.meta.last_page;
    let reported_total = first.meta.total;
    info!(
        "Region {} has {} records across {} pages",
        region.short_name, reported_total, last_page
    );

    let mut records: Vec<Value> = first.data;
    let mut pages_fetched = 1;
    let mut skipped_pages = Vec::new();

    if last_page > 1 {
        tokio::time::sleep(config.page_delay).await;
    }

    for page in 2..=last_page {
        info!("Downloading page {} of {} for {}", page, last_page, region.short_name);
        match fetch_page(client, &url, region, config.per_page, page).await {
            Ok(body) => {
                records.extend(body.data);
                pages_fetched += 1;
                if page < last_page {
                    tokio::time::sleep(config.page_delay).await;
                }
            }
            Err(e) => {
                warn!(
                    "Error downloading page {} for {}: {:#}. Skipping page.",
                    page, region.short_name, e
                );
                skipped_pages.push(page);
            }
        }
    }

    let output_file = output_dir.join(region.file_name());
    let manifest = persist_region(
        region,
        &records,
        (last_page, reported_total),
        pages_fetched,
        &skipped_pages,
        output_dir,
    )
    .await?;

    if manifest.complete {
        info!(
            "Saved {} records for {} to {}",
            manifest.record_count,
            region.short_name,
            output_file.display()
        );
    } else {
        error!(
            "Saved {} records for {} to {} but {} page(s) were skipped: {:?}",
            manifest.record_count,
            region.short_name,
            output_file.display(),
            skipped_pages.len(),
            skipped_pages
        );
    }

    Ok(FetchReport {
        region: region.short_name.to_string(),
        record_count: records.len(),
        pages_fetched,
        skipped_pages,
        output_file,
    })
}

/// Writes the region file and its manifest.
///
/// The region file is a pretty-printed JSON array; the manifest records the digest
/// of exactly those bytes.
async fn persist_region(
    region: &Region,
    records: &[Value],
    (last_page, reported_total): (u32, u64),
    pages_fetched: u32,
    skipped_pages: &[u32],
    output_dir: &Path,
) -> AnyhowResult<RegionManifest> {
    let region_path = output_dir.join(region.file_name());
    let bytes = serde_json::to_vec_pretty(records).context("Failed to serialize region records")?;
    tokio::fs::write(&region_path, &bytes)
        .await
        .with_context(|| format!("Failed to write {}", region_path.display()))?;

    let manifest = RegionManifest {
        region: region.short_name.to_string(),
        hotel_id: region.id,
        last_page,
        reported_total,
        pages_fetched,
        skipped_pages: skipped_pages.to_vec(),
        record_count: records.len(),
        complete: skipped_pages.is_empty(),
        sha256: compute_file_digest(&bytes),
        fetched_at: Utc::now(),
    };

    let manifest_path = output_dir.join(region.manifest_file_name());
    let manifest_bytes =
        serde_json::to_vec_pretty(&manifest).context("Failed to serialize region manifest")?;
    tokio::fs::write(&manifest_path, manifest_bytes)
        .await
        .with_context(|| format!("Failed to write {}", manifest_path.display()))?;

    Ok(manifest)
}

/// Builds an HTTP client carrying the bearer credential on every request.
fn build_client(config: &FetchConfig) -> AnyhowResult<Client> {
    let mut headers = HeaderMap::new();
    let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.api_token))
        .context("API token contains characters not allowed in a header")?;
    auth.set_sensitive(true);
    headers.insert(AUTHORIZATION, auth);
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    Client::builder()
        .default_headers(headers)
        .timeout(config.request_timeout)
        .build()
        .context("Failed to build HTTP client")
}

/// Requests a single catalog page for a region.
async fn fetch_page(
    client: &Client,
    url: &str,
    region: &Region,
    per_page: u32,
    page: u32,
) -> AnyhowResult<CatalogPage> {
    let resp = client
        .get(url)
        .header("X-Hotel-ID", region.id.to_string())
        .query(&[("per_page", per_page), ("page", page)])
        .send()
        .await
        .with_context(|| format!("Failed to request page {}", page))?
        .error_for_status()
        .with_context(|| format!("Server rejected page {}", page))?;
    let body: CatalogPage = resp
        .json()
        .await
        .with_context(|| format!("Failed to parse page {}", page))?;
    Ok(body)
}

/// Normalizes the base URL by ensuring it ends with a trailing slash.
fn normalize_url(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{}/", url)
    }
}

/// Full URL of the `/furniture` endpoint below `base_url`.
fn furniture_url(base_url: &str) -> String {
    format!("{}furniture", normalize_url(base_url))
}
