use super::sanitize::sanitize_classname;
use super::types::{LocaleFields, MergeOutcome, MergeReport, MergedItem};
use crate::config::{manifest_file_name, region_file_name, MergeOptions, PRIMARY_REGION, SECONDARY_REGION};
use crate::fetch::RegionManifest;
use crate::utils::digest_file;
use anyhow::{bail, Context, Result as AnyhowResult};
use log::{debug, info, warn};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Instant;

/// Name of the canonical document inside every item directory.
pub const DOCUMENT_FILE_NAME: &str = "data.json";

/// Reads the primary and secondary region files, merges them, and writes one
/// directory per item under `output_dir`.
///
/// Both region files are loaded and validated before anything is written: if either is
/// missing or is not a JSON array, the call fails and `output_dir` is left untouched.
///
/// # Arguments
///
/// * `raw_dir` - Directory holding `COM_furnis.json` and `ES_furnis.json`.
/// * `output_dir` - Root of the per-item database tree.
/// * `options` - Whether known-incomplete region files are refused.
///
/// # Returns
///
/// * `Ok(MergeReport)` - Counters for the run.
/// * `Err(anyhow::Error)` - An input was missing, unparseable, or refused as incomplete.
///
/// # Examples
///
/// ```rust,no_run
/// use furni_catalog::config::MergeOptions;
/// use furni_catalog::merge::process_and_save;
/// use std::path::Path;
///
/// let report = process_and_save(
///     Path::new("assets/metadata_raw"),
///     Path::new("assets/furni_database"),
///     &MergeOptions::default(),
/// ).unwrap();
/// println!("{} items, {} without a Spanish match", report.processed, report.unmatched);
/// ```
pub fn process_and_save(
    raw_dir: &Path,
    output_dir: &Path,
    options: &MergeOptions,
) -> AnyhowResult<MergeReport> {
    let started = Instant::now();

    check_manifest(raw_dir, PRIMARY_REGION, options)?;
    check_manifest(raw_dir, SECONDARY_REGION, options)?;

    let primary = load_collection(&raw_dir.join(region_file_name(PRIMARY_REGION)))?;
    let secondary = load_collection(&raw_dir.join(region_file_name(SECONDARY_REGION)))?;

    let outcome = merge_collections(primary, &secondary);

    let mut report = MergeReport {
        unmatched: outcome.unmatched,
        skipped: outcome.skipped,
        malformed: outcome.malformed,
        secondary_duplicates: outcome.secondary_duplicates,
        ..Default::default()
    };
    materialize(&outcome.items, output_dir, &mut report)?;
    report.elapsed = started.elapsed();

    info!("Processing complete");
    info!("Total furni processed: {}", report.processed);
    info!("Furni with no Spanish match: {}", report.unmatched);
    info!("Records without classname (skipped): {}", report.skipped);
    if report.malformed > 0 {
        warn!("Malformed records (skipped): {}", report.malformed);
    }
    if report.secondary_duplicates > 0 {
        warn!("Duplicate classnames in {} data: {}", SECONDARY_REGION, report.secondary_duplicates);
    }
    if report.directory_collisions > 0 {
        warn!("Directory collisions (overwritten): {}", report.directory_collisions);
    }
    if report.write_errors > 0 {
        warn!("Items that failed to write: {}", report.write_errors);
    }
    info!("Total time: {:.2} seconds", report.elapsed.as_secs_f64());
    info!("All data saved in '{}'", output_dir.display());

    Ok(report)
}

/// Merges a primary collection with a secondary one by classname.
///
/// Primary records are returned in their original order. Each gets `hotelData.name_es`
/// and `hotelData.description_es` from the secondary record with the same classname, or
/// empty strings when there is none. Records with a missing or empty classname are
/// dropped and counted in `skipped`.
pub fn merge_collections(primary: Vec<Value>, secondary: &[Value]) -> MergeOutcome {
    let (locale_map, secondary_duplicates) = build_locale_map(secondary);
    info!("Lookup map created with {} unique entries", locale_map.len());

    let mut outcome = MergeOutcome {
        items: Vec::with_capacity(primary.len()),
        secondary_duplicates,
        ..Default::default()
    };

    for mut record in primary {
        let Some(classname) = record_classname(&record).map(str::to_string) else {
            outcome.skipped += 1;
            continue;
        };
        let dir_name = sanitize_classname(&classname);
        if dir_name == "." || dir_name == ".." {
            warn!("Record '{}' does not name a usable directory; skipping", classname);
            outcome.malformed += 1;
            continue;
        }
        let Some(obj) = record.as_object_mut() else {
            outcome.skipped += 1;
            continue;
        };

        let hotel_data = obj.entry("hotelData").or_insert(Value::Null);
        if hotel_data.is_null() {
            *hotel_data = Value::Object(Map::new());
        }
        let Some(hotel_data) = hotel_data.as_object_mut() else {
            warn!("Record '{}' has a non-object hotelData; skipping", classname);
            outcome.malformed += 1;
            continue;
        };

        let matched = match locale_map.get(&classname) {
            Some(fields) => {
                hotel_data.insert("name_es".to_string(), Value::String(fields.name.clone()));
                hotel_data.insert(
                    "description_es".to_string(),
                    Value::String(fields.description.clone()),
                );
                true
            }
            None => {
                hotel_data.insert("name_es".to_string(), Value::String(String::new()));
                hotel_data.insert("description_es".to_string(), Value::String(String::new()));
                outcome.unmatched += 1;
                false
            }
        };

        outcome.items.push(MergedItem {
            dir_name,
            classname,
            document: record,
            matched,
        });
    }

    outcome
}

/// Builds the classname lookup over the secondary collection.
///
/// Only records with a non-empty classname and a `hotelData` object contribute. A later
/// record with the same classname replaces the earlier one; the number of replacements
/// is returned alongside the map.
pub fn build_locale_map(secondary: &[Value]) -> (HashMap<String, LocaleFields>, usize) {
    let mut map = HashMap::with_capacity(secondary.len());
    let mut duplicates = 0;

    for record in secondary {
        let Some(classname) = record_classname(record) else {
            continue;
        };
        let Some(hotel_data) = record.get("hotelData").and_then(Value::as_object) else {
            continue;
        };
        let fields = LocaleFields {
            name: string_field(hotel_data, "name"),
            description: string_field(hotel_data, "description"),
        };
        if map.insert(classname.to_string(), fields).is_some() {
            debug!("Duplicate secondary classname '{}'; keeping the later record", classname);
            duplicates += 1;
        }
    }

    (map, duplicates)
}

/// Writes each merged item to `<output_dir>/<dir_name>/data.json`.
///
/// Directory creation is idempotent and documents are overwritten unconditionally. When
/// two items share a directory in the same run the later one wins and the collision is
/// counted. A failure on one item is logged and counted; the rest are still written.
fn materialize(items: &[MergedItem], output_dir: &Path, report: &mut MergeReport) -> AnyhowResult<()> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;

    info!("Processing and saving {} furni", items.len());
    let mut written_dirs: HashMap<&str, &str> = HashMap::with_capacity(items.len());

    for item in items {
        if let Some(previous) = written_dirs.insert(&item.dir_name, &item.classname) {
            warn!(
                "'{}' and '{}' both map to directory '{}'; last write wins",
                previous, item.classname, item.dir_name
            );
            report.directory_collisions += 1;
        }

        match write_document(output_dir, item) {
            Ok(()) => report.processed += 1,
            Err(e) => {
                warn!("Failed to save '{}': {:#}", item.classname, e);
                report.write_errors += 1;
            }
        }
    }

    Ok(())
}

fn write_document(output_dir: &Path, item: &MergedItem) -> AnyhowResult<()> {
    let item_dir = output_dir.join(&item.dir_name);
    fs::create_dir_all(&item_dir)
        .with_context(|| format!("Failed to create {}", item_dir.display()))?;

    let mut body = serde_json::to_string_pretty(&item.document).context("Failed to serialize document")?;
    body.push('\n');

    let path = item_dir.join(DOCUMENT_FILE_NAME);
    fs::write(&path, body).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Loads a region file, which must hold a JSON array.
fn load_collection(path: &Path) -> AnyhowResult<Vec<Value>> {
    let raw = fs::read_to_string(path).with_context(|| {
        format!("Failed to read '{}'. Please run the fetch step first", path.display())
    })?;
    let parsed: Value =
        serde_json::from_str(&raw).with_context(|| format!("Failed to parse '{}'", path.display()))?;
    match parsed {
        Value::Array(records) => {
            info!("Loaded '{}' ({} furni)", path.display(), records.len());
            Ok(records)
        }
        _ => bail!("'{}' does not contain a JSON array", path.display()),
    }
}

/// Consults the manifest written by the fetch stage, if any.
fn check_manifest(raw_dir: &Path, short_name: &str, options: &MergeOptions) -> AnyhowResult<()> {
    let Some(manifest) = RegionManifest::load(&raw_dir.join(manifest_file_name(short_name)))? else {
        debug!("No manifest for {}; completeness unknown", short_name);
        return Ok(());
    };

    let region_path = raw_dir.join(region_file_name(short_name));
    if region_path.exists() {
        let digest = digest_file(&region_path)?;
        if digest != manifest.sha256 {
            warn!(
                "'{}' changed since it was fetched; its manifest may not describe it",
                region_path.display()
            );
        }
    }

    if !manifest.complete {
        if options.require_complete {
            bail!(
                "Region {} is incomplete: pages {:?} of {} were skipped",
                short_name,
                manifest.skipped_pages,
                manifest.last_page
            );
        }
        warn!(
            "Region {} is incomplete ({} page(s) skipped); merging anyway",
            short_name,
            manifest.skipped_pages.len()
        );
    }
    Ok(())
}

fn record_classname(record: &Value) -> Option<&str> {
    record
        .get("classname")
        .and_then(Value::as_str)
        .filter(|c| !c.is_empty())
}

fn string_field(obj: &Map<String, Value>, key: &str) -> String {
    obj.get(key).and_then(Value::as_str).unwrap_or_default().to_string()
}
