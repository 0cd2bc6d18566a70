//! Furni Catalog: Fetch, Merge, and Materialize Furniture Metadata and Assets
//!
//! This application pulls furniture catalog metadata from the HabboFurni API for a set
//! of regions, merges the primary (`COM`) and secondary (`ES`) locales into one directory
//! per item, and optionally downloads each item's `.swf` and icon files.
//!
//! ## Design Overview
//! - **Fetching**: Pages through `/furniture` per region using the `fetch` module.
//! - **Merging**: Folds Spanish names and descriptions into each record via the `merge` module.
//! - **Assets**: Downloads referenced files next to each `data.json` via the `assets` module.
//!
//! Each stage reads the previous stage's output from disk, so the pipeline can be resumed
//! with `--start-at`.
//!
//! ## Usage
//! 1. Put the API token in a `.env` file or the environment:
//!    ```env
//!    HABBOFURNI_API_TOKEN=your-token
//!    ```
//! 2. Run the full pipeline, downloading both asset kinds:
//!    ```sh
//!    cargo run -- --download-swf --download-icons
//!    ```
//! 3. Re-run only the merge and asset steps against existing raw data:
//!    ```sh
//!    cargo run -- --start-at merge --download-icons
//!    ```
//! 4. Logs go to the console, controlled by `RUST_LOG` (default `info`).

use anyhow::Result as AnyhowResult;
use clap::{Parser, ValueEnum};
use dotenv::dotenv;
use furni_catalog::assets::download_all_assets;
use furni_catalog::config::{select_regions, AssetOptions, FetchConfig, MergeOptions, DEFAULT_API_BASE_URL};
use furni_catalog::fetch::fetch_regions;
use furni_catalog::merge::process_and_save;
use log::{info, warn};
use std::path::PathBuf;

/// Pipeline stage to start from. Every later stage runs too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum Stage {
    /// Download region metadata from the API.
    #[value(alias = "1")]
    Fetch,
    /// Merge locales into the per-item database.
    #[value(alias = "2")]
    Merge,
    /// Download `.swf` and icon assets.
    #[value(alias = "3")]
    Assets,
}

/// Command-line arguments for the furni catalog pipeline.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Directory for raw downloaded region files.
    #[clap(long, env = "RAW_DIR", default_value = "assets/metadata_raw")]
    raw_dir: PathBuf,

    /// Directory for the merged per-item database.
    #[clap(long, env = "DATABASE_DIR", default_value = "assets/furni_database")]
    database_dir: PathBuf,

    /// Pipeline step to start from.
    #[clap(long, value_enum, default_value = "fetch")]
    start_at: Stage,

    /// Comma-separated region codes to fetch (e.g. "COM,ES").
    #[clap(long, env = "REGIONS", default_value = "COM,ES", value_delimiter = ',')]
    regions: Vec<String>,

    /// Download `.swf` asset files during the assets step.
    #[clap(long, action)]
    download_swf: bool,

    /// Download icon `.png` files during the assets step.
    #[clap(long, action)]
    download_icons: bool,

    /// Refuse to merge region files whose fetch skipped pages.
    #[clap(long, action)]
    require_complete: bool,

    /// Bearer token for the catalog API.
    #[clap(long, env = "HABBOFURNI_API_TOKEN", hide_env_values = true)]
    api_token: Option<String>,

    /// Base URL of the catalog API.
    #[clap(long, env = "HABBOFURNI_API_URL", default_value = DEFAULT_API_BASE_URL)]
    api_base_url: String,
}

/// Runs the pipeline from the requested stage onward.
///
/// Any stage returning an error stops the run and the process exits non-zero.
/// Per-item failures inside a stage are reported in its summary and do not stop the run.
#[tokio::main]
async fn main() -> AnyhowResult<()> {
    // Load environment variables from .env file (if present)
    dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    info!("Furni pipeline starting from step: {:?}", args.start_at);
    info!("Raw data directory: {}", args.raw_dir.display());
    info!("Final database directory: {}", args.database_dir.display());
    info!("Download SWFs: {}", if args.download_swf { "Yes" } else { "No" });
    info!("Download Icons: {}", if args.download_icons { "Yes" } else { "No" });

    if args.start_at <= Stage::Fetch {
        info!("[Step 1] Downloading furni metadata from API");
        let regions = select_regions(&args.regions)?;
        let config = FetchConfig::from_token(args.api_token.as_deref())?.with_base_url(&args.api_base_url);
        let reports = fetch_regions(&config, &regions, &args.raw_dir).await?;
        for report in &reports {
            if report.is_complete() {
                info!("{}: {} records", report.region, report.record_count);
            } else {
                warn!(
                    "{}: {} records, pages skipped: {:?}",
                    report.region, report.record_count, report.skipped_pages
                );
            }
        }
        info!("Metadata download complete");
    }

    if args.start_at <= Stage::Merge {
        info!("[Step 2] Processing and organizing metadata");
        let options = MergeOptions { require_complete: args.require_complete };
        process_and_save(&args.raw_dir, &args.database_dir, &options)?;
        info!("Metadata processing complete");
    }

    let asset_options = AssetOptions::new(args.download_swf, args.download_icons);
    if asset_options.any_enabled() {
        info!("[Step 3] Downloading SWF and Icon assets");
        download_all_assets(&args.database_dir, &asset_options).await?;
        info!("Asset download step finished");
    } else {
        info!("[Step 3] Skipped: no asset download flags (--download-swf, --download-icons) were provided");
    }

    info!("Pipeline completed successfully");
    Ok(())
}
