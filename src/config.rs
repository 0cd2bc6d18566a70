//! # Pipeline Configuration
//!
//! Explicit configuration objects handed to each pipeline stage, plus the table of
//! known catalog regions. Nothing here reads the environment; the binary builds
//! these values from its command-line arguments and passes them down.

use anyhow::{Context, Result as AnyhowResult};
use std::time::Duration;

/// Default base URL of the catalog API.
pub const DEFAULT_API_BASE_URL: &str = "https://habbofurni.com/api/v1";

/// Number of records requested per catalog page.
pub const PAGE_SIZE: u32 = 100;

/// Short code of the region whose records drive the merge.
pub const PRIMARY_REGION: &str = "COM";

/// Short code of the region that supplies the `_es` locale fields.
pub const SECONDARY_REGION: &str = "ES";

/// A deployment of the catalog API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    /// Numeric identifier sent in the `X-Hotel-ID` header.
    pub id: u32,
    /// Human-readable name, used only in log output.
    pub name: &'static str,
    /// Short code (e.g. "COM", "COM.BR") that names the region's files.
    pub short_name: &'static str,
}

/// Every region the catalog API is known to serve.
pub const REGIONS: &[Region] = &[
    Region { id: 1, name: "Habbo.com", short_name: "COM" },
    Region { id: 2, name: "Habbo Brazil", short_name: "COM.BR" },
    Region { id: 3, name: "Habbo Spain", short_name: "ES" },
    Region { id: 4, name: "Habbo Finland", short_name: "FI" },
    Region { id: 5, name: "Habbo France", short_name: "FR" },
    Region { id: 6, name: "Habbo Germany", short_name: "DE" },
    Region { id: 7, name: "Habbo Italy", short_name: "IT" },
    Region { id: 8, name: "Habbo Netherlands", short_name: "NL" },
    Region { id: 9, name: "Habbo Turkey", short_name: "COM.TR" },
    Region { id: 10, name: "Habbo Sandbox", short_name: "Sandbox" },
];

impl Region {
    /// Looks up a region by short code, ignoring case.
    pub fn by_short_name(code: &str) -> Option<&'static Region> {
        let code = code.trim();
        REGIONS.iter().find(|r| r.short_name.eq_ignore_ascii_case(code))
    }

    /// Name of the JSON array file holding this region's records, e.g. `COM_BR_furnis.json`.
    pub fn file_name(&self) -> String {
        region_file_name(self.short_name)
    }

    /// Name of the completeness manifest written next to the region file.
    pub fn manifest_file_name(&self) -> String {
        manifest_file_name(self.short_name)
    }
}

/// Builds the region file name for a short code.
pub fn region_file_name(short_name: &str) -> String {
    format!("{}_furnis.json", short_name.replace('.', "_"))
}

/// Builds the manifest file name for a short code.
pub fn manifest_file_name(short_name: &str) -> String {
    format!("{}_furnis.manifest.json", short_name.replace('.', "_"))
}

/// Resolves a list of short codes into regions, preserving order.
///
/// # Returns
///
/// * `Ok(Vec<&Region>)` - One entry per requested code.
/// * `Err(anyhow::Error)` - A code does not name a known region.
pub fn select_regions(codes: &[String]) -> AnyhowResult<Vec<&'static Region>> {
    codes
        .iter()
        .filter(|c| !c.trim().is_empty())
        .map(|code| {
            Region::by_short_name(code).with_context(|| {
                let known: Vec<&str> = REGIONS.iter().map(|r| r.short_name).collect();
                format!("Unknown region '{}' (known: {})", code, known.join(", "))
            })
        })
        .collect()
}

/// Settings for the Fetcher stage.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Bearer credential for the catalog API.
    pub api_token: String,
    /// Base URL of the catalog API, without the `/furniture` path.
    pub base_url: String,
    pub per_page: u32,
    /// Pause after each successful page request.
    pub page_delay: Duration,
    /// Upper bound for a single page request.
    pub request_timeout: Duration,
}

impl FetchConfig {
    /// Builds a configuration with the default base URL and pacing.
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            base_url: DEFAULT_API_BASE_URL.to_string(),
            per_page: PAGE_SIZE,
            page_delay: Duration::from_millis(500),
            request_timeout: Duration::from_secs(15),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Builds a configuration from an optional token, failing when it is absent or blank.
    pub fn from_token(api_token: Option<&str>) -> AnyhowResult<Self> {
        let token = api_token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .context("HABBOFURNI_API_TOKEN is not set; it is required for the fetch stage")?;
        Ok(Self::new(token))
    }
}

/// Settings for the Merger stage.
#[derive(Debug, Clone, Default)]
pub struct MergeOptions {
    /// Refuse to merge when a region manifest reports skipped pages.
    pub require_complete: bool,
}

/// Settings for the Asset Downloader stage.
#[derive(Debug, Clone)]
pub struct AssetOptions {
    /// Fetch the `.swf` animation resource.
    pub download_swf: bool,
    /// Fetch the icon image.
    pub download_icons: bool,
    /// Pause after each successful download.
    pub delay: Duration,
    pub request_timeout: Duration,
}

impl AssetOptions {
    pub fn new(download_swf: bool, download_icons: bool) -> Self {
        Self {
            download_swf,
            download_icons,
            delay: Duration::from_millis(200),
            request_timeout: Duration::from_secs(10),
        }
    }

    /// Returns `true` when at least one asset kind is enabled.
    pub fn any_enabled(&self) -> bool {
        self.download_swf || self.download_icons
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_lookup_is_case_insensitive() {
        let region = Region::by_short_name("com.br").unwrap();
        assert_eq!(region.id, 2);
        assert_eq!(region.short_name, "COM.BR");
        assert!(Region::by_short_name("XX").is_none());
    }

    #[test]
    fn test_region_file_names_replace_dots() {
        let region = Region::by_short_name("COM.TR").unwrap();
        assert_eq!(region.file_name(), "COM_TR_furnis.json");
        assert_eq!(region.manifest_file_name(), "COM_TR_furnis.manifest.json");
        assert_eq!(region_file_name("ES"), "ES_furnis.json");
    }

    #[test]
    fn test_select_regions_preserves_order_and_rejects_unknown() {
        let codes = vec!["ES".to_string(), "COM".to_string()];
        let regions = select_regions(&codes).unwrap();
        assert_eq!(regions[0].short_name, "ES");
        assert_eq!(regions[1].short_name, "COM");

        let bad = vec!["COM".to_string(), "MARS".to_string()];
        let err = select_regions(&bad).unwrap_err();
        assert!(err.to_string().contains("MARS"));
    }

    #[test]
    fn test_fetch_config_requires_token() {
        assert!(FetchConfig::from_token(None).is_err());
        assert!(FetchConfig::from_token(Some("   ")).is_err());

        let config = FetchConfig::from_token(Some("secret")).unwrap();
        assert_eq!(config.api_token, "secret");
        assert_eq!(config.per_page, 100);
        assert_eq!(config.base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn test_asset_options_any_enabled() {
        assert!(!AssetOptions::new(false, false).any_enabled());
        assert!(AssetOptions::new(false, true).any_enabled());
    }
}
