use std::path::Path;
use std::time::Duration;

// ---------------------------------------------------------------------------
// ScoutConfig: file-based config loader (annuaire-scout.json) with env-var fallback
// ---------------------------------------------------------------------------

/// Listing traversal sub-config (mirrors the `listing` key in annuaire-scout.json).
#[derive(serde::Deserialize, Default, Clone, Debug)]
pub struct ListingFileConfig {
    pub auto_paginate: Option<bool>,
    pub reveal_phones: Option<bool>,
    /// Upper bound on visited result pages, entry page included. Default: 1.
    pub max_pages: Option<usize>,
    /// Wait after activating the next-page control. Default: 2000.
    pub page_delay_ms: Option<u64>,
    pub next_selector: Option<String>,
    pub card_selector: Option<String>,
    /// Directory receiving the JSON/CSV exports. Default: `./output`.
    pub output_dir: Option<String>,
}

/// Detail enrichment sub-config (mirrors the `enrich` key).
#[derive(serde::Deserialize, Default, Clone, Debug)]
pub struct EnrichFileConfig {
    /// Fixed pause between two detail visits. Default: 2000.
    pub delay_ms: Option<u64>,
    pub max_items: Option<usize>,
    pub output_file: Option<String>,
}

/// Browser sub-config (mirrors the `browser` key).
#[derive(serde::Deserialize, Default, Clone, Debug)]
pub struct BrowserFileConfig {
    pub headless: Option<bool>,
    pub chrome_executable: Option<String>,
}

/// Site sub-config (mirrors the `site` key).
#[derive(serde::Deserialize, Default, Clone, Debug)]
pub struct SiteFileConfig {
    pub detail_marker: Option<String>,
    pub directory_host: Option<String>,
}

/// Top-level config loaded from `annuaire-scout.json`.
#[derive(serde::Deserialize, Default, Clone, Debug)]
pub struct ScoutConfig {
    #[serde(default)]
    pub listing: ListingFileConfig,
    #[serde(default)]
    pub enrich: EnrichFileConfig,
    #[serde(default)]
    pub browser: BrowserFileConfig,
    #[serde(default)]
    pub site: SiteFileConfig,
}

impl ScoutConfig {
    pub fn resolve_max_pages(&self) -> usize {
        self.listing.max_pages.unwrap_or(1).max(1)
    }

    pub fn resolve_page_delay(&self) -> Duration {
        Duration::from_millis(self.listing.page_delay_ms.unwrap_or(2000))
    }

    pub fn resolve_detail_delay(&self) -> Duration {
        Duration::from_millis(self.enrich.delay_ms.unwrap_or(2000))
    }

    pub fn resolve_output_dir(&self) -> String {
        self.listing
            .output_dir
            .clone()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| "./output".to_string())
    }

    /// Headless flag: JSON field → `ANNUAIRE_SCOUT_HEADLESS` env var → `true`.
    pub fn resolve_headless(&self) -> bool {
        if let Some(h) = self.browser.headless {
            return h;
        }
        headless_from_env().unwrap_or(true)
    }

    /// Browser binary: JSON field → `CHROME_EXECUTABLE` env var → auto-discovery.
    pub fn resolve_chrome_executable(&self) -> Option<String> {
        self.browser
            .chrome_executable
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty() && Path::new(p).exists())
            .map(str::to_string)
            .or_else(chrome_executable_override)
    }

    pub fn site_profile(&self) -> SiteProfile {
        let defaults = SiteProfile::default();
        SiteProfile {
            detail_marker: self
                .site
                .detail_marker
                .clone()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or(defaults.detail_marker),
            directory_host: self
                .site
                .directory_host
                .clone()
                .filter(|h| !h.trim().is_empty())
                .unwrap_or(defaults.directory_host),
        }
    }

    pub fn card_selectors(&self) -> SelectorChain {
        SelectorChain::with_primary(self.listing.card_selector.as_deref(), CARD_SELECTORS)
    }

    pub fn next_selectors(&self) -> SelectorChain {
        SelectorChain::with_primary(self.listing.next_selector.as_deref(), NEXT_SELECTORS)
    }
}

/// Load `annuaire-scout.json` from standard locations.
///
/// Search order (first found wins):
/// 1. `ANNUAIRE_SCOUT_CONFIG` env var path
/// 2. `./annuaire-scout.json`
/// 3. `../annuaire-scout.json`
///
/// Missing file → `ScoutConfig::default()`.
/// Parse error → log a warning, return `ScoutConfig::default()`.
pub fn load_scout_config() -> ScoutConfig {
    let candidates: Vec<std::path::PathBuf> = {
        let mut v = vec![
            std::path::PathBuf::from("annuaire-scout.json"),
            std::path::PathBuf::from("../annuaire-scout.json"),
        ];
        if let Ok(env_path) = std::env::var(ENV_CONFIG_PATH) {
            v.insert(0, std::path::PathBuf::from(env_path));
        }
        v
    };

    for path in &candidates {
        let Ok(contents) = std::fs::read_to_string(path) else {
            continue;
        };
        return match serde_json::from_str::<ScoutConfig>(&contents) {
            Ok(cfg) => {
                tracing::info!("annuaire-scout.json loaded from {}", path.display());
                cfg
            }
            Err(e) => {
                tracing::warn!(
                    "annuaire-scout.json parse error at {}: {} (using defaults)",
                    path.display(),
                    e
                );
                ScoutConfig::default()
            }
        };
    }

    ScoutConfig::default()
}

// ---------------------------------------------------------------------------

pub const ENV_CONFIG_PATH: &str = "ANNUAIRE_SCOUT_CONFIG";
pub const ENV_CHROME_EXECUTABLE: &str = "CHROME_EXECUTABLE";
pub const ENV_HEADLESS: &str = "ANNUAIRE_SCOUT_HEADLESS";

/// Listing-card selectors tried after the configured primary one.
pub const CARD_SELECTORS: &[&str] = &[
    r#".bi-list li, article[itemtype*="LocalBusiness"]"#,
    "article",
    r#"li[class*="item"]"#,
    r#"section[class*="result"]"#,
    r#"div[class*="bi-"]"#,
];

/// Next-page selectors tried after the configured primary one.
pub const NEXT_SELECTORS: &[&str] = &[
    r#"a[rel="next"], #pagination-next"#,
    r#"[aria-label*="age suivant"]"#,
    r#"a[aria-label*="suivant"]"#,
];

/// Optional override for the Chromium-family browser executable.
///
/// Only returns a value when `CHROME_EXECUTABLE` is set to an existing path.
pub fn chrome_executable_override() -> Option<String> {
    let p = std::env::var(ENV_CHROME_EXECUTABLE).ok()?;
    let p = p.trim();
    if !p.is_empty() && Path::new(p).exists() {
        Some(p.to_string())
    } else {
        None
    }
}

fn headless_from_env() -> Option<bool> {
    let v = std::env::var(ENV_HEADLESS).ok()?;
    let v = v.trim().to_ascii_lowercase();
    if v.is_empty() {
        return None;
    }
    Some(!matches!(v.as_str(), "0" | "false" | "no" | "off"))
}

/// Site-specific markers shared by every extraction stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteProfile {
    /// Path fragment identifying a business detail page (e.g. `/pros/`).
    pub detail_marker: String,
    /// The directory's own host, never reported as a business website.
    pub directory_host: String,
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self {
            detail_marker: "/pros/".to_string(),
            directory_host: "pagesjaunes.fr".to_string(),
        }
    }
}

impl SiteProfile {
    pub fn is_detail_url(&self, url: &str) -> bool {
        !url.trim().is_empty() && url.contains(&self.detail_marker)
    }

    /// CSS selector matching links to detail pages.
    pub fn detail_link_selector(&self) -> String {
        format!(r#"a[href*="{}"]"#, self.detail_marker.replace('"', ""))
    }
}

/// Ordered selectors for one DOM role, tried in declared order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorChain {
    selectors: Vec<String>,
}

impl SelectorChain {
    pub fn new(selectors: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let mut chain = Self { selectors: Vec::new() };
        for s in selectors {
            chain.push(s.into());
        }
        chain
    }

    /// `primary` first (when set), then the fixed fallbacks.
    pub fn with_primary(primary: Option<&str>, fallbacks: &[&str]) -> Self {
        let mut chain = Self::new(primary.map(str::trim).filter(|p| !p.is_empty()));
        for s in fallbacks {
            chain.push((*s).to_string());
        }
        chain
    }

    fn push(&mut self, selector: String) {
        if !selector.trim().is_empty() && !self.selectors.contains(&selector) {
            self.selectors.push(selector);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.selectors.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = ScoutConfig::default();
        assert_eq!(cfg.resolve_max_pages(), 1);
        assert_eq!(cfg.resolve_page_delay(), Duration::from_millis(2000));
        assert_eq!(cfg.resolve_detail_delay(), Duration::from_millis(2000));
        assert_eq!(cfg.resolve_output_dir(), "./output");
        assert_eq!(cfg.site_profile(), SiteProfile::default());
    }

    #[test]
    fn test_partial_json_parses() {
        let cfg: ScoutConfig = serde_json::from_str(
            r#"{"listing": {"max_pages": 0, "card_selector": ".card"}, "site": {"detail_marker": "/fiche/"}}"#,
        )
        .unwrap();
        assert_eq!(cfg.resolve_max_pages(), 1);
        assert_eq!(cfg.card_selectors().iter().next(), Some(".card"));
        assert_eq!(cfg.card_selectors().len(), CARD_SELECTORS.len() + 1);
        assert!(cfg.site_profile().is_detail_url("https://x.fr/fiche/42"));
    }

    #[test]
    fn test_selector_chain_skips_blank_and_duplicates() {
        let chain = SelectorChain::with_primary(Some("  "), &["a", "b", "a"]);
        assert_eq!(chain.iter().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_detail_url() {
        let profile = SiteProfile::default();
        assert!(profile.is_detail_url("https://www.pagesjaunes.fr/pros/123"));
        assert!(!profile.is_detail_url("https://www.pagesjaunes.fr/annuaire/paris"));
        assert!(!profile.is_detail_url(""));
        assert_eq!(profile.detail_link_selector(), r#"a[href*="/pros/"]"#);
    }
}
