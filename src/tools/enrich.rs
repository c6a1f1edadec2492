use crate::core::config::ScoutConfig;
use crate::core::error::Result;
use crate::core::result_set::ResultSet;
use crate::core::types::{EnrichMode, Record};
use crate::scraping::driver::PageDriver;
use crate::scraping::listing::ListingExtractor;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn};

const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body.scrollHeight)";

#[derive(Debug, Clone)]
pub struct EnrichConfig {
    /// Fixed pause between two detail visits. Skipped records do not count.
    pub delay: Duration,
    /// Visit at most this many records; the rest pass through untouched.
    pub max_items: Option<usize>,
    pub nav_timeout: Duration,
    /// Wait after scrolling so lazily rendered blocks are in the DOM.
    pub scroll_settle: Duration,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(2000),
            max_items: None,
            nav_timeout: Duration::from_secs(30),
            scroll_settle: Duration::from_millis(1500),
        }
    }
}

impl EnrichConfig {
    pub fn from_scout_config(cfg: &ScoutConfig) -> Self {
        Self {
            delay: cfg.resolve_detail_delay(),
            max_items: cfg.enrich.max_items,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichReport {
    /// Records within the `max_items` bound.
    pub processed: usize,
    /// Visited records that gained at least one value.
    pub enriched: usize,
    /// Records without a detail-page URL.
    pub skipped: usize,
    /// Visits that failed; those records are left unmodified.
    pub failed: usize,
}

/// Load one detail page and read what it adds.
async fn visit(
    driver: &dyn PageDriver,
    extractor: &ListingExtractor,
    url: &str,
    config: &EnrichConfig,
) -> Result<Record> {
    driver.goto(url, config.nav_timeout).await?;
    if let Err(e) = driver.evaluate(SCROLL_TO_BOTTOM).await {
        debug!("scroll failed on {}: {}", url, e);
    }
    tokio::time::sleep(config.scroll_settle).await;
    let html = driver.html().await?;
    Ok(extractor.extract_detail(&html))
}

/// Visit the detail page of each record, in order, and merge what it adds.
///
/// Records whose `url` is not a detail page are skipped without a visit. A
/// failed visit is logged and leaves its record as it was. `config.delay` is
/// waited before every visit but the first.
pub async fn enrich_records(
    driver: &dyn PageDriver,
    extractor: &ListingExtractor,
    records: &mut [Record],
    config: &EnrichConfig,
) -> EnrichReport {
    let total = config
        .max_items
        .map_or(records.len(), |max| max.min(records.len()));
    let mut report = EnrichReport::default();
    let mut visits = 0;

    for (i, record) in records.iter_mut().take(total).enumerate() {
        report.processed += 1;
        let position = format!("[{}/{}]", i + 1, total);

        if !extractor.profile().is_detail_url(&record.url) {
            info!("{} {}: no detail URL, skipped", position, record.denomination);
            report.skipped += 1;
            continue;
        }

        if visits > 0 {
            tokio::time::sleep(config.delay).await;
        }
        visits += 1;

        info!("{} {}", position, record.denomination);
        debug!("{} visiting {}", position, record.url);

        match visit(driver, extractor, &record.url, config).await {
            Ok(patch) => {
                let changed = record.merge_from(&patch);
                if changed.is_empty() {
                    info!("{} no new data", position);
                } else {
                    report.enriched += 1;
                    info!("{} enriched: {}", position, changed.join(", "));
                }
            }
            Err(e) => {
                report.failed += 1;
                warn!(
                    "{} {} ({}) left unchanged: {}",
                    position, record.denomination, record.url, e
                );
            }
        }
    }

    info!(
        "enrichment done: {} processed, {} enriched, {} skipped, {} failed",
        report.processed, report.enriched, report.skipped, report.failed
    );
    report
}

/// Enrich `batch`, then combine it with `set` according to `mode`.
///
/// In [`EnrichMode::Append`] batch records whose `url` the set already holds
/// are dropped before any visit. Returns the report and the number of records
/// the set gained.
pub async fn enrich_into(
    driver: &dyn PageDriver,
    extractor: &ListingExtractor,
    set: &mut ResultSet,
    mut batch: Vec<Record>,
    mode: EnrichMode,
    config: &EnrichConfig,
) -> (EnrichReport, usize) {
    if mode == EnrichMode::Append {
        let known: HashSet<&str> = set.records().iter().map(|r| r.url.as_str()).collect();
        let before = batch.len();
        batch.retain(|r| !known.contains(r.url.as_str()));
        if batch.len() < before {
            info!("{} record(s) already present, not visited", before - batch.len());
        }
    }

    let report = enrich_records(driver, extractor, &mut batch, config).await;
    let added = set.absorb(batch, mode);
    if mode == EnrichMode::Append {
        info!("{} new record(s) appended, {} in total", added, set.len());
    }
    (report, added)
}
