use super::reveal::{reveal_phones, RevealTiming};
use crate::core::config::{ScoutConfig, SelectorChain, CARD_SELECTORS, NEXT_SELECTORS};
use crate::core::error::Result;
use crate::core::result_set::ResultSet;
use crate::core::types::Record;
use crate::scraping::dom::parse_selector;
use crate::scraping::driver::{ElementTarget, PageDriver};
use crate::scraping::listing::ListingExtractor;
use scraper::{ElementRef, Html};
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct PaginationConfig {
    pub auto_paginate: bool,
    pub reveal_phones: bool,
    /// Upper bound on visited pages, entry page included.
    pub max_pages: usize,
    /// Wait after activating the next-page control.
    pub page_delay: Duration,
    /// Wait between scrolling the next-page control into view and clicking it.
    pub next_settle: Duration,
    pub reveal_timing: RevealTiming,
    /// Wait after a reveal pass on a freshly loaded page.
    pub reveal_settle: Duration,
    pub cards: SelectorChain,
    pub next: SelectorChain,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            auto_paginate: false,
            reveal_phones: false,
            max_pages: 1,
            page_delay: Duration::from_millis(2000),
            next_settle: Duration::from_millis(500),
            reveal_timing: RevealTiming::default(),
            reveal_settle: Duration::from_millis(1000),
            cards: SelectorChain::new(CARD_SELECTORS.iter().copied()),
            next: SelectorChain::new(NEXT_SELECTORS.iter().copied()),
        }
    }
}

impl PaginationConfig {
    pub fn from_scout_config(cfg: &ScoutConfig) -> Self {
        Self {
            auto_paginate: cfg.listing.auto_paginate.unwrap_or(false),
            reveal_phones: cfg.listing.reveal_phones.unwrap_or(false),
            max_pages: cfg.resolve_max_pages(),
            page_delay: cfg.resolve_page_delay(),
            cards: cfg.card_selectors(),
            next: cfg.next_selectors(),
            ..Self::default()
        }
    }

    /// Zero every settle delay; used by tests and dry runs.
    pub fn without_delays(mut self) -> Self {
        self.page_delay = Duration::ZERO;
        self.next_settle = Duration::ZERO;
        self.reveal_timing = RevealTiming::immediate();
        self.reveal_settle = Duration::ZERO;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Pagination was not requested; only the entry page was read.
    SinglePage,
    PageLimit,
    NoNextControl,
    NextDisabled,
    /// Scrolling, clicking or reading the next page failed.
    AdvanceFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageState {
    AwaitingPage,
    CheckNext,
    Advance(ElementTarget),
    Done(StopReason),
}

/// What the next-page lookup found on a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextControl {
    Missing,
    Disabled,
    Ready(ElementTarget),
}

#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub records: ResultSet,
    pub pages_visited: usize,
    pub stop: StopReason,
}

fn is_disabled(control: ElementRef<'_>) -> bool {
    let el = control.value();
    el.classes().any(|c| c.contains("disabled"))
        || el.attr("disabled").is_some()
        || el.attr("aria-disabled") == Some("true")
}

/// Locate the next-page control: the first selector with a match decides.
pub fn find_next_control(html: &str, chain: &SelectorChain) -> NextControl {
    let document = Html::parse_document(html);
    for css in chain.iter() {
        let Some(selector) = parse_selector(css) else {
            continue;
        };
        if let Some(control) = document.select(&selector).next() {
            if is_disabled(control) {
                return NextControl::Disabled;
            }
            return NextControl::Ready(ElementTarget::new(css, 0));
        }
    }
    NextControl::Missing
}

async fn extract_current(
    driver: &dyn PageDriver,
    extractor: &ListingExtractor,
    config: &PaginationConfig,
    entry_url: &str,
) -> Result<Vec<Record>> {
    let html = driver.html().await?;
    let page_url = driver
        .current_url()
        .await
        .unwrap_or_else(|| entry_url.to_string());
    Ok(extractor.extract_page(&html, &page_url, &config.cards))
}

async fn check_next(
    driver: &dyn PageDriver,
    config: &PaginationConfig,
    pages: usize,
) -> PageState {
    if !config.auto_paginate {
        return PageState::Done(StopReason::SinglePage);
    }
    if pages >= config.max_pages {
        return PageState::Done(StopReason::PageLimit);
    }
    let html = match driver.html().await {
        Ok(html) => html,
        Err(e) => {
            warn!("page {}: cannot look for a next page: {}", pages, e);
            return PageState::Done(StopReason::AdvanceFailed);
        }
    };
    match find_next_control(&html, &config.next) {
        NextControl::Ready(target) => PageState::Advance(target),
        NextControl::Disabled => PageState::Done(StopReason::NextDisabled),
        NextControl::Missing => PageState::Done(StopReason::NoNextControl),
    }
}

async fn advance(
    driver: &dyn PageDriver,
    extractor: &ListingExtractor,
    config: &PaginationConfig,
    target: &ElementTarget,
    entry_url: &str,
) -> Result<Vec<Record>> {
    driver.scroll_into_view(target).await?;
    tokio::time::sleep(config.next_settle).await;
    driver.click(target).await?;
    tokio::time::sleep(config.page_delay).await;

    if config.reveal_phones {
        reveal_phones(driver, &config.reveal_timing).await;
        tokio::time::sleep(config.reveal_settle).await;
    }

    extract_current(driver, extractor, config, entry_url).await
}

/// Harvest the listing the driver currently shows, following next-page
/// controls up to `max_pages`.
///
/// Reading the entry page is the only fatal step. A failure while advancing
/// ends the crawl with the records gathered so far. The returned set is
/// deduplicated across pages, first occurrence kept.
pub async fn traverse(
    driver: &dyn PageDriver,
    extractor: &ListingExtractor,
    config: &PaginationConfig,
    entry_url: &str,
) -> Result<CrawlOutcome> {
    let mut records = ResultSet::new();
    let mut pages = 0;
    let mut state = PageState::AwaitingPage;

    let stop = loop {
        state = match state {
            PageState::AwaitingPage => {
                if config.reveal_phones {
                    reveal_phones(driver, &config.reveal_timing).await;
                }
                let found = extract_current(driver, extractor, config, entry_url).await?;
                pages = 1;
                info!("page {}: {} record(s)", pages, found.len());
                records.extend(found);
                PageState::CheckNext
            }
            PageState::CheckNext => check_next(driver, config, pages).await,
            PageState::Advance(target) => {
                debug!("page {}: next control {}", pages, target);
                match advance(driver, extractor, config, &target, entry_url).await {
                    Ok(found) => {
                        pages += 1;
                        info!("page {}: {} record(s)", pages, found.len());
                        records.extend(found);
                        PageState::CheckNext
                    }
                    Err(e) => {
                        warn!("page {}: pagination stopped: {}", pages + 1, e);
                        PageState::Done(StopReason::AdvanceFailed)
                    }
                }
            }
            PageState::Done(reason) => break reason,
        };
    };

    let before = records.len();
    records.dedup();
    info!(
        "crawl finished after {} page(s) ({:?}): {} record(s), {} duplicate(s) dropped",
        pages,
        stop,
        records.len(),
        before - records.len()
    );

    Ok(CrawlOutcome {
        records,
        pages_visited: pages,
        stop,
    })
}
