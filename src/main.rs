use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;
use url::Url;

use annuaire_scout::core::config::{
    load_scout_config, ScoutConfig, SelectorChain, CARD_SELECTORS, NEXT_SELECTORS,
};
use annuaire_scout::export::{self, EnrichStats, ScrapeStats};
use annuaire_scout::tools::{
    enrich_into, traverse, CrawlOutcome, EnrichConfig, PaginationConfig,
};
use annuaire_scout::{
    BrowserSession, CdpDriver, EnrichMode, ListingExtractor, PageDriver, ResultSet, ScoutError,
};

/// Navigation budget for the entry listing page.
const ENTRY_NAV_TIMEOUT: Duration = Duration::from_secs(60);
const EXPORT_PREFIX: &str = "annuaire";

#[derive(Parser)]
#[command(
    name = "annuaire-scout",
    version,
    about = "Harvest business listings from an online directory"
)]
struct Cli {
    /// Run the browser without a window (default)
    #[arg(long, global = true, conflicts_with = "no_headless")]
    headless: bool,
    /// Show the browser window
    #[arg(long, global = true)]
    no_headless: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract every listing of a result page, optionally following pagination
    Scrape {
        /// Entry listing page (absolute http/https URL)
        url: String,
        /// Visit up to N result pages; enables pagination
        #[arg(long)]
        max_pages: Option<usize>,
        /// Wait after clicking "next", in ms
        #[arg(long)]
        page_delay: Option<u64>,
        /// Click "show number" controls before extracting each page
        #[arg(long)]
        reveal_phones: bool,
        /// CSS selector tried first for the next-page control
        #[arg(long)]
        next_selector: Option<String>,
        /// CSS selector tried first for listing cards
        #[arg(long)]
        card_selector: Option<String>,
        /// Output directory for the JSON/CSV exports
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Merge into a previous export, skipping URLs it already holds
        #[arg(long)]
        append: Option<PathBuf>,
    },
    /// Visit the detail page of each record in a JSON export and fill the gaps
    Enrich {
        /// JSON array produced by `scrape`
        input: PathBuf,
        /// Output file (default: <input>_enriched.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Pause between detail visits, in ms
        #[arg(long)]
        delay: Option<u64>,
        /// Visit at most N records
        #[arg(long)]
        max_items: Option<usize>,
        /// Merge into a previous export, skipping URLs it already holds
        #[arg(long)]
        append: Option<PathBuf>,
    },
}

fn resolve_headless(cli: &Cli, cfg: &ScoutConfig) -> bool {
    if cli.no_headless {
        false
    } else if cli.headless {
        true
    } else {
        cfg.resolve_headless()
    }
}

fn parse_target_url(raw: &str) -> Result<Url, ScoutError> {
    let url = Url::parse(raw.trim()).map_err(|_| ScoutError::InvalidUrl(raw.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ScoutError::InvalidUrl(raw.to_string()));
    }
    Ok(url)
}

/// Previous export for cumulative runs, or an empty set in replace mode.
fn load_accumulated(append: Option<&Path>) -> anyhow::Result<(ResultSet, EnrichMode)> {
    match append {
        Some(path) => {
            let set = ResultSet::load(path)
                .with_context(|| format!("cannot load previous results from {}", path.display()))?;
            info!("append mode: {} existing record(s) from {}", set.len(), path.display());
            Ok((set, EnrichMode::Append))
        }
        None => Ok((ResultSet::new(), EnrichMode::Replace)),
    }
}

async fn open_driver(session: &BrowserSession) -> anyhow::Result<CdpDriver> {
    session.open_driver().await.context("cannot open a browser tab")
}

async fn crawl_listing(
    session: &BrowserSession,
    extractor: &ListingExtractor,
    pagination: &PaginationConfig,
    target: &Url,
) -> anyhow::Result<CrawlOutcome> {
    let driver = open_driver(session).await?;
    info!("opening {}", target);
    driver
        .goto(target.as_str(), ENTRY_NAV_TIMEOUT)
        .await
        .with_context(|| format!("cannot load {target}"))?;
    traverse(&driver, extractor, pagination, target.as_str())
        .await
        .context("cannot read the entry page")
}

#[allow(clippy::too_many_arguments)]
async fn run_scrape(
    cfg: &ScoutConfig,
    headless: bool,
    url: String,
    max_pages: Option<usize>,
    page_delay: Option<u64>,
    reveal_phones: bool,
    next_selector: Option<String>,
    card_selector: Option<String>,
    output: Option<PathBuf>,
    append: Option<PathBuf>,
) -> anyhow::Result<()> {
    let target = parse_target_url(&url)?;
    let (mut set, mode) = load_accumulated(append.as_deref())?;

    let mut pagination = PaginationConfig::from_scout_config(cfg);
    if let Some(n) = max_pages {
        pagination.auto_paginate = true;
        pagination.max_pages = n.max(1);
    }
    if let Some(ms) = page_delay {
        pagination.page_delay = Duration::from_millis(ms);
    }
    pagination.reveal_phones |= reveal_phones;
    if next_selector.is_some() {
        pagination.next = SelectorChain::with_primary(next_selector.as_deref(), NEXT_SELECTORS);
    }
    if card_selector.is_some() {
        pagination.cards = SelectorChain::with_primary(card_selector.as_deref(), CARD_SELECTORS);
    }

    let extractor = ListingExtractor::new(cfg.site_profile());
    let session =
        BrowserSession::launch(cfg.resolve_chrome_executable().as_deref(), headless).await?;

    let crawl = crawl_listing(&session, &extractor, &pagination, &target).await;
    session.close().await;
    let outcome = crawl?;

    let pages = outcome.pages_visited;
    set.absorb(outcome.records.into_records(), mode);

    let dir = output.unwrap_or_else(|| PathBuf::from(cfg.resolve_output_dir()));
    let (json_path, csv_path) = export::timestamped_paths(&dir, EXPORT_PREFIX)?;
    set.save_json(&json_path)?;
    export::write_csv(&csv_path, set.records())?;

    println!("{}", ScrapeStats::collect(set.records(), pages));
    println!("JSON:     {}", json_path.display());
    if !set.is_empty() {
        println!("CSV:      {}", csv_path.display());
    }
    Ok(())
}

async fn run_enrich(
    cfg: &ScoutConfig,
    headless: bool,
    input: PathBuf,
    output: Option<PathBuf>,
    delay: Option<u64>,
    max_items: Option<usize>,
    append: Option<PathBuf>,
) -> anyhow::Result<()> {
    let batch = ResultSet::load(&input)
        .with_context(|| format!("cannot load records from {}", input.display()))?;
    let (mut set, mode) = load_accumulated(append.as_deref())?;
    let output = output
        .or_else(|| cfg.enrich.output_file.clone().map(PathBuf::from))
        .unwrap_or_else(|| export::enriched_output_path(&input));

    let mut enrich = EnrichConfig::from_scout_config(cfg);
    if let Some(ms) = delay {
        enrich.delay = Duration::from_millis(ms);
    }
    if max_items.is_some() {
        enrich.max_items = max_items;
    }

    if batch.is_empty() {
        bail!("{} holds no records", input.display());
    }
    info!("{} record(s) loaded from {}", batch.len(), input.display());

    let extractor = ListingExtractor::new(cfg.site_profile());
    let session =
        BrowserSession::launch(cfg.resolve_chrome_executable().as_deref(), headless).await?;

    let run = async {
        let driver = open_driver(&session).await?;
        let outcome =
            enrich_into(&driver, &extractor, &mut set, batch.into_records(), mode, &enrich).await;
        anyhow::Ok(outcome)
    }
    .await;
    session.close().await;
    let (report, _) = run?;

    set.save_json(&output)?;
    println!(
        "{}",
        EnrichStats::collect(set.records(), report.processed, report.enriched)
    );
    println!("Output:    {}", output.display());
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = load_scout_config();
    let headless = resolve_headless(&cli, &cfg);

    match cli.command {
        Commands::Scrape {
            url,
            max_pages,
            page_delay,
            reveal_phones,
            next_selector,
            card_selector,
            output,
            append,
        } => {
            run_scrape(
                &cfg,
                headless,
                url,
                max_pages,
                page_delay,
                reveal_phones,
                next_selector,
                card_selector,
                output,
                append,
            )
            .await
        }
        Commands::Enrich {
            input,
            output,
            delay,
            max_items,
            append,
        } => run_enrich(&cfg, headless, input, output, delay, max_items, append).await,
    }
}
