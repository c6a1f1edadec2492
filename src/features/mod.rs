pub mod export;

pub use export::{EnrichStats, ScrapeStats};
