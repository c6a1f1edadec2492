pub mod enrich;
pub mod paginate;
pub mod reveal;

pub use enrich::{enrich_into, enrich_records, EnrichConfig, EnrichReport};
pub use paginate::{traverse, CrawlOutcome, PaginationConfig, StopReason};
pub use reveal::{plan_reveals, reveal_phones, RevealOutcome, RevealTiming};
