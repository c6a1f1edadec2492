pub mod core;
pub mod features;
pub mod scraping;
pub mod tools;

// --- Primary core exports ---
pub use crate::core::types;
pub use crate::core::types::{EnrichMode, Record};
pub use crate::core::{Result, ResultSet, ScoutError};

pub use features::export;
pub use scraping::{BrowserSession, CdpDriver, ElementTarget, ListingExtractor, PageDriver};
pub use tools::{enrich, paginate, reveal};
