pub mod browser_manager;
pub mod dom;
pub mod driver;
pub mod listing;

pub use browser_manager::BrowserSession;
pub use driver::{CdpDriver, ElementTarget, PageDriver};
pub use listing::ListingExtractor;
