pub mod config;
pub mod error;
pub mod result_set;
pub mod types;

pub use error::{Result, ScoutError};
pub use result_set::ResultSet;
