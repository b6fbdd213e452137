pub mod clock;
pub mod config;
pub mod duration;
pub mod error;
pub mod models;
pub mod page;
pub mod probe;
pub mod scrape;
pub mod sink;

#[cfg(feature = "browser")]
pub mod browser;
#[cfg(feature = "export")]
pub mod export;

pub use error::ScrapeError;
pub use models::{ScrapeOutcome, TransactionRecord, ERROR_MARKER};
pub use scrape::Scraper;
