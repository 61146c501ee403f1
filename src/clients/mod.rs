pub mod scraper;

pub use scraper::{ScraperClient, TenderSource, UpstreamError};
