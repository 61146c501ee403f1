pub mod filter;
pub use filter::{TenderFilter, TenderStats};

pub mod tender_cache;
pub use tender_cache::{
    CacheEntry, CacheStatus, TenderCache, TenderError, TenderOutcome, TenderResult,
};
