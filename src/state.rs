use std::sync::Arc;

use crate::clients::{ScraperClient, TenderSource};
use crate::config::Config;
use crate::services::TenderCache;

/// Long-lived state shared by the HTTP server and the CLI.
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub tenders: Arc<TenderCache>,
}

impl SharedState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let scraper = ScraperClient::new(&config.upstream)?;
        Ok(Self::with_source(config, Arc::new(scraper)))
    }

    /// Builds the state around an arbitrary tender source.
    #[must_use]
    pub fn with_source(config: Config, source: Arc<dyn TenderSource>) -> Self {
        let tenders = TenderCache::new(
            source,
            config.query.to_query(),
            config.cache.ttl(),
            config.upstream.request_timeout(),
        );

        Self {
            config: Arc::new(config),
            tenders: Arc::new(tenders),
        }
    }
}
