//! Single-slot tender cache in front of the scraping service.
//!
//! The slot holds the last successful scrape. Requests inside the TTL are
//! answered from it; once it expires the next request triggers one upstream
//! call. Concurrent misses join the same in-flight call instead of issuing
//! their own. When the upstream fails, whatever is in the slot is served as
//! stale data, and only a cold start with no data surfaces an error.

use chrono::{DateTime, Utc};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{info, warn};

use crate::clients::{TenderSource, UpstreamError};
use crate::models::tender::{TenderPayload, TenderQuery};

#[derive(Debug, Error)]
pub enum TenderError {
    /// The upstream failed and nothing has ever been cached.
    #[error("{0}")]
    NoCache(Arc<UpstreamError>),
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub payload: Arc<TenderPayload>,
    pub stored_at: Instant,
    pub fetched_at: DateTime<Utc>,
}

impl CacheEntry {
    fn new(payload: TenderPayload) -> Self {
        Self {
            payload: Arc::new(payload),
            stored_at: Instant::now(),
            fetched_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn age(&self) -> Duration {
        Instant::now().saturating_duration_since(self.stored_at)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TenderOutcome {
    /// Just fetched from the upstream.
    Fresh,

    /// Served from a cache entry younger than the TTL.
    Hit { age: Duration },

    /// Upstream refresh failed; served the last good entry instead.
    /// `error` is `None` when the upstream was rate limiting.
    Stale { age: Duration, error: Option<String> },
}

#[derive(Debug, Clone)]
pub struct TenderResult {
    pub payload: Arc<TenderPayload>,
    pub outcome: TenderOutcome,
    pub fetched_at: DateTime<Utc>,
}

impl TenderResult {
    fn from_entry(entry: &CacheEntry, outcome: TenderOutcome) -> Self {
        Self {
            payload: Arc::clone(&entry.payload),
            outcome,
            fetched_at: entry.fetched_at,
        }
    }

    #[must_use]
    pub const fn is_cached(&self) -> bool {
        !matches!(self.outcome, TenderOutcome::Fresh)
    }

    #[must_use]
    pub const fn is_stale(&self) -> bool {
        matches!(self.outcome, TenderOutcome::Stale { .. })
    }

    /// Whole seconds since the entry was stored; `None` for fresh results.
    #[must_use]
    pub const fn cache_age_secs(&self) -> Option<u64> {
        match &self.outcome {
            TenderOutcome::Fresh => None,
            TenderOutcome::Hit { age } | TenderOutcome::Stale { age, .. } => Some(age.as_secs()),
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            TenderOutcome::Stale { error, .. } => error.as_deref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CacheStatus {
    pub age: u64,
    pub items: usize,
}

type FlightResult = Result<CacheEntry, Arc<UpstreamError>>;
type Flight = Shared<BoxFuture<'static, FlightResult>>;

enum Joined {
    Cached(TenderResult),
    Flight(Flight),
}

pub struct TenderCache {
    source: Arc<dyn TenderSource>,
    query: Arc<TenderQuery>,
    ttl: Duration,
    upstream_timeout: Duration,
    slot: Arc<RwLock<Option<CacheEntry>>>,
    inflight: Arc<Mutex<Option<Flight>>>,
}

impl TenderCache {
    #[must_use]
    pub fn new(
        source: Arc<dyn TenderSource>,
        query: TenderQuery,
        ttl: Duration,
        upstream_timeout: Duration,
    ) -> Self {
        Self {
            source,
            query: Arc::new(query),
            ttl,
            upstream_timeout,
            slot: Arc::new(RwLock::new(None)),
            inflight: Arc::new(Mutex::new(None)),
        }
    }

    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    #[must_use]
    pub fn query(&self) -> &TenderQuery {
        &self.query
    }

    pub async fn get_tenders(&self) -> Result<TenderResult, TenderError> {
        if let Some(hit) = self.fresh_hit().await {
            return Ok(hit);
        }

        let flight = match self.join_flight().await {
            Joined::Cached(hit) => return Ok(hit),
            Joined::Flight(flight) => flight,
        };

        match flight.await {
            Ok(entry) => Ok(TenderResult::from_entry(&entry, TenderOutcome::Fresh)),
            Err(err) => self.fallback(err).await,
        }
    }

    /// Age and size of the current entry. Never touches the slot contents.
    pub async fn status(&self) -> Option<CacheStatus> {
        self.slot.read().await.as_ref().map(|entry| CacheStatus {
            age: entry.age().as_secs(),
            items: entry.payload.len(),
        })
    }

    async fn fresh_hit(&self) -> Option<TenderResult> {
        let slot = self.slot.read().await;
        let entry = slot.as_ref()?;
        let age = entry.age();

        if age >= self.ttl {
            return None;
        }

        metrics::counter!("tender_cache_hits_total").increment(1);
        info!("Returning cached tenders (age: {} seconds)", age.as_secs());
        Some(TenderResult::from_entry(entry, TenderOutcome::Hit { age }))
    }

    async fn join_flight(&self) -> Joined {
        let mut inflight = self.inflight.lock().await;

        if let Some(flight) = inflight.as_ref() {
            return Joined::Flight(flight.clone());
        }

        // A flight may have completed between the first check and taking the lock.
        if let Some(hit) = self.fresh_hit().await {
            return Joined::Cached(hit);
        }

        metrics::counter!("tender_cache_misses_total").increment(1);
        info!("Cache miss, fetching tenders from scraper");

        let flight = self.start_flight();
        *inflight = Some(flight.clone());
        Joined::Flight(flight)
    }

    /// Runs the upstream call on its own task so the slot is filled even
    /// if every waiting request goes away.
    fn start_flight(&self) -> Flight {
        let source = Arc::clone(&self.source);
        let query = Arc::clone(&self.query);
        let slot = Arc::clone(&self.slot);
        let inflight = Arc::clone(&self.inflight);
        let timeout = self.upstream_timeout;

        let task = tokio::spawn(async move {
            let result = match tokio::time::timeout(timeout, source.fetch(&query)).await {
                Ok(result) => result,
                Err(_) => Err(UpstreamError::Timeout(timeout)),
            };

            let result = match result {
                Ok(payload) => {
                    info!("Fetched {} tenders from scraper", payload.len());
                    let entry = CacheEntry::new(payload);
                    *slot.write().await = Some(entry.clone());
                    Ok(entry)
                }
                Err(err) => {
                    metrics::counter!("tender_upstream_errors_total", "kind" => err.kind())
                        .increment(1);
                    warn!("Scraper request failed: {}", err);
                    Err(Arc::new(err))
                }
            };

            inflight.lock().await.take();
            result
        });

        async move {
            task.await.unwrap_or_else(|e| {
                Err(Arc::new(UpstreamError::Network(format!(
                    "refresh task failed: {e}"
                ))))
            })
        }
        .boxed()
        .shared()
    }

    async fn fallback(&self, err: Arc<UpstreamError>) -> Result<TenderResult, TenderError> {
        let slot = self.slot.read().await;
        let Some(entry) = slot.as_ref() else {
            return Err(TenderError::NoCache(err));
        };

        metrics::counter!("tender_cache_stale_total").increment(1);

        let error = if err.is_rate_limited() {
            warn!("Rate limited, returning stale cache");
            None
        } else {
            warn!("Upstream error, returning stale cache");
            Some(err.to_string())
        };

        Ok(TenderResult::from_entry(
            entry,
            TenderOutcome::Stale {
                age: entry.age(),
                error,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tender::Tender;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TTL: Duration = Duration::from_secs(300);
    const TIMEOUT: Duration = Duration::from_secs(30);

    /// Plays back scripted responses in order, repeating the last one.
    struct ScriptedSource {
        responses: std::sync::Mutex<VecDeque<Result<TenderPayload, UpstreamError>>>,
        calls: AtomicUsize,
        delay: Duration,
    }

    impl ScriptedSource {
        fn new(responses: Vec<Result<TenderPayload, UpstreamError>>) -> Arc<Self> {
            Self::with_delay(responses, Duration::ZERO)
        }

        fn with_delay(
            responses: Vec<Result<TenderPayload, UpstreamError>>,
            delay: Duration,
        ) -> Arc<Self> {
            Arc::new(Self {
                responses: std::sync::Mutex::new(responses.into()),
                calls: AtomicUsize::new(0),
                delay,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TenderSource for ScriptedSource {
        async fn fetch(&self, _query: &TenderQuery) -> Result<TenderPayload, UpstreamError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            let mut responses = self.responses.lock().unwrap();
            let next = if responses.len() > 1 {
                responses.pop_front().unwrap()
            } else {
                responses.front().unwrap().clone()
            };
            drop(responses);
            next
        }
    }

    fn payload(numbers: &[&str]) -> TenderPayload {
        TenderPayload::new(
            numbers
                .iter()
                .map(|n| {
                    Tender::from(json!({
                        "number": n,
                        "title": format!("Tender {n}"),
                        "status": "open"
                    }))
                })
                .collect(),
        )
    }

    fn query() -> TenderQuery {
        TenderQuery {
            keywords: vec!["Firewall".to_string()],
            max_results: 50,
            strict_mode: true,
            loose_phrases: false,
        }
    }

    fn cache(source: Arc<ScriptedSource>) -> TenderCache {
        TenderCache::new(source, query(), TTL, TIMEOUT)
    }

    fn numbers(result: &TenderResult) -> Vec<String> {
        result
            .payload
            .results
            .iter()
            .map(|t| t.number().into_owned())
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_fetch_is_fresh() {
        let source = ScriptedSource::new(vec![Ok(payload(&["T-1"]))]);
        let cache = cache(source.clone());

        let result = cache.get_tenders().await.unwrap();
        assert_eq!(result.outcome, TenderOutcome::Fresh);
        assert!(!result.is_cached());
        assert_eq!(result.cache_age_secs(), None);
        assert_eq!(numbers(&result), vec!["T-1"]);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hit_within_ttl() {
        let source = ScriptedSource::new(vec![Ok(payload(&["T-1"]))]);
        let cache = cache(source.clone());
        cache.get_tenders().await.unwrap();

        tokio::time::advance(TTL - Duration::from_secs(1)).await;

        let result = cache.get_tenders().await.unwrap();
        assert!(result.is_cached());
        assert!(!result.is_stale());
        assert_eq!(result.cache_age_secs(), Some(299));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refetch_after_ttl() {
        let source = ScriptedSource::new(vec![Ok(payload(&["T-1"])), Ok(payload(&["T-2"]))]);
        let cache = cache(source.clone());
        cache.get_tenders().await.unwrap();

        tokio::time::advance(TTL + Duration::from_secs(1)).await;

        let result = cache.get_tenders().await.unwrap();
        assert_eq!(result.outcome, TenderOutcome::Fresh);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_success_replaces_first() {
        let source = ScriptedSource::new(vec![
            Ok(payload(&["T-1", "T-2"])),
            Ok(payload(&["T-3"])),
        ]);
        let cache = cache(source.clone());
        cache.get_tenders().await.unwrap();

        tokio::time::advance(TTL).await;
        cache.get_tenders().await.unwrap();

        let result = cache.get_tenders().await.unwrap();
        assert!(result.is_cached());
        assert_eq!(numbers(&result), vec!["T-3"]);
        assert_eq!(cache.status().await.unwrap().items, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_serves_stale() {
        let source = ScriptedSource::new(vec![
            Ok(payload(&["T-1"])),
            Err(UpstreamError::RateLimited),
            Err(UpstreamError::RateLimited),
        ]);
        let cache = cache(source.clone());
        cache.get_tenders().await.unwrap();

        tokio::time::advance(Duration::from_secs(3600)).await;

        let result = cache.get_tenders().await.unwrap();
        assert!(result.is_cached());
        assert!(result.is_stale());
        assert_eq!(result.error(), None);
        assert_eq!(result.cache_age_secs(), Some(3600));
        assert_eq!(numbers(&result), vec!["T-1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_error_serves_stale_with_message() {
        let source = ScriptedSource::new(vec![
            Ok(payload(&["T-1"])),
            Err(UpstreamError::Network("connection refused".to_string())),
        ]);
        let cache = cache(source.clone());
        cache.get_tenders().await.unwrap();

        tokio::time::advance(TTL).await;

        let result = cache.get_tenders().await.unwrap();
        assert!(result.is_stale());
        let error = result.error().unwrap();
        assert!(error.contains("connection refused"));
        assert_eq!(numbers(&result), vec!["T-1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cold_start_failure() {
        let source = ScriptedSource::new(vec![Err(UpstreamError::Status {
            status: 502,
            reason: "Bad Gateway".to_string(),
        })]);
        let cache = cache(source);

        let err = cache.get_tenders().await.unwrap_err();
        assert_eq!(err.to_string(), "Backend API failed: 502 Bad Gateway");
        assert!(cache.status().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_without_cache_is_an_error() {
        let source = ScriptedSource::new(vec![Err(UpstreamError::RateLimited)]);
        let cache = cache(source);

        let TenderError::NoCache(err) = cache.get_tenders().await.unwrap_err();
        assert!(err.is_rate_limited());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_upstream_times_out() {
        let source = ScriptedSource::with_delay(vec![Ok(payload(&["T-1"]))], TIMEOUT * 2);
        let cache = cache(source);

        let TenderError::NoCache(err) = cache.get_tenders().await.unwrap_err();
        assert!(matches!(*err, UpstreamError::Timeout(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_misses_share_one_call() {
        let source = ScriptedSource::with_delay(vec![Ok(payload(&["T-1"]))], Duration::from_secs(2));
        let cache = cache(source.clone());

        let results = futures::future::join_all((0..8).map(|_| cache.get_tenders())).await;

        assert_eq!(source.calls(), 1);
        for result in results {
            assert_eq!(numbers(&result.unwrap()), vec!["T-1"]);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_does_not_touch_entry() {
        let source = ScriptedSource::new(vec![Ok(payload(&["T-1", "T-2"]))]);
        let cache = cache(source.clone());
        assert!(cache.status().await.is_none());

        cache.get_tenders().await.unwrap();
        tokio::time::advance(Duration::from_secs(90)).await;

        let first = cache.status().await.unwrap();
        let second = cache.status().await.unwrap();
        assert_eq!(first, CacheStatus { age: 90, items: 2 });
        assert_eq!(first, second);

        let result = cache.get_tenders().await.unwrap();
        assert_eq!(result.cache_age_secs(), Some(90));
        assert_eq!(source.calls(), 1);
    }
}
