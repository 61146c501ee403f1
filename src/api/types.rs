use serde::Serialize;
use serde_json::{Map, Value};

use crate::models::tender::{Tender, TenderPayload};
use crate::services::{CacheStatus, TenderResult, TenderStats};

/// Keys the proxy adds to the upstream body; upstream fields with these
/// names are dropped so the annotations are unambiguous.
const PROXY_FIELDS: &[&str] = &["results", "cached", "cacheAge", "stale", "error"];

/// Upstream payload annotated with cache metadata.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenderResponse {
    pub results: Vec<Tender>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,

    pub cached: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_age: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stale: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TenderResponse {
    #[must_use]
    pub fn from_result(result: &TenderResult, results: Vec<Tender>) -> Self {
        Self {
            results,
            extra: passthrough_fields(&result.payload),
            cached: result.is_cached(),
            cache_age: result.cache_age_secs(),
            stale: result.is_stale().then_some(true),
            error: result.error().map(ToString::to_string),
        }
    }
}

fn passthrough_fields(payload: &TenderPayload) -> Map<String, Value> {
    payload
        .extra
        .iter()
        .filter(|(key, _)| !PROXY_FIELDS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Body of a failed tender request: the message and an empty result list.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub results: Vec<Tender>,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            results: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub cache: Option<CacheStatus>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    #[serde(flatten)]
    pub stats: TenderStats,

    pub closing_soon: usize,

    pub cached: bool,

    pub stale: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_age: Option<u64>,

    pub fetched_at: String,
}
