//! Tender endpoints.
//!
//! All three handlers read through the same [`TenderCache`](crate::services::TenderCache),
//! so a filtered listing never costs an extra upstream call.

use axum::{
    Json,
    extract::{Query, State},
};
use std::sync::Arc;

use super::{ApiError, AppState, SummaryResponse, TenderResponse};
use crate::constants::limits::MAX_SEARCH_LENGTH;
use crate::models::tender::Urgency;
use crate::services::{TenderFilter, TenderStats};

/// `POST /api/tenders`
///
/// Returns the full scrape result annotated with `cached`, `cacheAge`,
/// `stale` and `error`. Responds 500 with an empty list only when the
/// upstream fails before anything was ever cached.
pub async fn get_tenders(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TenderResponse>, ApiError> {
    let result = state.tenders().get_tenders().await?;
    let results = result.payload.results.clone();

    Ok(Json(TenderResponse::from_result(&result, results)))
}

/// `GET /api/tenders?search=&status=`
pub async fn list_tenders(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<TenderFilter>,
) -> Result<Json<TenderResponse>, ApiError> {
    validate_filter(&filter)?;

    let result = state.tenders().get_tenders().await?;
    let results = filter
        .apply(&result.payload.results)
        .cloned()
        .collect::<Vec<_>>();

    Ok(Json(TenderResponse::from_result(&result, results)))
}

/// `GET /api/tenders/summary?search=&status=`
pub async fn get_summary(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<TenderFilter>,
) -> Result<Json<SummaryResponse>, ApiError> {
    validate_filter(&filter)?;

    let result = state.tenders().get_tenders().await?;
    let tenders = &result.payload.results;

    Ok(Json(SummaryResponse {
        stats: TenderStats::compute(tenders, &filter),
        closing_soon: tenders
            .iter()
            .filter(|t| t.urgency() == Urgency::ClosingSoon)
            .count(),
        cached: result.is_cached(),
        stale: result.is_stale(),
        cache_age: result.cache_age_secs(),
        fetched_at: result.fetched_at.to_rfc3339(),
    }))
}

fn validate_filter(filter: &TenderFilter) -> Result<(), ApiError> {
    if filter
        .search
        .as_ref()
        .is_some_and(|s| s.chars().count() > MAX_SEARCH_LENGTH)
    {
        return Err(ApiError::validation(format!(
            "search must be at most {MAX_SEARCH_LENGTH} characters"
        )));
    }

    Ok(())
}
