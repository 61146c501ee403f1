//! One-shot fetch command handler

use crate::clients::UpstreamError;
use crate::config::Config;
use crate::models::tender::{Tender, Urgency};
use crate::services::{TenderError, TenderFilter, TenderOutcome, TenderStats};
use crate::state::SharedState;

pub async fn cmd_fetch(config: Config, filter: &TenderFilter, json: bool) -> anyhow::Result<()> {
    let state = SharedState::new(config)?;

    let result = match state.tenders.get_tenders().await {
        Ok(result) => result,
        Err(err) => {
            println!("{}", failure_message(&err));
            return Err(err.into());
        }
    };

    let tenders: Vec<_> = filter.apply(&result.payload.results).collect();

    if json {
        println!("{}", render_json(&tenders)?);
        return Ok(());
    }

    if let TenderOutcome::Stale { error, .. } = &result.outcome {
        println!(
            "⚠ Showing cached data: {}",
            error.as_deref().unwrap_or("scraper is rate limiting")
        );
    }

    let stats = TenderStats::compute(&result.payload.results, filter);

    if tenders.is_empty() {
        println!("No tenders found.");
        println!();
        println!("Try adjusting your search or filter criteria.");
        return Ok(());
    }

    println!(
        "Tenders ({} total, {} active, {} matching)",
        stats.total, stats.active, stats.matching
    );
    println!("{:-<70}", "");

    for tender in tenders {
        let indicator = match tender.urgency() {
            Urgency::Sealed => "🔒",
            Urgency::ClosingSoon => "⏳",
            Urgency::Open => "🟢",
        };

        println!("{} #{} {}", indicator, tender.number(), tender.title());
        println!(
            "  Status: {} | Time left: {} | Closes: {}",
            tender.status(),
            tender.time_left(),
            tender.close_date()
        );
        println!(
            "  Contact: {} | Responses: All {} / Company {}",
            tender.contact(),
            tender.all_responses(),
            tender.company_responses()
        );
        println!("  {}", tender.url());
    }

    println!();
    println!("Legend: 🟢 Open | ⏳ Closing soon | 🔒 Sealed");

    Ok(())
}

/// The matching records exactly as the scraper returned them.
fn render_json(tenders: &[&Tender]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(tenders)
}

/// Message shown to a person when no tenders could be loaded at all.
#[must_use]
pub fn failure_message(err: &TenderError) -> &'static str {
    let TenderError::NoCache(upstream) = err;

    match upstream.as_ref() {
        UpstreamError::RateLimited => {
            "The tender service is rate limiting requests. Please wait a few minutes and try again."
        }
        _ => "Failed to load tenders. Please check your connection and try again.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use std::sync::Arc;

    #[test]
    fn test_json_output_is_record_array() {
        let sealed = Tender::from(json!({"number": "T-2", "status": "sealed", "all_responses": 9}));
        let open = Tender::from(json!({"number": "T-1", "status": "open", "contact": null}));
        let filter = TenderFilter::new(None, Some("open".to_string()));
        let all = [sealed, open];
        let matching: Vec<_> = filter.apply(&all).collect();

        let output: Value = serde_json::from_str(&render_json(&matching).unwrap()).unwrap();
        assert_eq!(output, json!([{"number": "T-1", "status": "open", "contact": null}]));
    }

    #[test]
    fn test_failure_message() {
        let limited = TenderError::NoCache(Arc::new(UpstreamError::RateLimited));
        assert!(failure_message(&limited).contains("rate limiting"));

        let offline = TenderError::NoCache(Arc::new(UpstreamError::Network(
            "connection refused".to_string(),
        )));
        assert!(failure_message(&offline).contains("check your connection"));
    }
}
