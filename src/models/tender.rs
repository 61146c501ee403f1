use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::sync::OnceLock;

use crate::constants::limits::CLOSING_SOON_DAYS;

/// A single procurement listing as returned by the scraper.
///
/// The record is held exactly as received so it passes through the proxy
/// unchanged. Accessors give a display view: strings are returned as-is,
/// numbers and booleans are rendered, and missing or `null` fields read as
/// empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tender(Value);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Sealed,
    ClosingSoon,
    Open,
}

impl From<Value> for Tender {
    fn from(record: Value) -> Self {
        Self(record)
    }
}

impl Tender {
    #[must_use]
    pub const fn as_value(&self) -> &Value {
        &self.0
    }

    /// Display text of `key`, or `None` when it is missing, `null` or not
    /// a scalar.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<Cow<'_, str>> {
        match self.0.get(key)? {
            Value::String(s) => Some(Cow::Borrowed(s)),
            Value::Number(n) => Some(Cow::Owned(n.to_string())),
            Value::Bool(b) => Some(Cow::Owned(b.to_string())),
            _ => None,
        }
    }

    fn text(&self, key: &str) -> Cow<'_, str> {
        self.field(key).unwrap_or(Cow::Borrowed(""))
    }

    #[must_use]
    pub fn number(&self) -> Cow<'_, str> {
        self.text("number")
    }

    #[must_use]
    pub fn title(&self) -> Cow<'_, str> {
        self.text("title")
    }

    #[must_use]
    pub fn contact(&self) -> Cow<'_, str> {
        self.text("contact")
    }

    #[must_use]
    pub fn status(&self) -> Cow<'_, str> {
        self.text("status")
    }

    #[must_use]
    pub fn time_left(&self) -> Cow<'_, str> {
        self.text("time_left")
    }

    #[must_use]
    pub fn close_date(&self) -> Cow<'_, str> {
        self.text("close_date")
    }

    #[must_use]
    pub fn all_responses(&self) -> Cow<'_, str> {
        self.text("all_responses")
    }

    #[must_use]
    pub fn company_responses(&self) -> Cow<'_, str> {
        self.text("company_responses")
    }

    #[must_use]
    pub fn url(&self) -> Cow<'_, str> {
        self.text("url")
    }

    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.status().eq_ignore_ascii_case("sealed")
    }

    /// Days remaining parsed from strings like `"3 days 4 hours"`.
    #[must_use]
    pub fn days_left(&self) -> Option<u32> {
        static RE: OnceLock<Regex> = OnceLock::new();
        let re = RE.get_or_init(|| Regex::new(r"(?i)(\d+)\s*days?").expect("Invalid regex"));

        let time_left = self.time_left();
        re.captures(&time_left)?.get(1)?.as_str().parse().ok()
    }

    #[must_use]
    pub fn urgency(&self) -> Urgency {
        if self.is_sealed() {
            return Urgency::Sealed;
        }

        match self.days_left() {
            Some(days) if days <= CLOSING_SOON_DAYS => Urgency::ClosingSoon,
            _ => Urgency::Open,
        }
    }
}

/// Upstream response body. Only `results` is interpreted; any other
/// top-level fields are forwarded as-is.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TenderPayload {
    pub results: Vec<Tender>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TenderPayload {
    #[must_use]
    pub fn new(results: Vec<Tender>) -> Self {
        Self {
            results,
            extra: Map::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Request body for `POST /scrape`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TenderQuery {
    pub keywords: Vec<String>,
    pub max_results: u32,
    pub strict_mode: bool,
    pub loose_phrases: bool,
}
