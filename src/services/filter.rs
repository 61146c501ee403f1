use serde::{Deserialize, Serialize};

use crate::models::tender::Tender;

/// Free-text search plus status selection over a tender list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TenderFilter {
    #[serde(default)]
    pub search: Option<String>,

    /// `"all"` or absent matches every status.
    #[serde(default)]
    pub status: Option<String>,
}

impl TenderFilter {
    #[must_use]
    pub fn new(search: Option<String>, status: Option<String>) -> Self {
        Self { search, status }
    }

    /// Case-insensitive substring match on title, number or contact.
    #[must_use]
    pub fn matches(&self, tender: &Tender) -> bool {
        self.matches_search(tender) && self.matches_status(tender)
    }

    fn matches_search(&self, tender: &Tender) -> bool {
        let Some(needle) = self.search.as_deref().map(str::trim) else {
            return true;
        };
        if needle.is_empty() {
            return true;
        }

        let needle = needle.to_lowercase();
        [tender.title(), tender.number(), tender.contact()]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }

    fn matches_status(&self, tender: &Tender) -> bool {
        match self.status.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(status) if status.eq_ignore_ascii_case("all") => true,
            Some(status) => tender.status().trim().to_lowercase() == status.to_lowercase(),
        }
    }

    pub fn apply<'a>(&'a self, tenders: &'a [Tender]) -> impl Iterator<Item = &'a Tender> + 'a {
        tenders.iter().filter(move |t| self.matches(t))
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct TenderStats {
    pub total: usize,

    /// Listings that are not sealed.
    pub active: usize,

    pub matching: usize,
}

impl TenderStats {
    #[must_use]
    pub fn compute(tenders: &[Tender], filter: &TenderFilter) -> Self {
        Self {
            total: tenders.len(),
            active: tenders.iter().filter(|t| !t.is_sealed()).count(),
            matching: filter.apply(tenders).count(),
        }
    }
}
