// SPDX-License-Identifier: Apache-2.0

use url::form_urlencoded;

use crate::notices::ErrorRecord;

/// Assets per gallery page. Also the divisor for page-count derivation.
pub const PAGE_SIZE: u64 = 18;

/// An outbound asset listing query for one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetQuery {
    /// Plain paginated listing.
    Browse { page: usize },
    /// Listing filtered by one term across categories, keywords and origin
    /// path, OR-combined.
    Search { page: usize, term: String },
}

impl AssetQuery {
    pub fn browse(page: usize) -> Self {
        AssetQuery::Browse { page }
    }

    pub fn search(page: usize, term: impl Into<String>) -> Self {
        AssetQuery::Search {
            page,
            term: term.into(),
        }
    }

    /// Search query for `term`, or a browse query when the term is empty.
    pub fn for_term(page: usize, term: &str) -> Self {
        if term.is_empty() {
            Self::browse(page)
        } else {
            Self::search(page, term)
        }
    }

    pub fn is_search(&self) -> bool {
        matches!(self, AssetQuery::Search { .. })
    }

    /// The query string, including the leading `?`. The term is
    /// form-urlencoded so `#`, `&` and `=` stay inside the filter values.
    pub fn query_string(&self) -> String {
        match self {
            AssetQuery::Browse { page } => {
                format!("?page[number]={page}&page[size]={PAGE_SIZE}")
            }
            AssetQuery::Search { page, term } => {
                let term = encode_term(term);
                format!(
                    "?filter[or:categories]={term}&filter[or:keywords]={term}&filter[or:origin_path]={term}&page[number]={page}&page[size]={PAGE_SIZE}"
                )
            }
        }
    }

    /// Resource path relative to the API base, e.g. `assets/src1?page[number]=0&page[size]=18`.
    pub fn resource_path(&self, source_id: &str) -> String {
        format!("assets/{}{}", source_id, self.query_string())
    }

    /// Record to queue when this query yields no readable record count.
    pub fn fallback_error(&self) -> ErrorRecord {
        match self {
            AssetQuery::Browse { .. } => ErrorRecord::no_origin_images(),
            AssetQuery::Search { .. } => ErrorRecord::no_search_results(),
        }
    }
}

fn encode_term(term: &str) -> String {
    form_urlencoded::byte_serialize(term.as_bytes()).collect()
}
