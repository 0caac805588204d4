use serde::{Deserialize, Serialize};

use crate::identifiers::arxiv::ArxivId;

/// One harvested paper, as delivered by the arXiv export API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArxivMetadata {
    pub arxiv_id: ArxivId,
    pub title: String,
    pub authors: Vec<ArxivAuthor>,
    pub abstract_text: String,
    pub published: chrono::DateTime<chrono::Utc>,
    pub updated: chrono::DateTime<chrono::Utc>,
    pub primary_category: String,
    pub comment: Option<String>,
}

impl ArxivMetadata {
    pub fn author_names(&self) -> Vec<String> {
        self.authors.iter().map(|a| a.name.clone()).collect()
    }

    pub fn first_author(&self) -> Option<&str> {
        self.authors.first().map(|a| a.name.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArxivAuthor {
    pub name: String,
    pub affiliation: Option<String>,
}

const SORT_BY: &str = "submittedDate";
const SORT_ORDER: &str = "descending";

/// A `search_query` request, newest submissions first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArxivSearchQuery {
    /// Unencoded query, e.g. `abs:("Radiance Fields") OR NeRF`.
    pub search_query: String,
    pub start: u32,
    pub max_results: u32,
}

impl ArxivSearchQuery {
    pub fn new(search_query: impl Into<String>, max_results: u32) -> Self {
        Self {
            search_query: search_query.into(),
            start: 0,
            max_results,
        }
    }

    /// Query-string pairs; encoding is done by the HTTP client.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("search_query", self.search_query.clone()),
            ("start", self.start.to_string()),
            ("max_results", self.max_results.to_string()),
            ("sortBy", SORT_BY.to_string()),
            ("sortOrder", SORT_ORDER.to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_params() {
        let query = ArxivSearchQuery::new("abs:(\"Radiance Fields\")", 20);
        assert_eq!(
            query.to_params(),
            vec![
                ("search_query", "abs:(\"Radiance Fields\")".to_string()),
                ("start", "0".to_string()),
                ("max_results", "20".to_string()),
                ("sortBy", "submittedDate".to_string()),
                ("sortOrder", "descending".to_string()),
            ]
        );
    }
}
