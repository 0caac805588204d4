use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use tracing::debug;

use crate::arxiv::parser::parse_atom_response;
use crate::arxiv::types::{ArxivMetadata, ArxivSearchQuery};
use crate::error::Result;
use crate::http::{RateLimitedClient, USER_AGENT};

/// Anything that can answer an arXiv-style search.
#[async_trait]
pub trait PaperSource: Send + Sync {
    async fn search(&self, query: &ArxivSearchQuery) -> Result<Vec<ArxivMetadata>>;
}

pub struct ArxivClient {
    client: RateLimitedClient,
    base_url: String,
}

impl ArxivClient {
    pub fn with_params(base_url: &str, min_interval: Duration) -> Self {
        Self {
            client: RateLimitedClient::new(min_interval, USER_AGENT),
            base_url: base_url.to_string(),
        }
    }
}

#[async_trait]
impl PaperSource for ArxivClient {
    async fn search(&self, query: &ArxivSearchQuery) -> Result<Vec<ArxivMetadata>> {
        let params = query.to_params();
        let pairs: Vec<(&str, &str)> = params.iter().map(|(k, v)| (*k, v.as_str())).collect();
        debug!("arXiv query: {}", query.search_query);

        let xml = self
            .client
            .get_with_query(&self.base_url, &pairs, HeaderMap::new())
            .await?;
        parse_atom_response(&xml)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:arxiv="http://arxiv.org/schemas/atom">
  <entry>
    <id>http://arxiv.org/abs/2401.00002v2</id>
    <updated>2024-01-02T10:00:00Z</updated>
    <published>2024-01-01T09:00:00Z</published>
    <title>Newer Paper</title>
    <summary>Second
      abstract.</summary>
    <author><name>Ada Lovelace</name></author>
    <arxiv:primary_category term="cs.CV"/>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2401.00001v1</id>
    <updated>2024-01-01T08:00:00Z</updated>
    <published>2024-01-01T08:00:00Z</published>
    <title>Older Paper</title>
    <summary>First abstract.</summary>
    <author><name>Alan Turing</name></author>
  </entry>
</feed>"#;

    #[tokio::test]
    async fn test_arxiv_client_search() {
        let mut server = Server::new_async().await;

        let _m = server
            .mock("GET", "/query")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("search_query".into(), "SLAM OR \"visual odometry\"".into()),
                Matcher::UrlEncoded("max_results".into(), "2".into()),
                Matcher::UrlEncoded("sortBy".into(), "submittedDate".into()),
                Matcher::UrlEncoded("sortOrder".into(), "descending".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/atom+xml")
            .with_body(FEED)
            .create_async()
            .await;

        let client = ArxivClient::with_params(&format!("{}/query", server.url()), Duration::ZERO);
        let query = ArxivSearchQuery::new("SLAM OR \"visual odometry\"", 2);
        let results = client.search(&query).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].arxiv_id.id, "2401.00002");
        assert_eq!(results[0].arxiv_id.version, Some(2));
        assert_eq!(results[0].abstract_text, "Second abstract.");
        assert_eq!(results[0].first_author(), Some("Ada Lovelace"));
        assert_eq!(results[1].title, "Older Paper");
    }

    #[tokio::test]
    async fn test_arxiv_client_http_failure() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/query")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let client = ArxivClient::with_params(&format!("{}/query", server.url()), Duration::ZERO);
        let result = client.search(&ArxivSearchQuery::new("SLAM", 1)).await;
        assert!(result.is_err());
    }
}
