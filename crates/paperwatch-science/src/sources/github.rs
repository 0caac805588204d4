use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;

use crate::error::{Result, ScienceError};
use crate::http::{RateLimitedClient, USER_AGENT};
use crate::sources::{CodeLinkQuery, CodeLinkSource};

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    total_count: u64,
    #[serde(default)]
    items: Vec<Repository>,
}

#[derive(Debug, Deserialize)]
struct Repository {
    html_url: String,
}

/// Which part of the paper is used as the repository search text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKey {
    Title,
    CanonicalId,
}

/// Repository search ordered by stars. The most-starred hit wins.
pub struct GithubSearchSource {
    client: RateLimitedClient,
    search_url: String,
    token: Option<String>,
    key: SearchKey,
}

impl GithubSearchSource {
    pub fn with_params(search_url: impl Into<String>, token: Option<String>, key: SearchKey) -> Self {
        Self {
            client: RateLimitedClient::new(Duration::ZERO, USER_AGENT),
            search_url: search_url.into(),
            token: token.filter(|t| !t.trim().is_empty()),
            key,
        }
    }

    /// Token read from the named environment variable, if set.
    pub fn token_from_env(var: &str) -> Option<String> {
        std::env::var(var).ok().filter(|t| !t.trim().is_empty())
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        if let Some(token) = &self.token
            && let Ok(value) = HeaderValue::from_str(&format!("Bearer {token}"))
        {
            headers.insert(AUTHORIZATION, value);
        }
        headers
    }
}

#[async_trait]
impl CodeLinkSource for GithubSearchSource {
    fn name(&self) -> &str {
        match self.key {
            SearchKey::Title => "github search (title)",
            SearchKey::CanonicalId => "github search (id)",
        }
    }

    async fn lookup(&self, query: &CodeLinkQuery) -> Result<Option<String>> {
        let text = match self.key {
            SearchKey::Title => query.title.trim(),
            SearchKey::CanonicalId => query.canonical_id.trim(),
        };
        if text.is_empty() {
            return Ok(None);
        }
        let params = [("q", text), ("sort", "stars"), ("order", "desc")];
        let body = self
            .client
            .get_with_query(&self.search_url, &params, self.headers())
            .await?;
        let resp: SearchResponse =
            serde_json::from_str(&body).map_err(|e| ScienceError::Parse(e.to_string()))?;

        if resp.total_count == 0 {
            return Ok(None);
        }
        Ok(resp.items.into_iter().next().map(|r| r.html_url))
    }
}
