use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{Result, ScienceError};
use crate::http::{RateLimitedClient, USER_AGENT};
use crate::sources::{CodeLinkQuery, CodeLinkSource};

#[derive(Debug, Deserialize)]
struct PaperResponse {
    #[serde(default)]
    official: Option<OfficialRepo>,
}

#[derive(Debug, Deserialize)]
struct OfficialRepo {
    #[serde(default)]
    url: Option<String>,
}

/// Per-paper lookup of the official repository, keyed by canonical arXiv id.
pub struct PapersWithCodeSource {
    client: RateLimitedClient,
    base_url: String,
}

impl PapersWithCodeSource {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: RateLimitedClient::new(Duration::ZERO, USER_AGENT),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn paper_url(&self, canonical_id: &str) -> String {
        format!("{}/{}", self.base_url, canonical_id)
    }
}

#[async_trait]
impl CodeLinkSource for PapersWithCodeSource {
    fn name(&self) -> &str {
        "paperswithcode"
    }

    async fn lookup(&self, query: &CodeLinkQuery) -> Result<Option<String>> {
        let url = self.paper_url(&query.canonical_id);
        let body = match self.client.get(&url).await {
            Ok(body) => body,
            // Unknown papers are a plain "no link", not a failure to retry.
            Err(ScienceError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };
        official_url(&body)
    }
}

fn official_url(body: &str) -> Result<Option<String>> {
    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(None);
    }
    let resp: PaperResponse =
        serde_json::from_str(trimmed).map_err(|e| ScienceError::Parse(e.to_string()))?;
    Ok(resp
        .official
        .and_then(|o| o.url)
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty()))
}
