use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::RequestBuilder;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::warn;

use crate::error::{Result, ScienceError};

pub const USER_AGENT: &str = concat!("paperwatch/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

// ─── RateLimitedClient ────────────────────────────────────────────────────────

/// Spaces requests at least `min_interval` apart and makes exactly one attempt
/// per call. Retrying is left to [`crate::retry::RetryPolicy`].
#[derive(Clone)]
pub struct RateLimitedClient {
    client: reqwest::Client,
    min_interval: Duration,
    last_request: Arc<Mutex<Option<Instant>>>,
}

impl RateLimitedClient {
    /// Like [`try_new`](Self::try_new), but a builder failure is logged and
    /// replaced by a client with the crate's user agent and timeout.
    pub fn new(min_interval: Duration, user_agent: &str) -> Self {
        Self::try_new(min_interval, user_agent).unwrap_or_else(|e| {
            warn!("cannot build HTTP client with user agent {user_agent:?}: {e}, using defaults");
            let client = reqwest::Client::builder()
                .user_agent(USER_AGENT)
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default();
            Self::with_client(client, min_interval)
        })
    }

    pub fn try_new(min_interval: Duration, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .gzip(true)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self::with_client(client, min_interval))
    }

    fn with_client(client: reqwest::Client, min_interval: Duration) -> Self {
        Self {
            client,
            min_interval,
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    async fn wait_for_rate_limit(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(t) = *last {
            let elapsed = t.elapsed();
            if elapsed < self.min_interval {
                sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    pub async fn get(&self, url: &str) -> Result<String> {
        self.get_with_query(url, &[], HeaderMap::new()).await
    }

    pub async fn get_with_query(
        &self,
        url: &str,
        query: &[(&str, &str)],
        headers: HeaderMap,
    ) -> Result<String> {
        let request = self.client.get(url).query(query).headers(headers);
        self.send(url, request).await
    }

    pub async fn post_json<B: Serialize, R: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<R> {
        let request = self.client.post(url).json(body);
        let text = self.send(url, request).await?;
        serde_json::from_str(&text).map_err(|e| ScienceError::Parse(e.to_string()))
    }

    async fn send(&self, url: &str, request: RequestBuilder) -> Result<String> {
        self.wait_for_rate_limit().await;
        let resp = request
            .send()
            .await
            .map_err(|e| ScienceError::Http(e.without_url()))?;
        let status = resp.status();

        if status.as_u16() == 429 {
            let wait = resp
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(ScienceError::RateLimit(host_of(url), wait));
        }
        if status.as_u16() == 404 {
            return Err(ScienceError::NotFound(host_of(url)));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ScienceError::ApiError(
                host_of(url),
                format!("HTTP {}: {}", status.as_u16(), truncate(&body, 200)),
            ));
        }
        resp.text()
            .await
            .map_err(|e| ScienceError::Http(e.without_url()))
    }
}

/// Host part of a URL for error messages, so query-string secrets stay out of logs.
fn host_of(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| "unknown host".to_string())
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[tokio::test]
    async fn non_success_status_is_api_error() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/missing")
            .with_status(503)
            .with_body("down")
            .create_async()
            .await;

        let client = RateLimitedClient::new(Duration::ZERO, USER_AGENT);
        let err = client
            .get(&format!("{}/missing", server.url()))
            .await
            .unwrap_err();
        assert!(matches!(err, ScienceError::ApiError(_, ref msg) if msg.contains("503")));
    }

    #[tokio::test]
    async fn too_many_requests_is_rate_limit() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/busy")
            .with_status(429)
            .with_header("retry-after", "7")
            .create_async()
            .await;

        let client = RateLimitedClient::new(Duration::ZERO, USER_AGENT);
        let err = client.get(&format!("{}/busy", server.url())).await.unwrap_err();
        assert!(matches!(err, ScienceError::RateLimit(_, 7)));
    }

    #[test]
    fn invalid_user_agent_is_a_build_error() {
        let err = RateLimitedClient::try_new(Duration::ZERO, "bad\nagent").err();
        assert!(matches!(err, Some(ScienceError::Http(_))));
    }

    #[tokio::test]
    async fn invalid_user_agent_falls_back_to_default_agent() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/ua")
            .match_header("user-agent", USER_AGENT)
            .with_status(200)
            .with_body("ok")
            .create_async()
            .await;

        let client = RateLimitedClient::new(Duration::ZERO, "bad\nagent");
        assert_eq!(client.get(&format!("{}/ua", server.url())).await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn requests_are_spaced() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/ok")
            .with_status(200)
            .with_body("fine")
            .expect(2)
            .create_async()
            .await;

        let client = RateLimitedClient::new(Duration::from_millis(50), USER_AGENT);
        let url = format!("{}/ok", server.url());
        let start = Instant::now();
        assert_eq!(client.get(&url).await.unwrap(), "fine");
        assert_eq!(client.get(&url).await.unwrap(), "fine");
        assert!(start.elapsed() >= Duration::from_millis(50));
    }
}
