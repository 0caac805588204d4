use std::sync::Arc;

use async_trait::async_trait;
use paperwatch_core::AppConfig;
use tracing::{debug, info};

use crate::retry::RetryPolicy;
use crate::sources::github::{GithubSearchSource, SearchKey};
use crate::sources::paperswithcode::PapersWithCodeSource;
use crate::sources::{CodeLinkQuery, CodeLinkResolver, CodeLinkSource};

/// Primary registry lookup plus opt-in search fallbacks, all behind the same
/// retry policy. Exhaustion of any source counts as "no link".
pub struct CodeLinkService {
    primary: Arc<dyn CodeLinkSource>,
    fallbacks: Vec<Arc<dyn CodeLinkSource>>,
    policy: RetryPolicy,
}

impl CodeLinkService {
    pub fn new(primary: Arc<dyn CodeLinkSource>, policy: RetryPolicy) -> Self {
        Self {
            primary,
            fallbacks: Vec::new(),
            policy,
        }
    }

    /// Add a source tried, in insertion order, only when everything before it
    /// came back empty.
    pub fn with_fallback(mut self, source: Arc<dyn CodeLinkSource>) -> Self {
        self.fallbacks.push(source);
        self
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let links = &config.code_links;
        let policy = RetryPolicy::from(config.retry.code_link);
        let mut service = Self::new(
            Arc::new(PapersWithCodeSource::with_base_url(links.base_url.clone())),
            policy,
        );
        if links.search_fallback {
            let token = GithubSearchSource::token_from_env(&links.github_token_env);
            for key in [SearchKey::Title, SearchKey::CanonicalId] {
                service = service.with_fallback(Arc::new(GithubSearchSource::with_params(
                    links.github_search_url.clone(),
                    token.clone(),
                    key,
                )));
            }
        }
        service
    }

    async fn try_source(&self, source: &dyn CodeLinkSource, query: &CodeLinkQuery) -> Option<String> {
        let label = format!("code link via {} for {}", source.name(), query.canonical_id);
        self.policy
            .run_or_else(&label, |_| source.lookup(query), |_| None)
            .await
    }
}

#[async_trait]
impl CodeLinkResolver for CodeLinkService {
    async fn resolve(&self, query: &CodeLinkQuery) -> Option<String> {
        if let Some(url) = self.try_source(self.primary.as_ref(), query).await {
            return Some(url);
        }
        for source in &self.fallbacks {
            debug!("{}: trying {}", query.canonical_id, source.name());
            if let Some(url) = self.try_source(source.as_ref(), query).await {
                info!("{}: code link found via {}", query.canonical_id, source.name());
                return Some(url);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result, ScienceError};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::{Duration, Instant};

    const BASE: Duration = Duration::from_millis(10);

    struct Scripted {
        name: &'static str,
        answer: Option<&'static str>,
        fail: bool,
        calls: AtomicU32,
    }

    impl Scripted {
        fn new(name: &'static str, answer: Option<&'static str>, fail: bool) -> Arc<Self> {
            Arc::new(Self {
                name,
                answer,
                fail,
                calls: AtomicU32::new(0),
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CodeLinkSource for Scripted {
        fn name(&self) -> &str {
            self.name
        }

        async fn lookup(&self, _query: &CodeLinkQuery) -> Result<Option<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ScienceError::SourceUnavailable(self.name.into()));
            }
            Ok(self.answer.map(str::to_string))
        }
    }

    fn query() -> CodeLinkQuery {
        CodeLinkQuery::new("2401.00001", "A Paper")
    }

    #[tokio::test]
    async fn primary_hit_skips_fallbacks() {
        let primary = Scripted::new("pwc", Some("https://github.com/a/b"), false);
        let search = Scripted::new("search", Some("https://github.com/x/y"), false);
        let service = CodeLinkService::new(primary.clone(), RetryPolicy::new(3, BASE))
            .with_fallback(search.clone());

        assert_eq!(
            service.resolve(&query()).await.as_deref(),
            Some("https://github.com/a/b")
        );
        assert_eq!(search.calls(), 0);
    }

    #[tokio::test]
    async fn exhaustion_degrades_to_none() {
        let primary = Scripted::new("pwc", None, true);
        let service = CodeLinkService::new(primary.clone(), RetryPolicy::new(3, BASE));

        let start = Instant::now();
        assert_eq!(service.resolve(&query()).await, None);
        assert_eq!(primary.calls(), 3);
        assert!(start.elapsed() >= BASE + BASE * 2);
    }

    #[tokio::test]
    async fn fallbacks_are_tried_in_order_when_primary_is_empty() {
        let primary = Scripted::new("pwc", None, false);
        let by_title = Scripted::new("title", None, false);
        let by_id = Scripted::new("id", Some("https://github.com/by/id"), false);
        let service = CodeLinkService::new(primary.clone(), RetryPolicy::new(3, BASE))
            .with_fallback(by_title.clone())
            .with_fallback(by_id.clone());

        assert_eq!(
            service.resolve(&query()).await.as_deref(),
            Some("https://github.com/by/id")
        );
        assert_eq!((primary.calls(), by_title.calls(), by_id.calls()), (1, 1, 1));
    }

    #[tokio::test]
    async fn no_fallback_unless_configured() {
        let mut config = AppConfig::default();
        config.code_links.search_fallback = false;
        assert!(CodeLinkService::from_config(&config).fallbacks.is_empty());

        config.code_links.search_fallback = true;
        assert_eq!(CodeLinkService::from_config(&config).fallbacks.len(), 2);
    }
}
