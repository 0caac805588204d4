//! Where "official code" links come from.

pub mod code_links;
pub mod github;
pub mod paperswithcode;

pub use code_links::CodeLinkService;
pub use github::GithubSearchSource;
pub use paperswithcode::PapersWithCodeSource;

use async_trait::async_trait;

use crate::error::Result;

/// What a code-link lookup knows about the paper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeLinkQuery {
    pub canonical_id: String,
    pub title: String,
}

impl CodeLinkQuery {
    pub fn new(canonical_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            canonical_id: canonical_id.into(),
            title: title.into(),
        }
    }
}

/// One remote lookup, one attempt. `Ok(None)` means the source answered and
/// has no link for this paper.
#[async_trait]
pub trait CodeLinkSource: Send + Sync {
    fn name(&self) -> &str;

    async fn lookup(&self, query: &CodeLinkQuery) -> Result<Option<String>>;
}

/// Resolves a code link with retries and fallbacks applied. Never fails.
#[async_trait]
pub trait CodeLinkResolver: Send + Sync {
    async fn resolve(&self, query: &CodeLinkQuery) -> Option<String>;
}
