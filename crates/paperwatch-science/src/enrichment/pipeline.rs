use std::sync::Arc;

use paperwatch_core::{AppConfig, PaperRecord, TopicBucket};
use tracing::{debug, info, warn};

use crate::arxiv::types::ArxivMetadata;
use crate::error::{Result, ScienceError};
use crate::identifiers::ArxivId;
use crate::retry::RetryPolicy;
use crate::sources::{CodeLinkQuery, CodeLinkResolver, CodeLinkService};
use crate::translate::{GeminiTranslator, TranslationService};

/// A harvested paper that could not be turned into a record this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentFailure {
    pub canonical_id: String,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct EnrichmentOutcome {
    /// Finished records, in harvest order.
    pub records: Vec<PaperRecord>,
    pub failures: Vec<EnrichmentFailure>,
}

/// Turns harvested metadata into [`PaperRecord`]s, one paper at a time.
pub struct EnrichmentPipeline {
    resolver: Arc<dyn CodeLinkResolver>,
    translator: Option<TranslationService>,
}

impl EnrichmentPipeline {
    pub fn new(resolver: Arc<dyn CodeLinkResolver>) -> Self {
        Self {
            resolver,
            translator: None,
        }
    }

    pub fn with_translator(mut self, translator: TranslationService) -> Self {
        self.translator = Some(translator);
        self
    }

    /// Build the resolver and, when enabled and a key is available, the
    /// translator from config.
    pub fn from_config(config: &AppConfig, api_key: Option<&str>) -> Self {
        let pipeline = Self::new(Arc::new(CodeLinkService::from_config(config)));

        let tr = &config.translation;
        if !tr.enabled {
            return pipeline;
        }
        match tr.resolve_api_key(api_key) {
            Some(key) => {
                let translator = GeminiTranslator::with_params(
                    &tr.base_url,
                    key,
                    tr.model.clone(),
                    std::time::Duration::ZERO,
                )
                .with_target_language(tr.target_language.clone())
                .with_temperature(tr.temperature);
                pipeline.with_translator(TranslationService::new(
                    Arc::new(translator),
                    RetryPolicy::from(config.retry.translation),
                ))
            }
            None => {
                warn!(
                    "translation enabled but no API key (flag, config or ${}); abstracts stay untranslated",
                    tr.api_key_env
                );
                pipeline
            }
        }
    }

    pub fn translates(&self) -> bool {
        self.translator.is_some()
    }

    /// Enrich one topic's harvest. `prior` is the topic's bucket from the
    /// store, used to avoid translating an abstract twice.
    pub async fn enrich_topic(
        &self,
        topic: &str,
        papers: &[ArxivMetadata],
        prior: Option<&TopicBucket>,
    ) -> EnrichmentOutcome {
        let mut outcome = EnrichmentOutcome::default();

        for paper in papers {
            let canonical_id = ArxivId::new(&paper.arxiv_id.raw).id;
            match self.enrich_paper(paper, prior).await {
                Ok(record) => outcome.records.push(record),
                Err(e) => {
                    warn!("{topic}: skipping {canonical_id}: {e}");
                    outcome.failures.push(EnrichmentFailure {
                        canonical_id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            "{topic}: {} papers enriched, {} skipped",
            outcome.records.len(),
            outcome.failures.len()
        );
        outcome
    }

    async fn enrich_paper(
        &self,
        paper: &ArxivMetadata,
        prior: Option<&TopicBucket>,
    ) -> Result<PaperRecord> {
        let canonical_id = ArxivId::new(&paper.arxiv_id.raw).id;
        let title = flatten(&paper.title);
        let source = flatten(&paper.abstract_text);

        if canonical_id.is_empty() {
            return Err(ScienceError::Assembly(paper.arxiv_id.raw.clone(), "empty identifier".into()));
        }
        if title.is_empty() {
            return Err(ScienceError::Assembly(canonical_id, "empty title".into()));
        }

        let previous = prior.and_then(|bucket| bucket.get(&canonical_id));
        let (abstract_text, translated) = match (previous, &self.translator) {
            (Some(prev), _) if prev.translated => {
                debug!("{canonical_id}: reusing translated abstract");
                (prev.abstract_text.clone(), true)
            }
            (_, Some(service)) if !source.is_empty() => {
                let translation = service.translate(&source).await;
                (translation.text, translation.translated)
            }
            _ => (source, false),
        };

        let code_url = self
            .resolver
            .resolve(&CodeLinkQuery::new(canonical_id.clone(), title.clone()))
            .await;

        let mut record = PaperRecord::new(
            canonical_id,
            title,
            paper.published.date_naive(),
            paper.updated.date_naive(),
        );
        record.code_url = code_url;
        record.abstract_text = abstract_text;
        record.translated = translated;
        record.authors = paper.author_names();
        record.primary_category = Some(paper.primary_category.clone()).filter(|c| !c.is_empty());
        record.comment = paper.comment.clone();
        Ok(record)
    }
}

fn flatten(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
