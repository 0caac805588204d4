//! paperwatch science: arXiv harvesting, code-link resolution, abstract
//! translation and the enrichment/merge pipeline.

pub mod arxiv;
pub mod enrichment;
pub mod error;
pub mod http;
pub mod identifiers;
pub mod retry;
pub mod sources;
pub mod translate;

pub use arxiv::{ArxivClient, ArxivMetadata, PaperSource, harvest_topic};
pub use enrichment::{
    EnrichmentOutcome, EnrichmentPipeline, MergeReport, RepairReport, merge_harvest, repair_links,
};
pub use error::{Result, ScienceError};
pub use identifiers::{ArxivId, canonical_id};
pub use retry::{RetryExhausted, RetryPolicy};
pub use sources::{CodeLinkQuery, CodeLinkResolver, CodeLinkService};
pub use translate::{Translation, TranslationService, Translator};
