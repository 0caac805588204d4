pub mod merge;
pub mod pipeline;

pub use merge::{MergeReport, RepairReport, merge_harvest, repair_links};
pub use pipeline::{EnrichmentFailure, EnrichmentOutcome, EnrichmentPipeline};
