use paperwatch_core::TopicConfig;
use tracing::info;

use crate::arxiv::client::PaperSource;
use crate::arxiv::types::{ArxivMetadata, ArxivSearchQuery};
use crate::error::Result;

/// Fetch the newest submissions for one topic, capped at `max_results`.
///
/// A failure is returned to the caller, which decides whether to move on to
/// the next topic.
pub async fn harvest_topic(
    source: &dyn PaperSource,
    topic: &TopicConfig,
    max_results: u32,
) -> Result<Vec<ArxivMetadata>> {
    let query = ArxivSearchQuery::new(topic.search_query(), max_results);
    info!("topic: {}, query: {}", topic.name, query.search_query);

    let mut papers = source.search(&query).await?;
    papers.truncate(max_results as usize);

    for paper in &papers {
        info!(
            "Time = {} title = {} author = {}",
            paper.updated.date_naive(),
            paper.title,
            paper.first_author().unwrap_or("unknown")
        );
    }
    Ok(papers)
}
