use chrono::{DateTime, Utc};
use quick_xml::de::from_str;
use serde::Deserialize;
use tracing::warn;

use crate::arxiv::types::{ArxivAuthor, ArxivMetadata};
use crate::error::{Result, ScienceError};
use crate::identifiers::arxiv::ArxivId;

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    id: String,
    title: String,
    summary: String,
    published: String,
    updated: String,
    #[serde(rename = "author", default)]
    authors: Vec<AtomAuthor>,
    #[serde(rename = "category", default)]
    categories: Vec<AtomCategory>,
    #[serde(rename = "arxiv:primary_category", alias = "primary_category")]
    primary_category: Option<AtomCategory>,
    #[serde(rename = "arxiv:comment", alias = "comment")]
    comment: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomAuthor {
    name: String,
    #[serde(rename = "arxiv:affiliation", alias = "affiliation")]
    affiliation: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomCategory {
    #[serde(rename = "@term")]
    term: Option<String>,
}

/// Parse a feed. A malformed feed is an error; a malformed entry is logged
/// and left out.
pub fn parse_atom_response(xml: &str) -> Result<Vec<ArxivMetadata>> {
    let feed: AtomFeed =
        from_str(xml).map_err(|e| ScienceError::Parse(format!("invalid atom xml: {e}")))?;

    let mut out = Vec::with_capacity(feed.entries.len());
    for entry in feed.entries {
        let entry_id = entry.id.trim().to_string();
        match parse_entry(entry) {
            Ok(metadata) => out.push(metadata),
            Err(e) => warn!("skipping feed entry {entry_id}: {e}"),
        }
    }
    Ok(out)
}

fn parse_entry(entry: AtomEntry) -> Result<ArxivMetadata> {
    let arxiv_id = ArxivId::new(&entry.id);
    if arxiv_id.id.is_empty() {
        return Err(ScienceError::Parse("entry without id".to_string()));
    }

    let title = clean_text(&entry.title);
    let abstract_text = clean_text(&entry.summary);

    let published = parse_rfc3339(&entry.published, "published")?;
    let updated = parse_rfc3339(&entry.updated, "updated")?;

    let authors = entry
        .authors
        .into_iter()
        .map(|author| ArxivAuthor {
            name: clean_text(&author.name),
            affiliation: clean_optional(author.affiliation),
        })
        .collect::<Vec<_>>();

    let categories = entry
        .categories
        .into_iter()
        .filter_map(|category| clean_optional(category.term))
        .collect::<Vec<_>>();

    let primary_category = entry
        .primary_category
        .and_then(|category| clean_optional(category.term))
        .or_else(|| categories.first().cloned())
        .unwrap_or_default();

    Ok(ArxivMetadata {
        arxiv_id,
        title,
        authors,
        abstract_text,
        published,
        updated,
        primary_category,
        comment: clean_optional(entry.comment),
    })
}

fn parse_rfc3339(value: &str, field_name: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ScienceError::Parse(format!("invalid {field_name} datetime: {e}")))
}

fn clean_text(input: &str) -> String {
    input
        .split_whitespace()
        .filter(|chunk| !chunk.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn clean_optional(value: Option<String>) -> Option<String> {
    value.map(|v| clean_text(&v)).filter(|v| !v.is_empty())
}
