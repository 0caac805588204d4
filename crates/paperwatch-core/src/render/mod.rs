//! Markdown views over a [`Store`].

mod math;
mod rows;

pub use math::pretty_math;

use chrono::NaiveDate;

use crate::models::{Store, TopicBucket};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowLayout {
    /// Wide pipe table, one row per paper.
    Table,
    /// Compact bulleted list.
    List,
}

/// Toggles distinguishing the report flavours. Both go through [`render_markdown`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub front_matter: bool,
    /// Heading level of each topic section.
    pub section_level: usize,
    pub table_of_contents: bool,
    pub back_to_top: bool,
    pub layout: RowLayout,
    pub usage_link: Option<String>,
    /// Topics rendered first, in this order. Remaining topics follow by name.
    pub topic_order: Vec<String>,
}

impl RenderOptions {
    /// Repository README flavour.
    pub fn plain() -> Self {
        Self {
            front_matter: false,
            section_level: 2,
            table_of_contents: true,
            back_to_top: true,
            layout: RowLayout::Table,
            usage_link: None,
            topic_order: Vec::new(),
        }
    }

    /// GitHub Pages flavour.
    pub fn web() -> Self {
        Self {
            front_matter: true,
            section_level: 3,
            table_of_contents: false,
            back_to_top: false,
            layout: RowLayout::List,
            usage_link: None,
            topic_order: Vec::new(),
        }
    }

    pub fn with_usage_link(mut self, link: Option<String>) -> Self {
        self.usage_link = link;
        self
    }

    pub fn with_topic_order(mut self, order: Vec<String>) -> Self {
        self.topic_order = order;
        self
    }
}

/// Render the whole store. Output depends only on `store`, `opts` and `today`.
pub fn render_markdown(store: &Store, opts: &RenderOptions, today: NaiveDate) -> String {
    let stamp = today.format("%Y.%m.%d").to_string();
    let sections = ordered_sections(store, &opts.topic_order);
    let mut md = String::new();

    if opts.front_matter {
        md.push_str("---\nlayout: default\n---\n\n");
    }
    md.push_str(&format!("## Updated on {stamp}\n"));
    if let Some(link) = &opts.usage_link {
        md.push_str(&format!("> Usage instructions: [here]({link})\n"));
    }
    md.push('\n');

    if opts.table_of_contents {
        md.push_str("<details>\n  <summary>Table of Contents</summary>\n  <ol>\n");
        for (topic, _) in &sections {
            md.push_str(&format!("    <li><a href=#{}>{topic}</a></li>\n", anchor(topic)));
        }
        md.push_str("  </ol>\n</details>\n\n");
    }

    let hashes = "#".repeat(opts.section_level.max(1));
    for (topic, bucket) in &sections {
        md.push_str(&format!("{hashes} {topic}\n\n"));

        if opts.layout == RowLayout::Table {
            md.push_str(rows::TABLE_HEADER);
        }
        for record in bucket.newest_first() {
            match opts.layout {
                RowLayout::Table => md.push_str(&rows::table_row(record)),
                RowLayout::List => md.push_str(&rows::list_item(record)),
            }
        }
        md.push('\n');

        if opts.back_to_top {
            let top = anchor(&format!("Updated on {}", stamp.replace('.', "")));
            md.push_str(&format!("<p align=right>(<a href=#{top}>back to top</a>)</p>\n\n"));
        }
    }

    md
}

fn ordered_sections<'a>(store: &'a Store, order: &[String]) -> Vec<(&'a str, &'a TopicBucket)> {
    let mut sections: Vec<(&str, &TopicBucket)> = order
        .iter()
        .filter_map(|name| store.topics().find(|(topic, _)| topic == name))
        .collect();
    for (topic, bucket) in store.topics() {
        if !order.iter().any(|name| name == topic) {
            sections.push((topic, bucket));
        }
    }
    sections.retain(|(_, bucket)| !bucket.is_empty());
    sections
}

fn anchor(heading: &str) -> String {
    heading.replace(' ', "-").to_lowercase()
}
