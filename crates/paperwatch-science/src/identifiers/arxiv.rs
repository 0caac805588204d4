use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

// Trailing version marker: 2108.09112v2, hep-th/9901001v3
static VERSION_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(.+?)v(\d+)$").expect("valid regex"));

const PREFIXES: &[&str] = &[
    "https://arxiv.org/abs/",
    "http://arxiv.org/abs/",
    "https://export.arxiv.org/abs/",
    "http://export.arxiv.org/abs/",
    "https://arxiv.org/pdf/",
    "http://arxiv.org/pdf/",
    "arXiv:",
    "arxiv:",
];

/// An arXiv identifier split into its version-stripped key and version.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArxivId {
    pub raw: String,
    /// Canonical key: prefixes and version suffix removed.
    pub id: String,
    pub version: Option<u32>,
}

impl ArxivId {
    /// Never fails: unknown shapes are kept verbatim (trimmed) as the key.
    pub fn new(input: &str) -> Self {
        let input = input.trim();

        let mut stripped = input;
        for prefix in PREFIXES {
            if let Some(rest) = stripped.strip_prefix(prefix) {
                stripped = rest;
                break;
            }
        }
        let stripped = stripped.trim_end_matches(".pdf").trim_end_matches('/');

        let (id, version) = match VERSION_SUFFIX.captures(stripped) {
            Some(caps) => (
                caps[1].to_string(),
                caps[2].parse::<u32>().ok(),
            ),
            None => (stripped.to_string(), None),
        };

        Self {
            raw: input.to_string(),
            id,
            version,
        }
    }
}

/// Version-stripped key used to merge records: `2108.09112v2` → `2108.09112`.
pub fn canonical_id(input: &str) -> String {
    ArxivId::new(input).id
}
