use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One distinct paper inside a topic bucket, keyed by its version-stripped id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperRecord {
    pub canonical_id: String,
    pub publish_date: NaiveDate,
    pub update_date: NaiveDate,
    pub title: String,
    pub source_url: String,

    /// Official implementation link. Once set it is never cleared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_url: Option<String>,

    #[serde(rename = "abstract")]
    pub abstract_text: String,

    /// The abstract went through a successful translation.
    #[serde(default)]
    pub translated: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl PaperRecord {
    pub fn new(
        canonical_id: impl Into<String>,
        title: impl Into<String>,
        publish_date: NaiveDate,
        update_date: NaiveDate,
    ) -> Self {
        let canonical_id = canonical_id.into();
        Self {
            source_url: abs_url(&canonical_id),
            canonical_id,
            publish_date,
            update_date,
            title: title.into(),
            code_url: None,
            abstract_text: String::new(),
            translated: false,
            authors: Vec::new(),
            primary_category: None,
            comment: None,
        }
    }

    pub fn has_code(&self) -> bool {
        self.code_url.is_some()
    }

    pub fn first_author(&self) -> Option<&str> {
        self.authors.first().map(String::as_str)
    }

    /// Records a newly found implementation link. An already resolved link wins.
    pub fn set_code_url_if_absent(&mut self, url: Option<String>) -> bool {
        match (&self.code_url, url) {
            (None, Some(url)) => {
                self.code_url = Some(url);
                true
            }
            _ => false,
        }
    }
}

/// Abstract page for a canonical arXiv id.
pub fn abs_url(canonical_id: &str) -> String {
    format!("https://arxiv.org/abs/{canonical_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn new_record_builds_source_url() {
        let rec = PaperRecord::new("2108.09112", "Title", date("2021-08-20"), date("2021-08-21"));
        assert_eq!(rec.source_url, "https://arxiv.org/abs/2108.09112");
        assert!(!rec.has_code());
    }

    #[test]
    fn code_url_is_never_replaced() {
        let mut rec = PaperRecord::new("2108.09112", "Title", date("2021-08-20"), date("2021-08-21"));
        assert!(rec.set_code_url_if_absent(Some("https://github.com/a/b".into())));
        assert!(!rec.set_code_url_if_absent(None));
        assert!(!rec.set_code_url_if_absent(Some("https://github.com/c/d".into())));
        assert_eq!(rec.code_url.as_deref(), Some("https://github.com/a/b"));
    }

    #[test]
    fn serializes_abstract_under_short_name() {
        let mut rec = PaperRecord::new("2108.09112", "Title", date("2021-08-20"), date("2021-08-21"));
        rec.abstract_text = "Text".into();
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["abstract"], "Text");
        assert!(json.get("code_url").is_none());
    }
}
