use std::collections::BTreeMap;
use std::collections::btree_map;

use serde::{Deserialize, Serialize};

use super::PaperRecord;

/// Records of one configured topic, keyed by canonical id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopicBucket {
    records: BTreeMap<String, PaperRecord>,
}

impl TopicBucket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, canonical_id: &str) -> Option<&PaperRecord> {
        self.records.get(canonical_id)
    }

    pub fn get_mut(&mut self, canonical_id: &str) -> Option<&mut PaperRecord> {
        self.records.get_mut(canonical_id)
    }

    /// Inserts or replaces the record under its own canonical id.
    pub fn insert(&mut self, record: PaperRecord) -> Option<PaperRecord> {
        self.records.insert(record.canonical_id.clone(), record)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> btree_map::Values<'_, String, PaperRecord> {
        self.records.values()
    }

    pub fn records_mut(&mut self) -> btree_map::ValuesMut<'_, String, PaperRecord> {
        self.records.values_mut()
    }

    /// Records ordered by `update_date`, newest first. Same-date records keep
    /// bucket order.
    pub fn newest_first(&self) -> Vec<&PaperRecord> {
        let mut out: Vec<&PaperRecord> = self.records.values().collect();
        out.sort_by(|a, b| b.update_date.cmp(&a.update_date));
        out
    }
}

impl FromIterator<PaperRecord> for TopicBucket {
    fn from_iter<I: IntoIterator<Item = PaperRecord>>(iter: I) -> Self {
        let mut bucket = Self::new();
        for record in iter {
            bucket.insert(record);
        }
        bucket
    }
}

/// Topic name → bucket. The unit of persistence for one report target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Store {
    topics: BTreeMap<String, TopicBucket>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bucket(&self, topic: &str) -> Option<&TopicBucket> {
        self.topics.get(topic)
    }

    /// Bucket for `topic`, created empty on first use.
    pub fn bucket_mut(&mut self, topic: &str) -> &mut TopicBucket {
        self.topics.entry(topic.to_string()).or_default()
    }

    pub fn topics(&self) -> impl Iterator<Item = (&str, &TopicBucket)> {
        self.topics.iter().map(|(name, bucket)| (name.as_str(), bucket))
    }

    pub fn topics_mut(&mut self) -> impl Iterator<Item = (&str, &mut TopicBucket)> {
        self.topics
            .iter_mut()
            .map(|(name, bucket)| (name.as_str(), bucket))
    }

    pub fn topic_names(&self) -> impl Iterator<Item = &str> {
        self.topics.keys().map(String::as_str)
    }

    /// Total record count across all topics.
    pub fn record_count(&self) -> usize {
        self.topics.values().map(TopicBucket::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.values().all(TopicBucket::is_empty)
    }
}
