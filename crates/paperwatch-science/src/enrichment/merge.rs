//! Folding enriched records into a persisted [`Store`].

use std::collections::HashMap;

use paperwatch_core::{PaperRecord, Store};
use tracing::{debug, info};

use crate::sources::{CodeLinkQuery, CodeLinkResolver};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeReport {
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RepairReport {
    /// Records that had no code link.
    pub probed: usize,
    pub repaired: usize,
}

/// Union `records` into `topic`'s bucket, keyed by canonical id.
///
/// The incoming record wins for everything except two fields: a stored
/// `code_url` is never replaced, and a translated abstract is never replaced
/// by an untranslated one. Nothing is ever removed.
pub fn merge_harvest(store: &mut Store, topic: &str, records: Vec<PaperRecord>) -> MergeReport {
    let bucket = store.bucket_mut(topic);
    let mut report = MergeReport::default();

    for incoming in records {
        match bucket.get(&incoming.canonical_id) {
            None => {
                report.inserted += 1;
                bucket.insert(incoming);
            }
            Some(existing) => {
                let merged = merge_record(existing, incoming);
                if &merged == existing {
                    report.unchanged += 1;
                } else {
                    debug!("{topic}: refreshed {}", merged.canonical_id);
                    report.updated += 1;
                    bucket.insert(merged);
                }
            }
        }
    }

    info!(
        "{topic}: {} new, {} updated, {} unchanged",
        report.inserted, report.updated, report.unchanged
    );
    report
}

fn merge_record(existing: &PaperRecord, mut incoming: PaperRecord) -> PaperRecord {
    incoming.code_url = existing.code_url.clone().or(incoming.code_url);
    if existing.translated && !incoming.translated {
        incoming.abstract_text = existing.abstract_text.clone();
        incoming.translated = true;
    }
    incoming
}

/// Re-probe the code link of every record that lacks one. Only `code_url`
/// is ever written.
///
/// `memo` caches answers by canonical id so several stores repaired in the
/// same run probe each paper once.
pub async fn repair_links(
    store: &mut Store,
    resolver: &dyn CodeLinkResolver,
    memo: &mut HashMap<String, Option<String>>,
) -> RepairReport {
    let mut report = RepairReport::default();

    for (topic, bucket) in store.topics_mut() {
        for record in bucket.records_mut().filter(|r| r.code_url.is_none()) {
            report.probed += 1;
            let link = match memo.get(&record.canonical_id) {
                Some(cached) => cached.clone(),
                None => {
                    let query = CodeLinkQuery::new(record.canonical_id.clone(), record.title.clone());
                    let found = resolver.resolve(&query).await;
                    memo.insert(record.canonical_id.clone(), found.clone());
                    found
                }
            };
            if record.set_code_url_if_absent(link) {
                report.repaired += 1;
                info!(
                    "{topic}: code link for {} is now {}",
                    record.canonical_id,
                    record.code_url.as_deref().unwrap_or_default()
                );
            }
        }
    }

    info!("repair: {} records probed, {} repaired", report.probed, report.repaired);
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::Mutex;

    fn record(id: &str, day: u32, code: Option<&str>) -> PaperRecord {
        let date = NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        let mut r = PaperRecord::new(id, format!("Paper {id}"), date, date);
        r.code_url = code.map(str::to_string);
        r.abstract_text = format!("abstract of {id}");
        r
    }

    struct MapResolver {
        links: HashMap<&'static str, &'static str>,
        calls: Mutex<Vec<String>>,
    }

    impl MapResolver {
        fn new(links: &[(&'static str, &'static str)]) -> Self {
            Self {
                links: links.iter().copied().collect(),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CodeLinkResolver for MapResolver {
        async fn resolve(&self, query: &CodeLinkQuery) -> Option<String> {
            self.calls.lock().unwrap().push(query.canonical_id.clone());
            self.links.get(query.canonical_id.as_str()).map(|s| s.to_string())
        }
    }

    #[test]
    fn merging_the_same_harvest_twice_is_idempotent() {
        let harvest = vec![
            record("2401.00001", 1, Some("https://github.com/a/one")),
            record("2401.00002", 2, None),
        ];
        let mut store = Store::new();
        merge_harvest(&mut store, "SLAM", harvest.clone());
        let once = store.clone();

        let report = merge_harvest(&mut store, "SLAM", harvest);
        assert_eq!(store, once);
        assert_eq!(
            serde_json::to_string_pretty(&store).unwrap(),
            serde_json::to_string_pretty(&once).unwrap()
        );
        assert_eq!(report, MergeReport { inserted: 0, updated: 0, unchanged: 2 });
    }

    #[test]
    fn stored_link_is_not_replaced_by_a_different_one() {
        let mut store = Store::new();
        merge_harvest(&mut store, "SLAM", vec![record("2401.00001", 1, Some("https://github.com/official/repo"))]);
        let report = merge_harvest(
            &mut store,
            "SLAM",
            vec![record("2401.00001", 1, Some("https://github.com/other/repo"))],
        );

        let stored = store.bucket("SLAM").unwrap().get("2401.00001").unwrap();
        assert_eq!(stored.code_url.as_deref(), Some("https://github.com/official/repo"));
        assert_eq!(report.unchanged, 1);
    }

    #[test]
    fn present_link_survives_a_harvest_without_one() {
        let mut store = Store::new();
        merge_harvest(&mut store, "SLAM", vec![record("2401.00001", 1, Some("https://github.com/a/b"))]);

        let mut refreshed = record("2401.00001", 5, None);
        refreshed.title = "Retitled".into();
        let report = merge_harvest(&mut store, "SLAM", vec![refreshed]);

        let stored = store.bucket("SLAM").unwrap().get("2401.00001").unwrap();
        assert_eq!(report.updated, 1);
        assert_eq!(stored.code_url.as_deref(), Some("https://github.com/a/b"));
        assert_eq!(stored.title, "Retitled");
        assert_eq!(stored.update_date, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
    }

    #[test]
    fn translated_abstract_is_not_downgraded() {
        let mut translated = record("2401.00001", 1, None);
        translated.abstract_text = "已翻译".into();
        translated.translated = true;
        let mut store = Store::new();
        merge_harvest(&mut store, "SLAM", vec![translated]);

        merge_harvest(&mut store, "SLAM", vec![record("2401.00001", 1, None)]);
        let stored = store.bucket("SLAM").unwrap().get("2401.00001").unwrap();
        assert_eq!(stored.abstract_text, "已翻译");
        assert!(stored.translated);
    }

    #[test]
    fn merge_never_removes_records() {
        let mut store = Store::new();
        merge_harvest(&mut store, "SLAM", vec![record("2401.00001", 1, None)]);
        merge_harvest(&mut store, "SLAM", vec![record("2401.00002", 2, None)]);
        assert_eq!(store.bucket("SLAM").unwrap().len(), 2);
    }

    #[tokio::test]
    async fn repair_fills_missing_links_only() {
        let mut store = Store::new();
        merge_harvest(
            &mut store,
            "SLAM",
            vec![
                record("2401.00001", 1, Some("https://github.com/keep/me")),
                record("2401.00002", 2, None),
                record("2401.00003", 3, None),
            ],
        );
        let before = store.clone();
        let resolver = MapResolver::new(&[
            ("2401.00001", "https://github.com/should/not/replace"),
            ("2401.00002", "https://github.com/found/now"),
        ]);

        let report = repair_links(&mut store, &resolver, &mut HashMap::new()).await;
        assert_eq!(report, RepairReport { probed: 2, repaired: 1 });
        assert_eq!(*resolver.calls.lock().unwrap(), vec!["2401.00002", "2401.00003"]);

        let bucket = store.bucket("SLAM").unwrap();
        let old = before.bucket("SLAM").unwrap();
        assert_eq!(bucket.get("2401.00001"), old.get("2401.00001"));
        assert_eq!(bucket.get("2401.00002").unwrap().code_url.as_deref(), Some("https://github.com/found/now"));
        for r in bucket.records() {
            let prev = old.get(&r.canonical_id).unwrap();
            assert_eq!(r.abstract_text, prev.abstract_text);
            assert_eq!(r.title, prev.title);
            assert_eq!(r.update_date, prev.update_date);
        }
    }

    #[tokio::test]
    async fn memo_is_shared_across_stores() {
        let resolver = MapResolver::new(&[("2401.00002", "https://github.com/x/y")]);
        let mut memo = HashMap::new();
        let mut readme = Store::new();
        let mut gitpage = Store::new();
        merge_harvest(&mut readme, "SLAM", vec![record("2401.00002", 2, None)]);
        merge_harvest(&mut gitpage, "SLAM", vec![record("2401.00002", 2, None)]);

        repair_links(&mut readme, &resolver, &mut memo).await;
        let report = repair_links(&mut gitpage, &resolver, &mut memo).await;

        assert_eq!(report.repaired, 1);
        assert_eq!(resolver.calls.lock().unwrap().len(), 1);
        assert_eq!(readme, gitpage);
    }
}
