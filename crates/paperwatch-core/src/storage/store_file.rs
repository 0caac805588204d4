use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::error::{CoreError, Result};
use crate::models::{PaperRecord, Store};

static MD_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]*)\]\(([^)\s]+)\)").expect("valid regex"));
static VERSION_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"v\d+$").expect("valid regex"));

/// Stored values are structured records, or rows in the older
/// pipe-delimited layout `|date|title|[id](url)|code-or-null|abstract|`.
/// Entries are decoded one by one so a bad record costs only itself.
type RawStore = BTreeMap<String, BTreeMap<String, Value>>;

/// Load a store, treating a missing, empty or malformed file as an empty store.
pub fn load_store(path: &Path) -> Store {
    if !path.exists() {
        debug!("store {} does not exist yet, starting empty", path.display());
        return Store::new();
    }
    match read_store(path) {
        Ok(store) => store,
        Err(e) => {
            warn!("unreadable store {}, starting empty: {e}", path.display());
            Store::new()
        }
    }
}

/// Strict variant of [`load_store`].
pub fn read_store(path: &Path) -> Result<Store> {
    let contents = fs::read_to_string(path)?;
    parse_store(&contents).map_err(|e| CoreError::StoreError {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

pub fn parse_store(contents: &str) -> Result<Store> {
    if contents.trim().is_empty() {
        return Ok(Store::new());
    }

    let raw: RawStore = serde_json::from_str(contents)?;
    let mut store = Store::new();
    for (topic, entries) in raw {
        let bucket = store.bucket_mut(&topic);
        for (key, entry) in entries {
            match parse_entry(&key, entry) {
                Ok(record) => {
                    bucket.insert(record);
                }
                Err(e) => error!("dropping unparseable entry for {key} in {topic}: {e}"),
            }
        }
    }
    Ok(store)
}

fn parse_entry(key: &str, entry: Value) -> Result<PaperRecord> {
    match entry {
        Value::String(row) => parse_legacy_row(key, &row),
        other => Ok(serde_json::from_value(other)?),
    }
}

/// Rewrite the whole store file through a sibling temp file.
pub fn save_store(path: &Path, store: &Store) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "store.json".to_string());
    let temp = path.with_file_name(format!(".{file_name}.tmp"));

    let mut json = serde_json::to_string_pretty(store)?;
    json.push('\n');
    fs::write(&temp, json)?;
    fs::rename(&temp, path)?;
    debug!(records = store.record_count(), "wrote store {}", path.display());
    Ok(())
}

/// Parse one legacy row. `key` is the map key the row was stored under.
pub fn parse_legacy_row(key: &str, row: &str) -> Result<PaperRecord> {
    let body = row.trim().trim_start_matches('|');
    let mut parts = body.splitn(5, '|');
    let mut next = |name: &str| {
        parts
            .next()
            .map(strip_emphasis)
            .ok_or_else(|| CoreError::LegacyRecord(format!("{key}: missing {name}")))
    };

    let date = next("date")?;
    let title = next("title")?;
    let paper = next("paper link")?;
    let code = next("code link")?;
    let abstract_text = next("abstract")?;
    let abstract_text = strip_emphasis(abstract_text.trim_end().trim_end_matches('|'));

    let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
        .map_err(|e| CoreError::LegacyRecord(format!("{key}: bad date {date:?}: {e}")))?;

    let canonical_id = VERSION_SUFFIX.replace(key.trim(), "").to_string();
    let mut record = PaperRecord::new(canonical_id, title, date, date);
    if let Some(caps) = MD_LINK.captures(&paper) {
        record.source_url = caps[2].to_string();
    }
    record.code_url = if code.eq_ignore_ascii_case("null") {
        None
    } else {
        MD_LINK.captures(&code).map(|caps| caps[2].to_string())
    };
    record.abstract_text = abstract_text;
    Ok(record)
}

fn strip_emphasis(s: &str) -> String {
    let s = s.trim();
    let s = s
        .strip_prefix("**")
        .and_then(|inner| inner.strip_suffix("**"))
        .unwrap_or(s);
    s.trim().to_string()
}
