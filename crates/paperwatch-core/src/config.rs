use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Root configuration, loaded once per run and handed to each component.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Upper bound on papers requested per topic.
    pub max_results: u32,
    /// Skip harvesting and only re-probe missing code links.
    pub update_paper_links: bool,
    pub topics: Vec<TopicConfig>,
    pub readme: ReportTarget,
    pub gitpage: ReportTarget,
    pub arxiv: ArxivConfig,
    pub code_links: CodeLinkConfig,
    pub translation: TranslationConfig,
    pub retry: RetryConfig,
    pub render: RenderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopicConfig {
    pub name: String,
    #[serde(default)]
    pub filters: Vec<String>,
    /// Verbatim arXiv query; takes precedence over `filters`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportTarget {
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    pub json_path: PathBuf,
    pub md_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArxivConfig {
    pub base_url: String,
    pub min_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeLinkConfig {
    pub base_url: String,
    /// Fall back to a GitHub repository search when the registry has no entry.
    pub search_fallback: bool,
    pub github_search_url: String,
    pub github_token_env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub api_key_env: String,
    pub base_url: String,
    pub model: String,
    pub target_language: String,
    pub temperature: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub code_link: RetrySettings,
    pub translation: RetrySettings,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_link: Option<String>,
}

// ─── Defaults ──────────────────────────────────────────────

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_results: 10,
            update_paper_links: false,
            topics: Vec::new(),
            readme: ReportTarget::readme(),
            gitpage: ReportTarget::gitpage(),
            arxiv: ArxivConfig::default(),
            code_links: CodeLinkConfig::default(),
            translation: TranslationConfig::default(),
            retry: RetryConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

impl ReportTarget {
    pub fn readme() -> Self {
        Self {
            enabled: true,
            json_path: PathBuf::from("docs/paper-list.json"),
            md_path: PathBuf::from("README.md"),
        }
    }

    pub fn gitpage() -> Self {
        Self {
            enabled: true,
            json_path: PathBuf::from("docs/paper-list-web.json"),
            md_path: PathBuf::from("docs/index.md"),
        }
    }
}

fn enabled_by_default() -> bool {
    true
}

impl Default for ArxivConfig {
    fn default() -> Self {
        Self {
            base_url: "http://export.arxiv.org/api/query".to_string(),
            min_interval_ms: 3000,
        }
    }
}

impl Default for CodeLinkConfig {
    fn default() -> Self {
        Self {
            base_url: "https://arxiv.paperswithcode.com/api/v0/papers".to_string(),
            search_fallback: false,
            github_search_url: "https://api.github.com/search/repositories".to_string(),
            github_token_env: "GITHUB_TOKEN".to_string(),
        }
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: None,
            api_key_env: "GOOGLE_API_KEY".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-1.5-pro-latest".to_string(),
            target_language: "Simplified Chinese".to_string(),
            temperature: 0.8,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            code_link: RetrySettings {
                max_attempts: 3,
                initial_backoff_ms: 1_000,
            },
            translation: RetrySettings {
                max_attempts: 3,
                initial_backoff_ms: 10_000,
            },
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            usage_link: Some("./docs/README.md#usage".to_string()),
        }
    }
}

// ─── Derived values ────────────────────────────────────────

impl TopicConfig {
    /// arXiv query for this topic: the verbatim `query`, or the filters
    /// joined with `OR`, multi-word filters quoted.
    pub fn search_query(&self) -> String {
        if let Some(query) = self.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            return query.to_string();
        }
        self.filters
            .iter()
            .map(|f| f.trim())
            .filter(|f| !f.is_empty())
            .map(|f| {
                if f.split_whitespace().count() > 1 {
                    format!("\"{f}\"")
                } else {
                    f.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" OR ")
    }
}

impl RetrySettings {
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }
}

impl ArxivConfig {
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }
}

impl TranslationConfig {
    /// API key from, in order: the explicit override, the config file, the
    /// configured environment variable.
    pub fn resolve_api_key(&self, explicit: Option<&str>) -> Option<String> {
        explicit
            .map(str::to_string)
            .or_else(|| self.api_key.clone())
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|k| !k.trim().is_empty())
    }
}

// ─── Load / Save ───────────────────────────────────────────

impl AppConfig {
    /// Config path: explicit argument, then `PAPERWATCH_CONFIG`, then
    /// `./config.toml` when present, then `~/.config/paperwatch/config.toml`.
    pub fn config_path(explicit: Option<&Path>) -> PathBuf {
        if let Some(path) = explicit {
            return path.to_path_buf();
        }
        if let Ok(path) = std::env::var("PAPERWATCH_CONFIG") {
            return PathBuf::from(path);
        }
        let local = PathBuf::from("config.toml");
        if local.exists() {
            return local;
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("paperwatch")
            .join("config.toml")
    }

    /// Load and validate config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_results == 0 {
            return Err(CoreError::ConfigError("max_results must be at least 1".into()));
        }

        let mut seen = HashSet::new();
        for topic in &self.topics {
            if topic.name.trim().is_empty() {
                return Err(CoreError::ConfigError("topic with empty name".into()));
            }
            if !seen.insert(topic.name.as_str()) {
                return Err(CoreError::ConfigError(format!("duplicate topic: {}", topic.name)));
            }
            if topic.search_query().is_empty() {
                return Err(CoreError::ConfigError(format!(
                    "topic {} has neither filters nor query",
                    topic.name
                )));
            }
        }

        for (name, target) in self.targets() {
            if target.json_path.as_os_str().is_empty() || target.md_path.as_os_str().is_empty() {
                return Err(CoreError::ConfigError(format!("{name}: json_path and md_path are required")));
            }
        }

        for (name, retry) in [("code_link", self.retry.code_link), ("translation", self.retry.translation)] {
            if retry.max_attempts == 0 {
                return Err(CoreError::ConfigError(format!(
                    "retry.{name}.max_attempts must be at least 1"
                )));
            }
        }

        if self.translation.enabled && self.translation.model.trim().is_empty() {
            return Err(CoreError::ConfigError("translation.model is empty".into()));
        }

        Ok(())
    }

    /// Enabled report targets, readme first.
    pub fn targets(&self) -> Vec<(&'static str, &ReportTarget)> {
        [("readme", &self.readme), ("gitpage", &self.gitpage)]
            .into_iter()
            .filter(|(_, target)| target.enabled)
            .collect()
    }

    pub fn topic_names(&self) -> Vec<String> {
        self.topics.iter().map(|t| t.name.clone()).collect()
    }

    /// Copy safe to print: the API key is masked.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.translation.api_key.is_some() {
            copy.translation.api_key = Some("********".to_string());
        }
        copy
    }
}
