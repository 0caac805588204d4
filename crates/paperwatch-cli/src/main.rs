use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use paperwatch_core::{AppConfig, RenderOptions, ReportTarget, Store, load_store, render_markdown, save_store};
use paperwatch_science::{
    ArxivClient, CodeLinkService, EnrichmentPipeline, harvest_topic, merge_harvest, repair_links,
};

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "paperwatch",
    about = "Daily arXiv paper lists with code links and translated abstracts",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file. Also read from PAPERWATCH_CONFIG.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging (RUST_LOG still wins when set).
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Harvest every topic, merge into the stores and render the reports.
    Run {
        /// Only re-probe missing code links, no harvest.
        #[arg(long)]
        update_paper_links: bool,
        /// API key for abstract translation.
        #[arg(long)]
        google_api_key: Option<String>,
    },

    /// Re-probe missing code links in every store, then render.
    Repair,

    /// Re-render the reports from the stores. No network.
    Render,

    /// Config management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

// ─── Config Actions ──────────────────────────────────────────────────────────

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective config as TOML, API key masked.
    Show,
}

// ─── Main ────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "paperwatch=debug,info" } else { "paperwatch=info,info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let config_path = AppConfig::config_path(cli.config.as_deref());
    let config = AppConfig::load_from(&config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;
    info!("config loaded from {}", config_path.display());

    match cli.command {
        Commands::Run {
            update_paper_links,
            google_api_key,
        } => {
            if update_paper_links || config.update_paper_links {
                repair(&config).await
            } else {
                harvest(&config, google_api_key.as_deref()).await
            }
        }
        Commands::Repair => repair(&config).await,
        Commands::Render => {
            let stores = load_stores(&config);
            render_all(&config, &stores, today())
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                print!("{}", toml::to_string_pretty(&config.redacted())?);
                Ok(())
            }
        },
    }
}

// ─── Flows ──────────────────────────────────────────────────────────────────

struct Target<'a> {
    name: &'static str,
    paths: &'a ReportTarget,
    store: Store,
}

async fn harvest(config: &AppConfig, api_key: Option<&str>) -> Result<()> {
    let mut stores = load_stores(config);
    if stores.is_empty() {
        warn!("no report target enabled, nothing will be written");
    }

    let arxiv = ArxivClient::with_params(&config.arxiv.base_url, config.arxiv.min_interval());
    let pipeline = EnrichmentPipeline::from_config(config, api_key);
    info!(
        "{} topics, up to {} papers each, translation {}",
        config.topics.len(),
        config.max_results,
        if pipeline.translates() { "on" } else { "off" }
    );

    for topic in &config.topics {
        let papers = match harvest_topic(&arxiv, topic, config.max_results).await {
            Ok(papers) => papers,
            Err(e) => {
                error!("{}: harvest failed, skipping topic: {e}", topic.name);
                continue;
            }
        };

        let prior = stores.first().and_then(|t| t.store.bucket(&topic.name));
        let outcome = pipeline.enrich_topic(&topic.name, &papers, prior).await;

        for target in &mut stores {
            merge_harvest(&mut target.store, &topic.name, outcome.records.clone());
        }
    }

    save_stores(&stores)?;
    render_all(config, &stores, today())
}

async fn repair(config: &AppConfig) -> Result<()> {
    let mut stores = load_stores(config);
    let resolver = CodeLinkService::from_config(config);
    let mut memo = HashMap::new();

    for target in &mut stores {
        info!("{}: repairing code links", target.name);
        repair_links(&mut target.store, &resolver, &mut memo).await;
    }

    save_stores(&stores)?;
    render_all(config, &stores, today())
}

fn render_all(config: &AppConfig, stores: &[Target<'_>], today: NaiveDate) -> Result<()> {
    for target in stores {
        let options = render_options(target.name)
            .with_usage_link(config.render.usage_link.clone())
            .with_topic_order(config.topic_names());
        let markdown = render_markdown(&target.store, &options, today);
        write_report(&target.paths.md_path, &markdown)?;
        info!(
            "{}: {} papers rendered to {}",
            target.name,
            target.store.record_count(),
            target.paths.md_path.display()
        );
    }
    Ok(())
}

// ─── Helpers ────────────────────────────────────────────────────────────────

fn load_stores(config: &AppConfig) -> Vec<Target<'_>> {
    config
        .targets()
        .into_iter()
        .map(|(name, paths)| Target {
            name,
            paths,
            store: load_store(&paths.json_path),
        })
        .collect()
}

fn save_stores(stores: &[Target<'_>]) -> Result<()> {
    for target in stores {
        save_store(&target.paths.json_path, &target.store)
            .with_context(|| format!("writing {}", target.paths.json_path.display()))?;
    }
    Ok(())
}

fn render_options(target: &str) -> RenderOptions {
    match target {
        "gitpage" => RenderOptions::web(),
        _ => RenderOptions::plain(),
    }
}

fn write_report(path: &Path, markdown: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    std::fs::write(path, markdown).with_context(|| format!("writing {}", path.display()))
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
