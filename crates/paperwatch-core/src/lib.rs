//! paperwatch core: paper records, store files, config and markdown reports.

pub mod config;
pub mod error;
pub mod models;
pub mod render;
pub mod storage;

pub use config::{AppConfig, ReportTarget, RetrySettings, TopicConfig};
pub use error::{CoreError, Result};
pub use models::*;
pub use render::{RenderOptions, RowLayout, render_markdown};
pub use storage::{load_store, save_store};
