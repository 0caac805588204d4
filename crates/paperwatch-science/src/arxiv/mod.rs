pub mod client;
pub mod harvest;
pub mod parser;
pub mod types;

pub use client::{ArxivClient, PaperSource};
pub use harvest::harvest_topic;
pub use types::{ArxivAuthor, ArxivMetadata, ArxivSearchQuery};
