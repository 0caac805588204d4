pub mod arxiv;

pub use arxiv::{ArxivId, canonical_id};
