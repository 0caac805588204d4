pub mod store_file;

pub use store_file::{load_store, parse_legacy_row, parse_store, read_store, save_store};
