pub mod paper;
pub mod store;

pub use paper::*;
pub use store::*;
